//! Web Audio adapter: oscillator -> gain -> destination, plus
//! noise buffer -> low-pass biquad -> gain -> destination for bursts.

use rand::Rng;
use wasm_bindgen::JsValue;
use web_sys::{
    AudioContext, AudioContextState, AudioParam, BiquadFilterType, GainNode,
    OscillatorType,
};

use super::{AudioBackend, AudioError, AudioOutput, NoiseBurst, Tone, Waveform};

/// Opens a fresh `AudioContext` on demand.
#[derive(Default)]
pub struct WebAudioBackend;

impl AudioBackend for WebAudioBackend {
    type Output = WebAudioOutput;

    fn open(&mut self) -> Option<WebAudioOutput> {
        match AudioContext::new() {
            Ok(ctx) => Some(WebAudioOutput { ctx }),
            Err(e) => {
                log::debug!("AudioContext unavailable: {e:?}");
                None
            }
        }
    }
}

pub struct WebAudioOutput {
    ctx: AudioContext,
}

fn node_err(node: &'static str) -> impl Fn(JsValue) -> AudioError {
    move |e| AudioError::NodeCreation {
        node,
        reason: format!("{e:?}"),
    }
}

fn sched_err(what: &'static str) -> impl Fn(JsValue) -> AudioError {
    move |e| AudioError::Schedule {
        what,
        reason: format!("{e:?}"),
    }
}

/// Sets `from` at `start`, then ramps exponentially to `to` by `end`.
fn ramp(param: &AudioParam, from: f32, to: f32, start: f64, end: f64) -> Result<(), JsValue> {
    param.set_value_at_time(from, start)?;
    if from != to {
        param.exponential_ramp_to_value_at_time(to, end)?;
    }
    Ok(())
}

impl WebAudioOutput {
    fn gain_to_destination(&self) -> Result<GainNode, AudioError> {
        let gain = self.ctx.create_gain().map_err(node_err("gain"))?;
        gain.connect_with_audio_node(&self.ctx.destination())
            .map_err(sched_err("gain routing"))?;
        Ok(gain)
    }
}

impl AudioOutput for WebAudioOutput {
    fn is_suspended(&self) -> bool {
        self.ctx.state() == AudioContextState::Suspended
    }

    fn resume(&self) {
        if let Err(e) = self.ctx.resume() {
            log::debug!("AudioContext resume failed: {e:?}");
        }
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn play_tone(&self, tone: &Tone, at: f64) -> Result<(), AudioError> {
        let osc = self.ctx.create_oscillator().map_err(node_err("oscillator"))?;
        let gain = self.gain_to_destination()?;
        let start = at + tone.offset;
        let end = start + tone.duration;

        osc.set_type(match tone.waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
        });
        ramp(&osc.frequency(), tone.freq_start, tone.freq_end, start, end)
            .map_err(sched_err("frequency ramp"))?;
        ramp(&gain.gain(), tone.gain_start, tone.gain_end, start, end)
            .map_err(sched_err("gain ramp"))?;

        osc.connect_with_audio_node(&gain)
            .map_err(sched_err("oscillator routing"))?;
        osc.start_with_when(start).map_err(sched_err("oscillator start"))?;
        osc.stop_with_when(end).map_err(sched_err("oscillator stop"))?;
        Ok(())
    }

    fn play_noise(&self, burst: &NoiseBurst, at: f64) -> Result<(), AudioError> {
        let sample_rate = self.ctx.sample_rate();
        let frames = ((sample_rate as f64 * burst.duration) as u32).max(1);
        let buffer = self
            .ctx
            .create_buffer(1, frames, sample_rate)
            .map_err(node_err("buffer"))?;
        let mut rng = rand::thread_rng();
        let mut samples: Vec<f32> = (0..frames).map(|_| rng.gen_range(-1.0..1.0)).collect();
        buffer
            .copy_to_channel(&mut samples, 0)
            .map_err(sched_err("noise samples"))?;

        let source = self
            .ctx
            .create_buffer_source()
            .map_err(node_err("buffer source"))?;
        source.set_buffer(Some(&buffer));

        let filter = self
            .ctx
            .create_biquad_filter()
            .map_err(node_err("biquad filter"))?;
        filter.set_type(BiquadFilterType::Lowpass);
        let end = at + burst.duration;
        ramp(&filter.frequency(), burst.cutoff_start, burst.cutoff_end, at, end)
            .map_err(sched_err("cutoff ramp"))?;

        let gain = self.gain_to_destination()?;
        ramp(&gain.gain(), burst.gain_start, burst.gain_end, at, end)
            .map_err(sched_err("noise gain ramp"))?;

        source
            .connect_with_audio_node(&filter)
            .map_err(sched_err("noise routing"))?;
        filter
            .connect_with_audio_node(&gain)
            .map_err(sched_err("filter routing"))?;
        source.start_with_when(at).map_err(sched_err("noise start"))?;
        source.stop_with_when(end).map_err(sched_err("noise stop"))?;
        Ok(())
    }
}
