//! Sound Cue Engine.
//!
//! Every cue is a short synthesized one-shot: one or more oscillator tones
//! with exponential pitch and gain ramps, optionally layered with a
//! low-passed noise burst. The cue table is data; the audio graph itself is
//! built by an [`AudioOutput`] (Web Audio in the browser, recorders in tests).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::prefs::{KeyValueStore, Preferences};

pub mod web_audio;

pub use web_audio::{WebAudioBackend, WebAudioOutput};

/// Exponential ramps are undefined at zero, so gains fade to this instead.
pub const RAMP_FLOOR: f32 = 0.01;

const SUCCESS_NOTES: [f32; 4] = [523.25, 659.25, 783.99, 1046.50]; // C5 E5 G5 C6
const SUCCESS_STAGGER: f64 = 0.1;
const SUCCESS_NOTE_LEN: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Hover,
    Click,
    Shoot,
    Explosion,
    Toggle,
    Success,
}

impl Cue {
    pub const ALL: [Cue; 6] = [
        Cue::Hover,
        Cue::Click,
        Cue::Shoot,
        Cue::Explosion,
        Cue::Toggle,
        Cue::Success,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Cue::Hover => "hover",
            Cue::Click => "click",
            Cue::Shoot => "shoot",
            Cue::Explosion => "explosion",
            Cue::Toggle => "toggle",
            Cue::Success => "success",
        }
    }

    /// Synthesis parameters for this cue.
    pub fn spec(self) -> CueSpec {
        match self {
            Cue::Hover => CueSpec::single(Tone::sweep(Waveform::Sine, 800.0, 1000.0, 0.05, 0.1)),
            Cue::Click => CueSpec::single(Tone::sweep(Waveform::Square, 150.0, 50.0, 0.1, 0.1)),
            Cue::Shoot => {
                CueSpec::single(Tone::sweep(Waveform::Sawtooth, 1200.0, 200.0, 0.1, 0.2))
            }
            Cue::Explosion => CueSpec {
                tones: vec![Tone::sweep(Waveform::Sine, 100.0, 10.0, 0.2, 0.4)],
                noise: Some(NoiseBurst {
                    cutoff_start: 400.0,
                    cutoff_end: 50.0,
                    gain_start: 0.2,
                    gain_end: RAMP_FLOOR,
                    duration: 0.4,
                }),
            },
            Cue::Toggle => CueSpec::single(Tone::sweep(Waveform::Sine, 400.0, 600.0, 0.1, 0.1)),
            Cue::Success => CueSpec {
                tones: SUCCESS_NOTES
                    .iter()
                    .enumerate()
                    .map(|(i, &freq)| Tone {
                        offset: i as f64 * SUCCESS_STAGGER,
                        ..Tone::sweep(Waveform::Sine, freq, freq, 0.1, SUCCESS_NOTE_LEN)
                    })
                    .collect(),
                noise: None,
            },
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown sound cue '{0}'")]
pub struct UnknownCue(pub String);

impl FromStr for Cue {
    type Err = UnknownCue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cue::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownCue(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// One oscillator voice. Times are seconds relative to the cue start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub waveform: Waveform,
    pub freq_start: f32,
    /// Equal to `freq_start` for a steady pitch.
    pub freq_end: f32,
    pub gain_start: f32,
    pub gain_end: f32,
    pub offset: f64,
    pub duration: f64,
}

impl Tone {
    fn sweep(waveform: Waveform, freq_start: f32, freq_end: f32, gain: f32, duration: f64) -> Self {
        Self {
            waveform,
            freq_start,
            freq_end,
            gain_start: gain,
            gain_end: RAMP_FLOOR,
            offset: 0.0,
            duration,
        }
    }

    pub fn glides(&self) -> bool {
        self.freq_start != self.freq_end
    }
}

/// White noise through a low-pass filter whose cutoff sweeps down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseBurst {
    pub cutoff_start: f32,
    pub cutoff_end: f32,
    pub gain_start: f32,
    pub gain_end: f32,
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CueSpec {
    pub tones: Vec<Tone>,
    pub noise: Option<NoiseBurst>,
}

impl CueSpec {
    fn single(tone: Tone) -> Self {
        Self {
            tones: vec![tone],
            noise: None,
        }
    }

    /// Seconds from the cue start until the last voice stops.
    pub fn total_duration(&self) -> f64 {
        let tones = self
            .tones
            .iter()
            .map(|t| t.offset + t.duration)
            .fold(0.0, f64::max);
        let noise = self.noise.map(|n| n.duration).unwrap_or(0.0);
        tones.max(noise)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("could not create {node} node: {reason}")]
    NodeCreation { node: &'static str, reason: String },
    #[error("could not schedule {what}: {reason}")]
    Schedule { what: &'static str, reason: String },
}

/// An open audio context able to play scheduled voices.
pub trait AudioOutput {
    fn is_suspended(&self) -> bool;
    fn resume(&self);
    /// Audio clock, in seconds.
    fn current_time(&self) -> f64;
    /// Plays `tone` starting at `at + tone.offset` on the audio clock.
    fn play_tone(&self, tone: &Tone, at: f64) -> Result<(), AudioError>;
    fn play_noise(&self, burst: &NoiseBurst, at: f64) -> Result<(), AudioError>;
}

/// Constructs audio contexts on demand.
pub trait AudioBackend {
    type Output: AudioOutput;

    /// `None` when the host has no audio capability.
    fn open(&mut self) -> Option<Self::Output>;
}

/// Plays cues when enabled; silently does nothing otherwise.
pub struct SoundEngine<B: AudioBackend> {
    backend: B,
    output: Option<B::Output>,
    enabled: bool,
}

impl<B: AudioBackend> SoundEngine<B> {
    /// The context is opened right away only when sound starts enabled.
    pub fn new(backend: B, enabled: bool) -> Self {
        let mut engine = Self {
            backend,
            output: None,
            enabled,
        };
        if enabled {
            engine.ensure_output();
        }
        engine
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_ready(&self) -> bool {
        self.output.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Flips the enabled flag, persists it and opens the context on first enable.
    pub fn toggle_enabled<S: KeyValueStore>(&mut self, prefs: &mut Preferences<S>) -> bool {
        self.enabled = !self.enabled;
        prefs.set_sound_enabled(self.enabled);
        if self.enabled {
            self.ensure_output();
        }
        self.enabled
    }

    pub fn play(&mut self, cue: Cue) {
        if !self.enabled {
            return;
        }
        let Some(output) = self.output.as_ref() else {
            return;
        };
        if output.is_suspended() {
            output.resume();
        }
        let spec = cue.spec();
        let now = output.current_time();
        for tone in &spec.tones {
            if let Err(e) = output.play_tone(tone, now) {
                log::debug!("{cue} tone dropped: {e}");
            }
        }
        if let Some(burst) = &spec.noise {
            if let Err(e) = output.play_noise(burst, now) {
                log::debug!("{cue} noise dropped: {e}");
            }
        }
    }

    fn ensure_output(&mut self) {
        if self.output.is_some() {
            return;
        }
        self.output = self.backend.open();
        match self.output {
            Some(_) => log::info!("audio context opened"),
            None => log::debug!("no audio capability; cues stay silent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{MemoryStore, SOUND_KEY};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        opens: Cell<u32>,
        resumes: Cell<u32>,
        tones: RefCell<Vec<(Tone, f64)>>,
        noises: RefCell<Vec<NoiseBurst>>,
    }

    struct StubOutput {
        log: Rc<Log>,
        suspended: bool,
    }

    impl AudioOutput for StubOutput {
        fn is_suspended(&self) -> bool {
            self.suspended
        }
        fn resume(&self) {
            self.log.resumes.set(self.log.resumes.get() + 1);
        }
        fn current_time(&self) -> f64 {
            2.0
        }
        fn play_tone(&self, tone: &Tone, at: f64) -> Result<(), AudioError> {
            self.log.tones.borrow_mut().push((*tone, at));
            Ok(())
        }
        fn play_noise(&self, burst: &NoiseBurst, _at: f64) -> Result<(), AudioError> {
            self.log.noises.borrow_mut().push(*burst);
            Ok(())
        }
    }

    struct StubBackend {
        log: Rc<Log>,
        available: bool,
        suspended: bool,
    }

    impl StubBackend {
        fn new() -> (Self, Rc<Log>) {
            let log = Rc::new(Log::default());
            let backend = Self {
                log: log.clone(),
                available: true,
                suspended: false,
            };
            (backend, log)
        }
    }

    impl AudioBackend for StubBackend {
        type Output = StubOutput;
        fn open(&mut self) -> Option<StubOutput> {
            self.log.opens.set(self.log.opens.get() + 1);
            self.available.then(|| StubOutput {
                log: self.log.clone(),
                suspended: self.suspended,
            })
        }
    }

    #[test]
    fn play_while_disabled_builds_nothing() {
        let (backend, log) = StubBackend::new();
        let mut engine = SoundEngine::new(backend, false);
        engine.play(Cue::Click);
        assert_eq!(log.opens.get(), 0);
        assert!(log.tones.borrow().is_empty());
    }

    #[test]
    fn first_enable_opens_context_exactly_once() {
        let (backend, log) = StubBackend::new();
        let mut engine = SoundEngine::new(backend, false);
        let mut prefs = Preferences::load(MemoryStore::new());
        assert!(engine.toggle_enabled(&mut prefs));
        assert_eq!(log.opens.get(), 1);
        assert!(!engine.toggle_enabled(&mut prefs));
        assert!(engine.toggle_enabled(&mut prefs));
        assert_eq!(log.opens.get(), 1);
        assert_eq!(prefs.store().get(SOUND_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn enabled_at_startup_opens_immediately() {
        let (backend, log) = StubBackend::new();
        let engine = SoundEngine::new(backend, true);
        assert!(engine.is_ready());
        assert_eq!(log.opens.get(), 1);
    }

    #[test]
    fn missing_audio_capability_is_silent() {
        let (mut backend, log) = StubBackend::new();
        backend.available = false;
        let mut engine = SoundEngine::new(backend, true);
        engine.play(Cue::Explosion);
        assert!(engine.is_enabled());
        assert!(!engine.is_ready());
        assert!(log.tones.borrow().is_empty());
    }

    #[test]
    fn suspended_context_is_resumed_before_playing() {
        let (mut backend, log) = StubBackend::new();
        backend.suspended = true;
        let mut engine = SoundEngine::new(backend, true);
        engine.play(Cue::Hover);
        assert_eq!(log.resumes.get(), 1);
        assert_eq!(log.tones.borrow().len(), 1);
    }

    #[test]
    fn explosion_layers_noise_over_tone() {
        let (backend, log) = StubBackend::new();
        let mut engine = SoundEngine::new(backend, true);
        engine.play(Cue::Explosion);
        let tones = log.tones.borrow();
        assert_eq!(tones.len(), 1);
        assert_eq!(tones[0].0.freq_start, 100.0);
        assert_eq!(tones[0].0.freq_end, 10.0);
        assert_eq!(tones[0].1, 2.0);
        let noises = log.noises.borrow();
        assert_eq!(noises.len(), 1);
        assert_eq!((noises[0].cutoff_start, noises[0].cutoff_end), (400.0, 50.0));
        assert_eq!(noises[0].duration, 0.4);
    }

    #[test]
    fn success_is_four_staggered_notes() {
        let spec = Cue::Success.spec();
        assert_eq!(spec.tones.len(), 4);
        let offsets: Vec<f64> = spec.tones.iter().map(|t| t.offset).collect();
        for (i, off) in offsets.iter().enumerate() {
            assert!((off - i as f64 * 0.1).abs() < 1e-9);
        }
        assert!(spec.tones.iter().all(|t| !t.glides()));
        assert!((spec.total_duration() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn cue_table_matches_reference() {
        let expect = [
            (Cue::Hover, Waveform::Sine, 800.0, 1000.0, 0.1),
            (Cue::Click, Waveform::Square, 150.0, 50.0, 0.1),
            (Cue::Shoot, Waveform::Sawtooth, 1200.0, 200.0, 0.2),
            (Cue::Explosion, Waveform::Sine, 100.0, 10.0, 0.4),
            (Cue::Toggle, Waveform::Sine, 400.0, 600.0, 0.1),
        ];
        for (cue, wave, f0, f1, dur) in expect {
            let t = cue.spec().tones[0];
            assert_eq!(t.waveform, wave, "{cue}");
            assert_eq!((t.freq_start, t.freq_end), (f0, f1), "{cue}");
            assert_eq!(t.duration, dur, "{cue}");
        }
    }

    #[test]
    fn ramps_never_target_zero() {
        for cue in Cue::ALL {
            let spec = cue.spec();
            for t in &spec.tones {
                assert!(t.gain_end > 0.0 && t.freq_end > 0.0, "{cue}");
            }
            if let Some(n) = spec.noise {
                assert!(n.gain_end > 0.0 && n.cutoff_end > 0.0);
            }
        }
    }

    #[test]
    fn cue_names_parse() {
        assert_eq!("hover".parse::<Cue>(), Ok(Cue::Hover));
        assert_eq!("explosion".parse::<Cue>(), Ok(Cue::Explosion));
        assert!("boom".parse::<Cue>().is_err());
    }
}
