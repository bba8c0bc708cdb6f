//! Game Session Controller: on/off state, score and the persisted high score.

use crate::config::GameConfig;
use crate::game::field::{EntityId, TargetField};
use crate::geom::Point;
use crate::prefs::{KeyValueStore, Preferences};
use crate::sound::{AudioBackend, Cue, SoundEngine};

/// Transient on-screen message.
#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub text: String,
    pub until_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreChange {
    pub score: u32,
    pub high_score: u32,
    pub new_record: bool,
}

pub struct GameSession {
    config: GameConfig,
    active: bool,
    score: u32,
    high_score: u32,
    banner: Option<Banner>,
    pulse_until: Option<f64>,
    // Set once the current page's score has beaten the stored record.
    record_broken: bool,
}

impl GameSession {
    pub fn new(config: GameConfig, high_score: u32) -> Self {
        Self {
            config,
            active: false,
            score: 0,
            high_score,
            banner: None,
            pulse_until: None,
            record_broken: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn record_broken(&self) -> bool {
        self.record_broken
    }

    /// Scale of the score readout: enlarged right after a change, 1.0 otherwise.
    pub fn score_scale(&self, now: f64) -> f64 {
        match self.pulse_until {
            Some(until) if now < until => self.config.score_pulse_scale,
            _ => 1.0,
        }
    }

    /// Flips the session. Starting restarts the spawn timer and shows the
    /// banner; stopping clears every target at once. Both play `toggle`.
    pub fn toggle<B: AudioBackend>(
        &mut self,
        now: f64,
        field: &mut TargetField,
        sounds: &mut SoundEngine<B>,
    ) -> bool {
        self.active = !self.active;
        if self.active {
            field.start(now);
            self.banner = Some(Banner {
                text: self.config.banner_text.clone(),
                until_ms: now + self.config.banner_ms,
            });
            log::info!("game session started");
        } else {
            field.stop();
            log::info!("game session stopped at score {}", self.score);
        }
        sounds.play(Cue::Toggle);
        self.active
    }

    /// Hit path for target `id`: explosion, `explosion` cue, score credit.
    /// Returns `false` when the target could not be hit any more.
    pub fn shoot<B: AudioBackend, S: KeyValueStore>(
        &mut self,
        id: EntityId,
        at: Point,
        now: f64,
        field: &mut TargetField,
        sounds: &mut SoundEngine<B>,
        prefs: &mut Preferences<S>,
    ) -> bool {
        if field.hit(id, at, now).is_none() {
            return false;
        }
        sounds.play(Cue::Explosion);
        self.add_score(self.config.hit_points, now, prefs);
        true
    }

    pub fn add_score<S: KeyValueStore>(
        &mut self,
        points: u32,
        now: f64,
        prefs: &mut Preferences<S>,
    ) -> ScoreChange {
        self.score = self.score.saturating_add(points);
        self.pulse_until = Some(now + self.config.score_pulse_ms);

        let new_record = self.score > self.high_score;
        if new_record {
            self.high_score = self.score;
            self.record_broken = true;
            prefs.set_high_score(self.high_score);
            log::info!("new high score {}", self.high_score);
        }
        ScoreChange {
            score: self.score,
            high_score: self.high_score,
            new_record,
        }
    }

    /// Dismisses the banner and ends the score pulse once their time is up.
    pub fn advance(&mut self, now: f64) {
        if self.banner.as_ref().is_some_and(|b| now >= b.until_ms) {
            self.banner = None;
        }
        if self.pulse_until.is_some_and(|until| now >= until) {
            self.pulse_until = None;
        }
    }
}
