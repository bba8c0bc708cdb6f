//! Composition root. Owns one instance of every component and routes page
//! events to them; the browser layer shares it as `Rc<RefCell<App<..>>>`.

use rand::rngs::StdRng;

use crate::config::SiteConfig;
use crate::effects::AmbientEffects;
use crate::game::{EntityId, FieldReport, GameSession, TargetField};
use crate::geom::{Point, Viewport};
use crate::prefs::{KeyValueStore, Preferences, Theme};
use crate::sound::{AudioBackend, Cue, SoundEngine};

pub struct App<S: KeyValueStore, B: AudioBackend> {
    prefs: Preferences<S>,
    sounds: SoundEngine<B>,
    session: GameSession,
    field: TargetField,
    effects: AmbientEffects,
    viewport: Viewport,
    rng: StdRng,
}

impl<S: KeyValueStore, B: AudioBackend> App<S, B> {
    pub fn new(config: SiteConfig, store: S, backend: B, rng: StdRng) -> Self {
        let prefs = Preferences::load(store);
        let sounds = SoundEngine::new(backend, prefs.sound_enabled());
        let session = GameSession::new(config.game.clone(), prefs.high_score());
        Self {
            sounds,
            session,
            field: TargetField::new(config.game),
            effects: AmbientEffects::new(config.effects),
            viewport: Viewport::default(),
            prefs,
            rng,
        }
    }

    pub fn prefs(&self) -> &Preferences<S> {
        &self.prefs
    }

    pub fn sounds(&self) -> &SoundEngine<B> {
        &self.sounds
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn field(&self) -> &TargetField {
        &self.field
    }

    pub fn effects(&self) -> &AmbientEffects {
        &self.effects
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Per-frame step: fires every timer that came due since the last frame.
    pub fn frame(&mut self, now: f64, viewport: Viewport) -> FieldReport {
        self.viewport = viewport;
        self.field.set_viewport(viewport);
        let report = self.field.advance(now, &mut self.rng);
        self.session.advance(now);
        self.effects.advance(now);
        report
    }

    pub fn toggle_game(&mut self, now: f64) -> bool {
        self.session.toggle(now, &mut self.field, &mut self.sounds)
    }

    /// Pointer click on target `id`. `true` when it scored.
    pub fn shoot(&mut self, id: EntityId, at: Point, now: f64) -> bool {
        self.session.shoot(
            id,
            at,
            now,
            &mut self.field,
            &mut self.sounds,
            &mut self.prefs,
        )
    }

    pub fn pointer_moved(&mut self, at: Point, now: f64) {
        self.effects.pointer_moved(at, now, &mut self.rng);
    }

    pub fn pointer_down(&mut self) {
        self.effects.press();
        self.sounds.play(Cue::Shoot);
    }

    pub fn pointer_up(&mut self) {
        self.effects.release();
    }

    /// Returns the new state; turning sound on confirms with `toggle`.
    pub fn toggle_sound(&mut self) -> bool {
        let enabled = self.sounds.toggle_enabled(&mut self.prefs);
        if enabled {
            self.sounds.play(Cue::Toggle);
        }
        enabled
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.prefs.theme().toggled();
        self.prefs.set_theme(theme);
        self.sounds.play(Cue::Toggle);
        theme
    }

    pub fn set_accent(&mut self, color: &str) {
        self.prefs.set_accent_color(color);
        self.sounds.play(Cue::Toggle);
    }

    pub fn set_language(&mut self, language: &str) {
        self.prefs.set_language(language);
    }

    pub fn play_cue(&mut self, cue: Cue) {
        self.sounds.play(cue);
    }
}
