// Integration tests (native) for the `portfolio-fx` crate.
// They drive the composition root with an in-memory store and a recording
// audio backend, so no browser API is touched.

use std::cell::RefCell;
use std::rc::Rc;

use portfolio_fx::prefs::{HIGH_SCORE_KEY, SOUND_KEY, THEME_KEY};
use portfolio_fx::sound::{AudioError, NoiseBurst, Tone};
use portfolio_fx::{
    App, AudioBackend, AudioOutput, KeyValueStore, MemoryStore, Point, SiteConfig, Theme,
    Viewport,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Default)]
struct Recording {
    opens: u32,
    tones: Vec<f32>,
    noises: u32,
}

type Shared = Rc<RefCell<Recording>>;

struct RecordingOutput(Shared);

impl AudioOutput for RecordingOutput {
    fn is_suspended(&self) -> bool {
        false
    }
    fn resume(&self) {}
    fn current_time(&self) -> f64 {
        0.0
    }
    fn play_tone(&self, tone: &Tone, _at: f64) -> Result<(), AudioError> {
        self.0.borrow_mut().tones.push(tone.freq_start);
        Ok(())
    }
    fn play_noise(&self, _burst: &NoiseBurst, _at: f64) -> Result<(), AudioError> {
        self.0.borrow_mut().noises += 1;
        Ok(())
    }
}

struct RecordingBackend(Shared);

impl AudioBackend for RecordingBackend {
    type Output = RecordingOutput;
    fn open(&mut self) -> Option<RecordingOutput> {
        self.0.borrow_mut().opens += 1;
        Some(RecordingOutput(self.0.clone()))
    }
}

const VIEW: Viewport = Viewport {
    width: 1024.0,
    height: 768.0,
};

fn app_with(store: MemoryStore) -> (App<MemoryStore, RecordingBackend>, Shared) {
    let rec = Shared::default();
    let app = App::new(
        SiteConfig::default(),
        store,
        RecordingBackend(rec.clone()),
        StdRng::seed_from_u64(2024),
    );
    (app, rec)
}

#[test]
fn hitting_a_target_scores_and_persists_record() {
    let (mut app, _) = app_with(MemoryStore::with_entries([(HIGH_SCORE_KEY, "50")]));
    app.frame(0.0, VIEW);
    assert!(app.toggle_game(0.0));

    app.frame(2_000.0, VIEW);
    let target = app.field().targets()[0].clone();
    let at = Point::new(target.origin.x + 30.0, target.origin.y + 30.0);
    assert!(app.shoot(target.id, at, 2_100.0));
    assert!(!app.shoot(target.id, at, 2_101.0));

    assert_eq!(app.session().score(), 100);
    assert_eq!(app.session().high_score(), 100);
    assert_eq!(app.prefs().store().get(HIGH_SCORE_KEY).as_deref(), Some("100"));
    assert!(app.field().targets().is_empty());
    assert_eq!(app.field().explosions().len(), 1);
}

#[test]
fn unhit_targets_expire_without_scoring() {
    let (mut app, _) = app_with(MemoryStore::new());
    app.toggle_game(0.0);
    app.frame(2_000.0, VIEW);
    let id = app.field().targets()[0].id;
    // Lifespan < 5000 ms plus a 500 ms fade.
    let mut t = 2_000.0;
    while app.field().target(id).is_some() {
        t += 100.0;
        app.frame(t, VIEW);
        assert!(t <= 7_600.0, "target outlived lifespan + fade");
    }
    assert_eq!(app.session().score(), 0);
}

#[test]
fn toggling_off_and_on_restarts_a_single_spawn_stream() {
    let (mut app, _) = app_with(MemoryStore::new());
    app.toggle_game(0.0);
    app.frame(4_000.0, VIEW);
    assert_eq!(app.field().targets().len(), 2);

    assert!(!app.toggle_game(4_100.0));
    assert!(app.field().targets().is_empty());
    app.frame(6_500.0, VIEW);
    assert!(app.field().targets().is_empty());

    assert!(app.toggle_game(6_500.0));
    app.frame(8_499.0, VIEW);
    assert!(app.field().targets().is_empty());
    app.frame(8_500.0, VIEW);
    assert_eq!(app.field().targets().len(), 1);
    app.frame(10_499.0, VIEW);
    assert_eq!(app.field().targets().len(), 1);
}

#[test]
fn targets_spawn_inside_current_viewport() {
    let (mut app, _) = app_with(MemoryStore::new());
    let small = Viewport { width: 320.0, height: 480.0 };
    app.toggle_game(0.0);
    for k in 1..=40 {
        app.frame(k as f64 * 2_000.0, small);
    }
    for t in app.field().targets() {
        assert!(t.origin.x <= 320.0 - 60.0 && t.origin.y <= 480.0 - 60.0);
    }
}

#[test]
fn sound_stays_silent_until_enabled() {
    let (mut app, rec) = app_with(MemoryStore::new());
    app.pointer_down();
    app.play_cue(portfolio_fx::Cue::Click);
    assert_eq!(rec.borrow().opens, 0);

    assert!(app.toggle_sound());
    assert_eq!(rec.borrow().opens, 1);
    assert_eq!(rec.borrow().tones, vec![400.0]);
    assert_eq!(app.prefs().store().get(SOUND_KEY).as_deref(), Some("true"));

    app.pointer_down();
    assert!(app.effects().is_pressed());
    app.pointer_up();
    assert_eq!(rec.borrow().tones, vec![400.0, 1200.0]);
}

#[test]
fn explosion_cue_plays_on_hit_when_enabled() {
    let (mut app, rec) = app_with(MemoryStore::with_entries([(SOUND_KEY, "true")]));
    assert_eq!(rec.borrow().opens, 1);
    app.toggle_game(0.0);
    app.frame(2_000.0, VIEW);
    let id = app.field().targets()[0].id;
    app.shoot(id, Point::new(1.0, 1.0), 2_001.0);
    let rec = rec.borrow();
    assert_eq!(rec.tones, vec![400.0, 100.0]);
    assert_eq!(rec.noises, 1);
}

#[test]
fn theme_and_accent_persist() {
    let (mut app, _) = app_with(MemoryStore::new());
    assert_eq!(app.toggle_theme(), Theme::Light);
    app.set_accent("#06b6d4");
    app.set_language("fr");
    let store = app.prefs().store();
    assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
    assert_eq!(app.prefs().accent_color(), Some("#06b6d4"));
    assert_eq!(app.prefs().language(), "fr");
}

#[test]
fn trail_particles_follow_pointer_and_fade() {
    let (mut app, _) = app_with(MemoryStore::new());
    for i in 0..10 {
        app.pointer_moved(Point::new(i as f64, 0.0), i as f64 * 10.0);
    }
    // 0..90 ms of movement at a 50 ms throttle.
    assert_eq!(app.effects().trail().particles().len(), 2);
    app.frame(900.0, VIEW);
    assert!(app.effects().trail().particles().is_empty());
}
