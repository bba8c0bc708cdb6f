//! Entity Timer Loop: spawns drifting targets on a fixed period and retires
//! them on hit or natural expiry.
//!
//! All timers are deadlines on the page clock (milliseconds) and are only
//! acted upon inside [`TargetField::advance`] or [`TargetField::hit`], both
//! called from the single browser event loop.

use rand::Rng;

use crate::config::GameConfig;
use crate::geom::{Point, Viewport, ease_in_out};

pub type EntityId = u64;

// --- Spawn timer -------------------------------------------------------------

/// Repeating timer. Tick `k` (k >= 1) fires at `start_ms + k * period_ms`.
#[derive(Clone, Debug)]
pub struct SpawnClock {
    start_ms: f64,
    period_ms: f64,
    last_tick: u64, // index of the last tick handed out
}

impl SpawnClock {
    pub fn new(start_ms: f64, period_ms: f64) -> Self {
        Self {
            start_ms,
            period_ms: period_ms.max(1.0),
            last_tick: 0,
        }
    }

    /// Fire times of every tick that became due since the previous call.
    pub fn due_ticks(&mut self, now: f64) -> Vec<f64> {
        let elapsed = now - self.start_ms;
        if elapsed < self.period_ms {
            return Vec::new();
        }
        let current = (elapsed / self.period_ms).floor() as u64;
        let ticks = (self.last_tick + 1..=current)
            .map(|k| self.start_ms + k as f64 * self.period_ms)
            .collect();
        self.last_tick = self.last_tick.max(current);
        ticks
    }

    pub fn next_tick_at(&self) -> f64 {
        self.start_ms + (self.last_tick + 1) as f64 * self.period_ms
    }
}

// --- Entities ----------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetState {
    Alive,
    /// Lifespan elapsed; shrinking out until `since_ms + fade_grace_ms`.
    Fading { since_ms: f64 },
    Removed,
}

#[derive(Clone, Debug)]
pub struct Target {
    pub id: EntityId,
    /// Top-left corner at spawn time.
    pub origin: Point,
    /// Full offset reached at the end of the lifespan.
    pub drift: Point,
    pub born_ms: f64,
    pub lifespan_ms: f64,
    pub state: TargetState,
}

impl Target {
    pub fn expires_at(&self) -> f64 {
        self.born_ms + self.lifespan_ms
    }

    pub fn is_alive(&self) -> bool {
        self.state == TargetState::Alive
    }

    /// Current drift offset from `origin`.
    pub fn offset_at(&self, now: f64) -> Point {
        let t = if self.lifespan_ms > 0.0 {
            (now - self.born_ms) / self.lifespan_ms
        } else {
            1.0
        };
        let k = ease_in_out(t);
        Point::new(self.drift.x * k, self.drift.y * k)
    }

    /// 1.0 while alive, falling linearly to 0.0 across the fade.
    pub fn fade_level(&self, now: f64, grace_ms: f64) -> f64 {
        match self.state {
            TargetState::Alive => 1.0,
            TargetState::Fading { since_ms } if grace_ms > 0.0 => {
                1.0 - ((now - since_ms) / grace_ms).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

/// Burst shown where a target was hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Explosion {
    pub id: EntityId,
    /// Top-left corner; the burst is centred on the hit point.
    pub corner: Point,
    pub born_ms: f64,
    pub until_ms: f64,
}

/// What one `advance` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldReport {
    pub spawned: usize,
    pub faded: usize,
    pub removed: usize,
}

// --- Field -------------------------------------------------------------------

pub struct TargetField {
    config: GameConfig,
    viewport: Viewport,
    clock: Option<SpawnClock>,
    targets: Vec<Target>,
    explosions: Vec<Explosion>,
    next_id: EntityId,
}

impl TargetField {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            viewport: Viewport::default(),
            clock: None,
            targets: Vec::new(),
            explosions: Vec::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_some()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn target(&self, id: EntityId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Starts the repeating spawn timer, replacing any running one.
    pub fn start(&mut self, now: f64) {
        self.clock = Some(SpawnClock::new(now, self.config.spawn_period_ms));
    }

    /// Cancels the spawn timer and clears the display list without fading.
    pub fn stop(&mut self) {
        self.clock = None;
        self.targets.clear();
        self.explosions.clear();
    }

    /// Creates one target born at `now`. No-op while stopped.
    pub fn spawn_one(&mut self, now: f64, rng: &mut impl Rng) -> Option<EntityId> {
        if !self.is_running() {
            return None;
        }
        let cfg = &self.config;
        let max_x = (self.viewport.width - cfg.target_size).max(0.0);
        let max_y = (self.viewport.height - cfg.target_size).max(0.0);
        let origin = Point::new(rng.gen_range(0.0..=max_x), rng.gen_range(0.0..=max_y));
        let lifespan_ms = if cfg.lifespan_max_ms > cfg.lifespan_min_ms {
            rng.gen_range(cfg.lifespan_min_ms..cfg.lifespan_max_ms)
        } else {
            cfg.lifespan_min_ms
        };
        let d = cfg.drift_px.abs();
        let drift = Point::new(rng.gen_range(-d..=d), rng.gen_range(-d..=d));

        let id = self.alloc_id();
        self.targets.push(Target {
            id,
            origin,
            drift,
            born_ms: now,
            lifespan_ms,
            state: TargetState::Alive,
        });
        Some(id)
    }

    /// Fires every due timer: spawn ticks, expiries, fade completions and
    /// explosion lifetimes.
    pub fn advance(&mut self, now: f64, rng: &mut impl Rng) -> FieldReport {
        let mut report = FieldReport::default();

        let ticks = self
            .clock
            .as_mut()
            .map(|c| c.due_ticks(now))
            .unwrap_or_default();
        for at in ticks {
            if self.spawn_one(at, rng).is_some() {
                report.spawned += 1;
            }
        }

        let grace = self.config.fade_grace_ms;
        for t in self.targets.iter_mut() {
            if t.state == TargetState::Alive && now >= t.expires_at() {
                t.state = TargetState::Fading {
                    since_ms: t.expires_at(),
                };
                report.faded += 1;
            }
            if let TargetState::Fading { since_ms } = t.state {
                if now >= since_ms + grace {
                    t.state = TargetState::Removed;
                }
            }
        }
        let before = self.targets.len();
        self.targets.retain(|t| t.state != TargetState::Removed);
        report.removed = before - self.targets.len();

        self.explosions.retain(|e| now < e.until_ms);
        report
    }

    /// Shoots target `id` at pointer position `at`.
    ///
    /// Only an alive target can be hit; it leaves the display list at once and
    /// an explosion is spawned. Returns `None` when the target already expired,
    /// was hit before, or never existed.
    pub fn hit(&mut self, id: EntityId, at: Point, now: f64) -> Option<Explosion> {
        let idx = self.targets.iter().position(|t| t.id == id)?;
        if !self.targets[idx].is_alive() {
            return None;
        }
        self.targets[idx].state = TargetState::Removed;
        self.targets.remove(idx);

        let half = self.config.explosion_size / 2.0;
        let explosion = Explosion {
            id: self.alloc_id(),
            corner: Point::new(at.x - half, at.y - half),
            born_ms: now,
            until_ms: now + self.config.explosion_ms,
        };
        self.explosions.push(explosion);
        Some(explosion)
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
