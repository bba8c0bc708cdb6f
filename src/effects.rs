//! Ambient pointer effects: custom cursor, parallax, magnetic buttons,
//! spotlight cards, the particle trail and the scroll-linked timeline.
//!
//! Everything here is a pure transform of pointer position, element boxes and
//! time; `view` applies the results to the DOM.

use rand::Rng;

use crate::config::EffectsConfig;
use crate::game::EntityId;
use crate::geom::{Point, Rect, Viewport};

// --- Cursor --------------------------------------------------------------------

/// Dot pinned to the pointer plus an outline gliding after it.
#[derive(Clone, Debug)]
pub struct CursorFollower {
    glide_ms: f64,
    pointer: Option<Point>,
    outline_from: Point,
    glide_start_ms: f64,
}

impl CursorFollower {
    pub fn new(glide_ms: f64) -> Self {
        Self {
            glide_ms,
            pointer: None,
            outline_from: Point::default(),
            glide_start_ms: 0.0,
        }
    }

    pub fn move_to(&mut self, pointer: Point, now: f64) {
        // A new glide starts from wherever the outline currently is.
        self.outline_from = self.outline_at(now).unwrap_or(pointer);
        self.pointer = Some(pointer);
        self.glide_start_ms = now;
    }

    pub fn dot(&self) -> Option<Point> {
        self.pointer
    }

    pub fn outline_at(&self, now: f64) -> Option<Point> {
        let to = self.pointer?;
        let t = if self.glide_ms > 0.0 {
            (now - self.glide_start_ms) / self.glide_ms
        } else {
            1.0
        };
        Some(self.outline_from.lerp(to, t))
    }
}

// --- Per-element transforms -----------------------------------------------------

/// Offset of the `index`-th floating element; deeper layers move faster.
pub fn parallax_offset(index: usize, pointer: Point, viewport: Viewport, step: f64) -> Point {
    let speed = (index + 1) as f64 * step;
    Point::new(
        (viewport.width - pointer.x * speed) / 100.0,
        (viewport.height - pointer.y * speed) / 100.0,
    )
}

/// Pull toward the pointer while it is within `radius` of the element centre.
pub fn magnetic_offset(rect: &Rect, pointer: Point, radius: f64, strength: f64) -> Point {
    let c = rect.center();
    if pointer.distance(c) < radius {
        Point::new((pointer.x - c.x) * strength, (pointer.y - c.y) * strength)
    } else {
        Point::default()
    }
}

/// Pointer position in the element's own coordinate space.
pub fn spotlight_origin(rect: &Rect, pointer: Point) -> Point {
    Point::new(pointer.x - rect.left, pointer.y - rect.top)
}

/// Timeline fill in percent, or `None` while the timeline is off screen.
pub fn timeline_progress(rect: &Rect, viewport_height: f64) -> Option<f64> {
    if !(rect.top < viewport_height && rect.bottom() > 0.0) || rect.height <= 0.0 {
        return None;
    }
    let scrolled = viewport_height - rect.top;
    let pct = scrolled / rect.height * 100.0;
    Some((pct * 0.8).clamp(0.0, 100.0))
}

// --- Trail -----------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct TrailParticle {
    pub id: EntityId,
    pub at: Point,
    pub size: f64,
    pub color: String,
    pub born_ms: f64,
    pub until_ms: f64,
}

impl TrailParticle {
    /// 0.0 at birth, 1.0 at removal.
    pub fn progress(&self, now: f64) -> f64 {
        let span = self.until_ms - self.born_ms;
        if span <= 0.0 {
            return 1.0;
        }
        ((now - self.born_ms) / span).clamp(0.0, 1.0)
    }
}

/// Throttled particle spawner.
#[derive(Clone, Debug)]
pub struct TrailEmitter {
    throttle_ms: f64,
    lifetime_ms: f64,
    min_size: f64,
    max_size: f64,
    palette: Vec<String>,
    last_emit_ms: Option<f64>,
    particles: Vec<TrailParticle>,
    next_id: EntityId,
}

impl TrailEmitter {
    pub fn new(cfg: &EffectsConfig) -> Self {
        Self {
            throttle_ms: cfg.trail_throttle_ms,
            lifetime_ms: cfg.trail_lifetime_ms,
            min_size: cfg.trail_min_size.min(cfg.trail_max_size),
            max_size: cfg.trail_max_size.max(cfg.trail_min_size),
            palette: cfg.trail_palette.clone(),
            last_emit_ms: None,
            particles: Vec::new(),
            next_id: 1,
        }
    }

    pub fn particles(&self) -> &[TrailParticle] {
        &self.particles
    }

    /// Emits at most one particle per throttle window.
    pub fn on_move(&mut self, at: Point, now: f64, rng: &mut impl Rng) -> Option<EntityId> {
        if self
            .last_emit_ms
            .is_some_and(|last| now - last < self.throttle_ms)
        {
            return None;
        }
        self.last_emit_ms = Some(now);

        let size = rng.gen_range(self.min_size..=self.max_size);
        let color = if self.palette.is_empty() {
            "#ffffff".to_string()
        } else {
            self.palette[rng.gen_range(0..self.palette.len())].clone()
        };
        let id = self.next_id;
        self.next_id += 1;
        self.particles.push(TrailParticle {
            id,
            at,
            size,
            color,
            born_ms: now,
            until_ms: now + self.lifetime_ms,
        });
        Some(id)
    }

    pub fn advance(&mut self, now: f64) {
        self.particles.retain(|p| now < p.until_ms);
    }
}

// --- Aggregate ---------------------------------------------------------------------

/// Pointer state shared by every ambient effect.
pub struct AmbientEffects {
    config: EffectsConfig,
    cursor: CursorFollower,
    trail: TrailEmitter,
    pressed: bool,
}

impl AmbientEffects {
    pub fn new(config: EffectsConfig) -> Self {
        Self {
            cursor: CursorFollower::new(config.outline_glide_ms),
            trail: TrailEmitter::new(&config),
            pressed: false,
            config,
        }
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    pub fn cursor(&self) -> &CursorFollower {
        &self.cursor
    }

    pub fn trail(&self) -> &TrailEmitter {
        &self.trail
    }

    pub fn pointer(&self) -> Option<Point> {
        self.cursor.dot()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn dot_scale(&self) -> f64 {
        if self.pressed {
            self.config.pressed_dot_scale
        } else {
            1.0
        }
    }

    pub fn pointer_moved(&mut self, at: Point, now: f64, rng: &mut impl Rng) {
        self.cursor.move_to(at, now);
        self.trail.on_move(at, now, rng);
    }

    pub fn press(&mut self) {
        self.pressed = true;
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }

    pub fn advance(&mut self, now: f64) {
        self.trail.advance(now);
    }

    pub fn parallax(&self, index: usize, viewport: Viewport) -> Option<Point> {
        let p = self.pointer()?;
        Some(parallax_offset(index, p, viewport, self.config.parallax_step))
    }

    pub fn magnetic(&self, rect: &Rect) -> Point {
        match self.pointer() {
            Some(p) => magnetic_offset(
                rect,
                p,
                self.config.magnetic_radius,
                self.config.magnetic_strength,
            ),
            None => Point::default(),
        }
    }
}
