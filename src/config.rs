//! Tunables for the mini game and the ambient effects.
//!
//! Defaults reproduce the live site. With the `serde` feature every struct
//! deserializes with `#[serde(default)]`, so a page can override a single field.

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Mini game timings and sizes (milliseconds / CSS pixels).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// One target per period while the session is active.
    pub spawn_period_ms: f64,
    /// Edge length of a target; positions keep the whole target on screen.
    pub target_size: f64,
    pub lifespan_min_ms: f64,
    /// Exclusive upper bound.
    pub lifespan_max_ms: f64,
    /// Maximum drift per axis, in either direction.
    pub drift_px: f64,
    /// Fade-out length between natural expiry and removal.
    pub fade_grace_ms: f64,
    pub explosion_ms: f64,
    pub explosion_size: f64,
    pub hit_points: u32,
    pub banner_text: String,
    pub banner_ms: f64,
    pub score_pulse_ms: f64,
    pub score_pulse_scale: f64,
    /// Colour of the high score once the current score beats it.
    pub record_color: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawn_period_ms: 2000.0,
            target_size: 60.0,
            lifespan_min_ms: 3000.0,
            lifespan_max_ms: 5000.0,
            drift_px: 100.0,
            fade_grace_ms: 500.0,
            explosion_ms: 500.0,
            explosion_size: 40.0,
            hit_points: 100,
            banner_text: "Shoot the Target!".to_string(),
            banner_ms: 2500.0,
            score_pulse_ms: 200.0,
            score_pulse_scale: 1.5,
            record_color: "#FFA500".to_string(),
        }
    }
}

/// Pointer-driven decoration parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectsConfig {
    /// Time the cursor outline takes to reach the pointer.
    pub outline_glide_ms: f64,
    /// Minimum spacing between two trail particles.
    pub trail_throttle_ms: f64,
    pub trail_lifetime_ms: f64,
    pub trail_min_size: f64,
    pub trail_max_size: f64,
    pub trail_palette: Vec<String>,
    pub magnetic_radius: f64,
    pub magnetic_strength: f64,
    /// Parallax speed of the i-th floating element is `(i + 1) * parallax_step`.
    pub parallax_step: f64,
    /// Scale applied to the cursor dot while the pointer is pressed.
    pub pressed_dot_scale: f64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            outline_glide_ms: 500.0,
            trail_throttle_ms: 50.0,
            trail_lifetime_ms: 800.0,
            trail_min_size: 2.0,
            trail_max_size: 8.0,
            trail_palette: ["#6366f1", "#8b5cf6", "#ec4899", "#06b6d4", "#f59e0b"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            magnetic_radius: 100.0,
            magnetic_strength: 0.3,
            parallax_step: 20.0,
            pressed_dot_scale: 0.5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SiteConfig {
    pub game: GameConfig,
    pub effects: EffectsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_site() {
        let g = GameConfig::default();
        assert_eq!(g.spawn_period_ms, 2000.0);
        assert_eq!(g.hit_points, 100);
        assert!(g.lifespan_min_ms < g.lifespan_max_ms);
        let e = EffectsConfig::default();
        assert_eq!(e.trail_palette.len(), 5);
        assert!(e.trail_min_size <= e.trail_max_size);
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: SiteConfig =
            serde_json::from_str(r#"{ "game": { "spawn_period_ms": 1000.0 } }"#).unwrap();
        assert_eq!(cfg.game.spawn_period_ms, 1000.0);
        assert_eq!(cfg.game.banner_ms, 2500.0);
        assert_eq!(cfg.effects, EffectsConfig::default());
    }
}
