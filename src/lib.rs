//! Portfolio FX core crate.
//!
//! Client-side behavior of the portfolio site compiled to WebAssembly: custom
//! cursor and pointer effects, a target-shooting mini game with a persisted
//! high score, and synthesized UI sound cues. The page calls `start_site()`
//! once the DOM is ready.
//!
//! Everything outside `view` and `web` is plain Rust over injected seams
//! (`KeyValueStore`, `AudioBackend`, `rand::Rng`) and runs under host
//! `cargo test`.

use wasm_bindgen::prelude::*;

pub mod app;
pub mod config;
pub mod effects;
pub mod game;
pub mod geom;
pub mod prefs;
pub mod sound;
mod view;
mod web;

pub use app::App;
pub use config::{EffectsConfig, GameConfig, SiteConfig};
pub use geom::{Point, Viewport};
pub use prefs::{KeyValueStore, LocalStore, MemoryStore, Preferences, StoreError, Theme};
pub use sound::{AudioBackend, AudioOutput, Cue, SoundEngine};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    console_log::init_with_level(level).ok();
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_site() -> Result<(), JsValue> {
    web::start(SiteConfig::default())
}

/// Like `start_site`, with a JSON `SiteConfig` whose missing fields keep
/// their defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_site_with_config(json: &str) -> Result<(), JsValue> {
    let config: SiteConfig = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("invalid site config: {e}")))?;
    web::start(config)
}
