//! Preference Store: persisted site settings.
//!
//! Values live in the origin's `localStorage` under `portfolio-*` keys. A
//! missing or malformed value falls back to its default; a failed write is
//! logged and otherwise ignored.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const SOUND_KEY: &str = "portfolio-sound";
pub const THEME_KEY: &str = "portfolio-theme";
pub const ACCENT_KEY: &str = "portfolio-accent";
pub const LANG_KEY: &str = "portfolio-lang";
pub const HIGH_SCORE_KEY: &str = "portfolio-highscore";

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("key-value storage is not available")]
    Unavailable,
    #[error("storage rejected write: {0}")]
    Rejected(String),
}

/// String key-value persistence scoped to the site.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for hosts without `localStorage` (and for tests).
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage`; degrades to an empty, read-only store when the
/// browser denies access (private mode, sandboxed iframes).
pub struct LocalStore {
    storage: Option<web_sys::Storage>,
}

impl LocalStore {
    pub fn from_window() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok()).flatten();
        if storage.is_none() {
            log::debug!("localStorage unavailable; preferences will not persist");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::Rejected(format!("{e:?}")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(()),
        }
    }
}

/// Typed view over the store. Every setter writes through immediately.
pub struct Preferences<S: KeyValueStore> {
    store: S,
    sound_enabled: bool,
    theme: Theme,
    accent_color: Option<String>,
    language: String,
    high_score: u32,
}

impl<S: KeyValueStore> Preferences<S> {
    /// Reads every preference once; the store is only written afterwards.
    pub fn load(store: S) -> Self {
        let sound_enabled = store.get(SOUND_KEY).as_deref() == Some("true");
        let theme = store
            .get(THEME_KEY)
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();
        let accent_color = store.get(ACCENT_KEY).filter(|c| !c.is_empty());
        let language = store
            .get(LANG_KEY)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let high_score = store
            .get(HIGH_SCORE_KEY)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        Self {
            store,
            sound_enabled,
            theme,
            accent_color,
            language,
            high_score,
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn accent_color(&self) -> Option<&str> {
        self.accent_color.as_deref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        self.write(SOUND_KEY, if enabled { "true" } else { "false" });
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.write(THEME_KEY, theme.as_str());
    }

    pub fn set_accent_color(&mut self, color: &str) {
        self.accent_color = Some(color.to_string());
        self.write(ACCENT_KEY, color);
    }

    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
        self.write(LANG_KEY, language);
    }

    pub fn set_high_score(&mut self, score: u32) {
        self.high_score = score;
        self.write(HIGH_SCORE_KEY, &score.to_string());
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            log::warn!("could not persist {key}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[test]
    fn empty_store_yields_defaults() {
        let p = Preferences::load(MemoryStore::new());
        assert!(!p.sound_enabled());
        assert_eq!(p.theme(), Theme::Dark);
        assert_eq!(p.accent_color(), None);
        assert_eq!(p.language(), "en");
        assert_eq!(p.high_score(), 0);
    }

    #[test]
    fn saved_values_are_read_back() {
        let store = MemoryStore::with_entries([
            (SOUND_KEY, "true"),
            (THEME_KEY, "light"),
            (ACCENT_KEY, "#ec4899"),
            (LANG_KEY, "ar"),
            (HIGH_SCORE_KEY, "700"),
        ]);
        let p = Preferences::load(store);
        assert!(p.sound_enabled());
        assert_eq!(p.theme(), Theme::Light);
        assert_eq!(p.accent_color(), Some("#ec4899"));
        assert_eq!(p.language(), "ar");
        assert_eq!(p.high_score(), 700);
    }

    #[test]
    fn malformed_values_fall_back() {
        let store = MemoryStore::with_entries([
            (SOUND_KEY, "yes"),
            (THEME_KEY, "sepia"),
            (HIGH_SCORE_KEY, "lots"),
        ]);
        let p = Preferences::load(store);
        assert!(!p.sound_enabled());
        assert_eq!(p.theme(), Theme::Dark);
        assert_eq!(p.high_score(), 0);
    }

    #[test]
    fn setters_write_through() {
        let mut p = Preferences::load(MemoryStore::new());
        p.set_sound_enabled(true);
        p.set_theme(Theme::Light);
        p.set_high_score(300);
        assert_eq!(p.store().get(SOUND_KEY).as_deref(), Some("true"));
        assert_eq!(p.store().get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(p.store().get(HIGH_SCORE_KEY).as_deref(), Some("300"));
    }

    #[test]
    fn failed_write_keeps_in_memory_value() {
        let mut p = Preferences::load(ReadOnlyStore);
        p.set_high_score(42);
        assert_eq!(p.high_score(), 42);
    }

    #[test]
    fn theme_toggles_between_two_values() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().to_string(), "dark");
    }
}
