//! Theme preference - session-scoped light/dark mode

use serde::{Deserialize, Serialize};

/// Fixed key the preference is persisted under (cookie name)
pub const STORAGE_KEY: &str = "mdxdocs-theme";

/// The display mode for the whole UI tree.
///
/// Defaults to dark; there is deliberately no system-preference detection.
/// Toggling is the only transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
}

impl ThemePreference {
    /// Flip between light and dark
    pub fn toggle(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    /// The persisted string form
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    /// Parse a persisted value; anything unrecognized is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            _ => None,
        }
    }
}

/// Persistence seam for the preference.
///
/// Injected rather than hardwired so the serving layer can back it with a
/// cookie while tests use [`MemoryStore`].
pub trait PreferenceStore {
    fn load(&self) -> Option<ThemePreference>;
    fn save(&mut self, pref: ThemePreference);
}

/// In-memory store, used in tests and as the trivial adapter
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Option<ThemePreference>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(pref: ThemePreference) -> Self {
        Self { value: Some(pref) }
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Option<ThemePreference> {
        self.value
    }

    fn save(&mut self, pref: ThemePreference) {
        self.value = Some(pref);
    }
}

/// The theme context injected at the root of the page tree.
///
/// Reads fall back to the dark default when nothing is stored; the toggle
/// persists its result through the store.
pub struct ThemeContext<S: PreferenceStore> {
    store: S,
}

impl<S: PreferenceStore> ThemeContext<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The current preference, defaulting to dark on a fresh session
    pub fn current(&self) -> ThemePreference {
        self.store.load().unwrap_or_default()
    }

    /// Flip the preference and persist the new value
    pub fn toggle(&mut self) -> ThemePreference {
        let next = self.current().toggle();
        self.store.save(next);
        next
    }

    /// Consume the context, returning the backing store
    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_dark() {
        let ctx = ThemeContext::new(MemoryStore::new());
        assert_eq!(ctx.current(), ThemePreference::Dark);
    }

    #[test]
    fn test_toggle_is_involution() {
        for start in [ThemePreference::Light, ThemePreference::Dark] {
            assert_eq!(start.toggle().toggle(), start);
        }
    }

    #[test]
    fn test_toggle_persists_through_store() {
        let mut ctx = ThemeContext::new(MemoryStore::new());

        assert_eq!(ctx.toggle(), ThemePreference::Light);
        assert_eq!(ctx.into_store().load(), Some(ThemePreference::Light));
    }

    #[test]
    fn test_toggle_twice_restores_original() {
        let mut ctx = ThemeContext::new(MemoryStore::with_value(ThemePreference::Dark));
        ctx.toggle();
        ctx.toggle();
        assert_eq!(ctx.current(), ThemePreference::Dark);
    }

    #[test]
    fn test_persisted_string_form() {
        assert_eq!(ThemePreference::Light.as_str(), "light");
        assert_eq!(ThemePreference::Dark.as_str(), "dark");
        assert_eq!(ThemePreference::parse("light"), Some(ThemePreference::Light));
        assert_eq!(ThemePreference::parse("dark"), Some(ThemePreference::Dark));
        assert_eq!(ThemePreference::parse("solarized"), None);
    }

    #[test]
    fn test_storage_key_is_fixed() {
        assert_eq!(STORAGE_KEY, "mdxdocs-theme");
    }
}
