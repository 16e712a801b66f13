//! Persisted search preferences.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The two independent non-code search toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchToggles {
    /// Scan comments and string literals.
    pub search_in_comments: bool,
    /// Scan non-source text files.
    pub search_non_source: bool,
}

impl SearchToggles {
    /// Both toggles off.
    pub const NONE: Self = Self {
        search_in_comments: false,
        search_non_source: false,
    };

    /// Returns true if any non-code scanning is enabled.
    #[must_use]
    pub fn any(self) -> bool {
        self.search_in_comments || self.search_non_source
    }
}

impl Default for SearchToggles {
    fn default() -> Self {
        Self {
            search_in_comments: true,
            search_non_source: true,
        }
    }
}

/// Which entry of the [`SettingsStore`] a value belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    /// Used when no delegate claims the symbol.
    Global,
    /// Keyed by the claiming delegate's name.
    Delegate(SmolStr),
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Delegate(name) => f.write_str(name),
        }
    }
}

/// User preferences read before a run and written back after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsStore {
    /// Toggles used when no delegate claims the symbol.
    pub global: SearchToggles,
    /// Toggles remembered per delegate.
    pub delegates: BTreeMap<String, SearchToggles>,
    /// Whether delegates may add satellite symbols (e.g. accessors).
    pub ask_for_accessors: bool,
}

impl SettingsStore {
    /// Stored toggles for `key`. The global entry always exists.
    #[must_use]
    pub fn get(&self, key: &SettingsKey) -> Option<SearchToggles> {
        match key {
            SettingsKey::Global => Some(self.global),
            SettingsKey::Delegate(name) => self.delegates.get(name.as_str()).copied(),
        }
    }

    /// Replaces both toggles for `key`.
    pub fn store(&mut self, key: &SettingsKey, toggles: SearchToggles) {
        match key {
            SettingsKey::Global => self.global = toggles,
            SettingsKey::Delegate(name) => {
                self.delegates.insert(name.to_string(), toggles);
            }
        }
    }

    /// Comment toggle for `key`, falling back to the global entry.
    #[must_use]
    pub fn is_to_search_in_comments(&self, key: &SettingsKey) -> bool {
        self.get(key).unwrap_or(self.global).search_in_comments
    }

    /// Non-source toggle for `key`, falling back to the global entry.
    #[must_use]
    pub fn is_to_search_for_text_occurrences(&self, key: &SettingsKey) -> bool {
        self.get(key).unwrap_or(self.global).search_non_source
    }

    /// Updates the comment toggle for `key`.
    pub fn set_to_search_in_comments(&mut self, key: &SettingsKey, value: bool) {
        let mut toggles = self.get(key).unwrap_or(self.global);
        toggles.search_in_comments = value;
        self.store(key, toggles);
    }

    /// Updates the non-source toggle for `key`.
    pub fn set_to_search_for_text_occurrences(&mut self, key: &SettingsKey, value: bool) {
        let mut toggles = self.get(key).unwrap_or(self.global);
        toggles.search_non_source = value;
        self.store(key, toggles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegate_entries_fall_back_to_global() {
        let mut store = SettingsStore::default();
        let field = SettingsKey::Delegate("field".into());
        assert!(store.get(&field).is_none());
        assert!(store.is_to_search_in_comments(&field));

        store.set_to_search_in_comments(&field, false);
        assert!(!store.is_to_search_in_comments(&field));
        assert!(store.is_to_search_for_text_occurrences(&field));
        assert!(store.is_to_search_in_comments(&SettingsKey::Global));
    }

    #[test]
    fn store_round_trips_through_toml() {
        let mut store = SettingsStore {
            ask_for_accessors: true,
            ..SettingsStore::default()
        };
        store.set_to_search_for_text_occurrences(&SettingsKey::Delegate("method".into()), false);
        let text = toml::to_string_pretty(&store).unwrap();
        let parsed: SettingsStore = toml::from_str(&text).unwrap();
        assert_eq!(parsed, store);
    }
}
