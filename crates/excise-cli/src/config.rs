//! `excise.toml` loading and persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use excise_refactor::registry::BUILTIN_DELEGATES;
use excise_refactor::{SearchToggles, SettingsStore};

pub(crate) const CONFIG_FILES: &[&str] = &["excise.toml", ".excise.toml"];

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExciseConfig {
    /// File the config was read from, or will be written to.
    pub config_path: PathBuf,
    /// Search preferences, written back after a run.
    pub settings: SettingsStore,
    /// Delegate names in registry order.
    pub delegates: Vec<String>,
    /// Ask before deleting when non-code occurrences were found.
    pub preview_non_code: bool,
    /// Default log filter when neither `RUST_LOG` nor `-v` is given.
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write config to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    safe_delete: SafeDeleteSection,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    delegates: BTreeMap<String, SearchToggles>,
    logging: LoggingSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct SafeDeleteSection {
    search_in_comments: bool,
    search_non_source: bool,
    ask_for_accessors: bool,
    preview_non_code: bool,
    delegates: Vec<String>,
}

impl Default for SafeDeleteSection {
    fn default() -> Self {
        let toggles = SearchToggles::default();
        Self {
            search_in_comments: toggles.search_in_comments,
            search_non_source: toggles.search_non_source,
            ask_for_accessors: false,
            preview_non_code: true,
            delegates: BUILTIN_DELEGATES.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct LoggingSection {
    level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ExciseConfig {
    fn base(config_path: PathBuf) -> Self {
        Self::from_file(config_path, ConfigFile::default())
    }

    fn from_file(config_path: PathBuf, file: ConfigFile) -> Self {
        let section = file.safe_delete;
        Self {
            config_path,
            settings: SettingsStore {
                global: SearchToggles {
                    search_in_comments: section.search_in_comments,
                    search_non_source: section.search_non_source,
                },
                delegates: file.delegates,
                ask_for_accessors: section.ask_for_accessors,
            },
            delegates: section.delegates,
            preview_non_code: section.preview_non_code,
            log_level: file.logging.level,
        }
    }

    /// Reads the config in `root`, or `explicit` when given. Missing or
    /// broken files fall back to defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| find_config_file(root))
            .unwrap_or_else(|| root.join(CONFIG_FILES[0]));
        if !path.is_file() {
            return Self::base(path);
        }
        let Ok(contents) = std::fs::read_to_string(&path) else {
            warn!("Failed to read excise config at {}", path.display());
            return Self::base(path);
        };
        Self::from_contents(path, &contents)
    }

    pub fn from_contents(config_path: PathBuf, contents: &str) -> Self {
        match toml::from_str::<ConfigFile>(contents) {
            Ok(file) => Self::from_file(config_path, file),
            Err(err) => {
                warn!(
                    "Failed to parse excise config at {}: {err}",
                    config_path.display()
                );
                Self::base(config_path)
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let file = ConfigFile {
            safe_delete: SafeDeleteSection {
                search_in_comments: self.settings.global.search_in_comments,
                search_non_source: self.settings.global.search_non_source,
                ask_for_accessors: self.settings.ask_for_accessors,
                preview_non_code: self.preview_non_code,
                delegates: self.delegates.clone(),
            },
            delegates: self.settings.delegates.clone(),
            logging: LoggingSection {
                level: self.log_level.clone(),
            },
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// Writes the config back to [`Self::config_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(&self.config_path, contents).map_err(|source| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        })
    }
}

fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("excise-config-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn sections_map_onto_settings() {
        let config = ExciseConfig::from_contents(
            PathBuf::from("excise.toml"),
            r#"
[safe_delete]
search_non_source = false
ask_for_accessors = true
delegates = ["method", "field"]

[delegates.field]
search_in_comments = false

[logging]
level = "debug"
"#,
        );
        assert!(config.settings.global.search_in_comments);
        assert!(!config.settings.global.search_non_source);
        assert!(config.settings.ask_for_accessors);
        assert_eq!(config.delegates, vec!["method", "field"]);
        assert_eq!(
            config.settings.delegates.get("field"),
            Some(&SearchToggles {
                search_in_comments: false,
                search_non_source: true,
            })
        );
        assert!(config.preview_non_code);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        let config = ExciseConfig::from_contents(PathBuf::from("excise.toml"), "[safe_delete");
        assert_eq!(config, ExciseConfig::base(PathBuf::from("excise.toml")));
        assert_eq!(config.delegates, BUILTIN_DELEGATES);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn saved_config_lists_used_toggles() {
        let mut config = ExciseConfig::base(PathBuf::from("excise.toml"));
        config.settings.delegates.insert(
            "method".to_string(),
            SearchToggles {
                search_in_comments: false,
                search_non_source: true,
            },
        );
        let saved = config.to_toml().unwrap();
        assert!(saved.contains("[delegates.method]"));
        assert!(saved.contains("[logging]"));
        assert_eq!(
            ExciseConfig::from_contents(PathBuf::from("excise.toml"), &saved),
            config
        );
    }

    #[test]
    fn load_prefers_discovered_file_and_round_trips() {
        let root = temp_dir("load");
        let missing = ExciseConfig::load(&root, None);
        assert_eq!(missing.config_path, root.join("excise.toml"));

        std::fs::write(
            root.join(".excise.toml"),
            "[safe_delete]\nsearch_in_comments = false\n",
        )
        .unwrap();
        let mut config = ExciseConfig::load(&root, None);
        assert_eq!(config.config_path, root.join(".excise.toml"));
        assert!(!config.settings.global.search_in_comments);

        config.settings.ask_for_accessors = true;
        config.save().unwrap();
        let reloaded = ExciseConfig::load(&root, None);
        assert_eq!(reloaded, config);
        let _ = std::fs::remove_dir_all(&root);
    }
}
