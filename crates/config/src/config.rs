//! Core configuration struct and loading logic.
//!
//! [`Config`] aggregates the repositories to manage, the lifecycle
//! thresholds, the governed label names, and authentication.

use serde::{Deserialize, Serialize};
use steward_protocol::LifecycleLabels;

use crate::error::{ConfigError, Result};
use crate::lifecycle::LifecycleConfig;
use crate::persistence::{find_config_file, read_config_file, write_config_file};
use crate::repository::Repository;

/// Default name of the category holding incident discussions.
pub const DEFAULT_INCIDENT_CATEGORY: &str = "Incidents";

fn default_incident_category() -> String {
    DEFAULT_INCIDENT_CATEGORY.to_string()
}

/// The steward configuration.
///
/// # Examples
///
/// ```
/// use steward_config::{Config, Repository};
///
/// let config = Config {
///     repositories: vec![Repository::new("rust-lang", "rust")],
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.incident_category, "Incidents");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Repositories whose discussions are managed.
    #[serde(default)]
    pub repositories: Vec<Repository>,

    /// Lifecycle thresholds and automation settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Governed label names.
    #[serde(default)]
    pub labels: LifecycleLabels,

    /// Category holding incident discussions.
    ///
    /// Discussions in this category are never labelled or closed by the
    /// dormancy policy.
    #[serde(default = "default_incident_category")]
    pub incident_category: String,

    /// Global GitHub token.
    ///
    /// Used for repositories without a token of their own. If not set, the
    /// token is taken from the `gh` CLI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            lifecycle: LifecycleConfig::default(),
            labels: LifecycleLabels::default(),
            incident_category: default_incident_category(),
            github_token: None,
        }
    }
}

impl Config {
    /// Loads configuration from the default file locations.
    ///
    /// Searches, in order:
    ///
    /// 1. Local: `./steward.json5` or `./steward.json`
    /// 2. User: `~/.config/steward/config.json5` or `~/.config/steward/config.json`
    ///
    /// Returns the default configuration if no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is found but cannot be
    /// read, parsed, or validated.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Loads and validates configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use steward_config::Config;
    ///
    /// # fn example() -> steward_config::Result<()> {
    /// let config = Config::load_from("steward.json5")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config: Config = read_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        write_config_file(path, self)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a repository entry, a lifecycle setting, or a
    /// label name is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_config::Config;
    ///
    /// let mut config = Config::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.lifecycle.dormant_after_days = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        for repo in &self.repositories {
            repo.validate()?;
        }
        self.lifecycle.validate()?;
        self.validate_labels()
    }

    fn validate_labels(&self) -> Result<()> {
        if self.incident_category.trim().is_empty() {
            return Err(ConfigError::InvalidLabels {
                reason: "incident_category cannot be empty".to_string(),
            });
        }

        let mut seen: Vec<String> = Vec::new();
        for definition in self.labels.definitions() {
            let name = definition.name.as_str();
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidLabels {
                    reason: "label names cannot be empty".to_string(),
                });
            }
            if name.chars().any(char::is_control) {
                return Err(ConfigError::InvalidLabels {
                    reason: format!("label name {name:?} contains a control character"),
                });
            }
            // GitHub label names are case-insensitive
            let key = name.to_ascii_lowercase();
            if seen.contains(&key) {
                return Err(ConfigError::InvalidLabels {
                    reason: format!("label name {name:?} is used twice"),
                });
            }
            seen.push(key);
        }
        Ok(())
    }

    /// Returns whether any repository is configured.
    #[must_use]
    pub fn has_repositories(&self) -> bool {
        !self.repositories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_protocol::CloseReason;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(!config.has_repositories());
        assert!(config.github_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn duplicate_label_names_are_rejected() {
        let mut config = Config::default();
        config.labels.inactive = "Question".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLabels { .. }));
    }

    #[test]
    fn empty_incident_category_is_rejected() {
        let config = Config {
            incident_category: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn control_characters_in_labels_are_rejected() {
        let mut config = Config::default();
        config.labels.question = "ques\ntion".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_json5_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("steward.json5");
        std::fs::write(
            &path,
            r#"
            {
                repositories: [
                    "rust-lang/rust",
                    { owner: "tokio-rs", repo: "tokio" },
                ],
                lifecycle: { dormant_after_days: 45, close_reason: "duplicate" },
                labels: { inactive: "stale" },
                incident_category: "Outages",
                github_token: "ghp_test",
            }
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[1].full_name(), "tokio-rs/tokio");
        assert_eq!(config.lifecycle.dormant_after_days, 45);
        assert_eq!(config.lifecycle.close_reason, CloseReason::Duplicate);
        assert_eq!(config.labels.inactive, "stale");
        assert_eq!(config.labels.question, "question");
        assert_eq!(config.incident_category, "Outages");
        assert_eq!(config.github_token.as_deref(), Some("ghp_test"));
    }

    #[test]
    fn load_from_rejects_invalid_lifecycle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("steward.json5");
        std::fs::write(&path, "{ lifecycle: { max_pages: 0 } }").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLifecycle { .. }));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut original = Config {
            repositories: vec![
                Repository::new("owner", "repo"),
                Repository::with_token("private", "repo", "ghp_private"),
            ],
            github_token: Some("ghp_xxx".to_string()),
            ..Default::default()
        };
        original.lifecycle.close_after_days = 14;

        original.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn github_token_not_serialized_when_none() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains("github_token"));
    }
}
