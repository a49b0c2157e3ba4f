//! Repository entries.
//!
//! A repository is written either as `"owner/repo"` or as
//! `{ "owner": "...", "repo": "...", "token": "..." }` when it needs its own
//! token.
//!
//! # Examples
//!
//! ```
//! use steward_config::Repository;
//!
//! let repo: Repository = serde_json::from_str(r#""rust-lang/rust""#).unwrap();
//! assert_eq!(repo.owner(), "rust-lang");
//! assert_eq!(repo.name(), "rust");
//!
//! let repo: Repository = serde_json::from_str(r#"{"owner": "org", "repo": "site"}"#).unwrap();
//! assert_eq!(repo.full_name(), "org/site");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Serialized forms of a repository entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RepositoryEntry {
    Short(String),
    Full {
        owner: String,
        repo: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

/// A GitHub repository whose discussions are managed.
///
/// Owner and name are checked against the characters GitHub allows, so a
/// configured repository can always be embedded in a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RepositoryEntry", into = "RepositoryEntry")]
pub struct Repository {
    owner: String,
    name: String,
    token: Option<String>,
}

fn check_segment(what: &str, value: &str, input: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConfigError::InvalidRepository(format!(
            "{what} cannot be empty in '{input}'"
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ConfigError::InvalidRepository(format!(
            "{what} '{value}' contains invalid character {c:?}"
        )));
    }
    Ok(())
}

impl Repository {
    /// Creates a repository entry without a token.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            token: None,
        }
    }

    /// Creates a repository entry with its own token.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_config::Repository;
    ///
    /// let repo = Repository::with_token("org", "repo", "ghp_xxx");
    /// assert_eq!(repo.token(), Some("ghp_xxx"));
    /// ```
    #[must_use]
    pub fn with_token(
        owner: impl Into<String>,
        name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            token: Some(token.into()),
        }
    }

    /// Parses the short `"owner/repo"` form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRepository`] unless the input is exactly
    /// two non-empty segments of letters, digits, `-`, `_`, or `.`.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_config::Repository;
    ///
    /// assert!(Repository::parse_short("rust-lang/rust").is_ok());
    /// assert!(Repository::parse_short("invalid").is_err());
    /// assert!(Repository::parse_short("too/many/slashes").is_err());
    /// assert!(Repository::parse_short("owner/has space").is_err());
    /// ```
    pub fn parse_short(s: &str) -> Result<Self> {
        let Some((owner, name)) = s.split_once('/') else {
            return Err(ConfigError::InvalidRepository(format!(
                "expected 'owner/repo' format, got '{s}'"
            )));
        };
        if name.contains('/') {
            return Err(ConfigError::InvalidRepository(format!(
                "expected 'owner/repo' format, got '{s}'"
            )));
        }

        let repo = Self::new(owner.trim(), name.trim());
        repo.validate()?;
        Ok(repo)
    }

    /// Checks owner and name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRepository`] for empty segments or
    /// disallowed characters.
    pub fn validate(&self) -> Result<()> {
        let input = self.full_name();
        check_segment("owner", &self.owner, &input)?;
        check_segment("repository name", &self.name, &input)
    }

    /// Returns the repository owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the repository-specific token, if configured.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the repository in `"owner/repo"` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl TryFrom<RepositoryEntry> for Repository {
    type Error = ConfigError;

    fn try_from(entry: RepositoryEntry) -> Result<Self> {
        match entry {
            RepositoryEntry::Short(s) => Self::parse_short(&s),
            RepositoryEntry::Full { owner, repo, token } => {
                let repo = Self {
                    owner,
                    name: repo,
                    token,
                };
                repo.validate()?;
                Ok(repo)
            }
        }
    }
}

impl From<Repository> for RepositoryEntry {
    fn from(repo: Repository) -> Self {
        match repo.token {
            None => Self::Short(repo.full_name()),
            Some(token) => Self::Full {
                owner: repo.owner,
                repo: repo.name,
                token: Some(token),
            },
        }
    }
}
