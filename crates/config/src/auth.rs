//! GitHub token resolution.
//!
//! Tokens are looked up in this order:
//!
//! 1. Repository-specific token
//! 2. Global `github_token` from config
//! 3. `gh auth token` (GitHub CLI)
//!
//! The GraphQL API has no anonymous access, so a repository without any
//! token cannot be processed. Resolved tokens are returned as
//! [`SecretString`] and never logged.

use secrecy::SecretString;
use tokio::process::Command;

use crate::Repository;
use crate::error::{ConfigError, Result};

/// Resolves the token for `repo`.
///
/// Returns `None` when no source yields a token. A failing `gh` invocation
/// counts as no token.
///
/// # Examples
///
/// ```no_run
/// use steward_config::{Repository, auth::resolve_token};
///
/// # async fn example() {
/// let repo = Repository::new("rust-lang", "rust");
/// let token = resolve_token(&repo, Some("ghp_global")).await;
/// assert!(token.is_some());
/// # }
/// ```
pub async fn resolve_token(repo: &Repository, global_token: Option<&str>) -> Option<SecretString> {
    if let Some(token) = repo.token().or(global_token) {
        return Some(SecretString::from(token.to_string()));
    }

    get_gh_token().await.ok().flatten()
}

/// Gets a token from the `gh` CLI.
///
/// Returns `Ok(None)` if `gh` is not installed or not logged in.
///
/// # Errors
///
/// Returns [`ConfigError::GhAuthFailed`] if `gh` cannot be started, and
/// [`ConfigError::GhAuthError`] if it exits with an unexpected error.
pub async fn get_gh_token() -> Result<Option<SecretString>> {
    let output = match Command::new("gh").args(["auth", "token"]).output().await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::GhAuthFailed(e)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if stderr.contains("not logged in") || stderr.contains("no oauth token") {
            return Ok(None);
        }
        return Err(ConfigError::GhAuthError {
            code: output.status.code(),
            stderr,
        });
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!token.is_empty()).then(|| SecretString::from(token)))
}
