//! Lifecycle thresholds and automation settings.
//!
//! Dormancy runs in two stages. A discussion quiet for `dormant_after_days`
//! receives the inactivity label and a comment; if it then stays quiet for a
//! further `close_after_days`, it is closed. With the defaults a discussion is
//! closed 90 days after its last activity.

use serde::{Deserialize, Serialize};
use steward_protocol::CloseReason;

use crate::error::{ConfigError, Result};

/// Default days of inactivity before a discussion is labelled inactive.
pub const DEFAULT_DORMANT_AFTER_DAYS: u32 = 60;

/// Default days after labelling before a discussion is closed.
pub const DEFAULT_CLOSE_AFTER_DAYS: u32 = 30;

/// Default window, in days, for reporting unanswered questions.
pub const DEFAULT_UNANSWERED_MAX_AGE_DAYS: u32 = 30;

/// Default bound on pages fetched by one query.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Upper bound for any day threshold (ten years).
pub const MAX_DAYS: u32 = 3650;

/// Upper bound for `max_pages`.
pub const MAX_PAGES_LIMIT: usize = 1000;

/// Default comment posted when labelling a discussion inactive.
pub const DEFAULT_INACTIVE_COMMENT: &str = "This discussion has had no activity for a while \
and has been marked inactive. It will be closed if it stays quiet. Any new comment keeps it open.";

/// Configuration for the discussion lifecycle.
///
/// # Examples
///
/// ```
/// use steward_config::LifecycleConfig;
///
/// let lifecycle = LifecycleConfig::default();
/// assert_eq!(lifecycle.dormant_after_days, 60);
/// assert_eq!(lifecycle.total_days_until_close(), 90);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Days without activity before the inactivity label is applied.
    pub dormant_after_days: u32,

    /// Days a labelled discussion must stay quiet before it is closed.
    ///
    /// Measured from the last activity, which includes the labelling
    /// comment itself.
    pub close_after_days: u32,

    /// Unanswered questions older than this are not reported.
    pub unanswered_max_age_days: u32,

    /// Reason given when closing dormant discussions.
    pub close_reason: CloseReason,

    /// Comment posted alongside the inactivity label.
    pub inactive_comment: String,

    /// Bound on pages fetched by one paginated query.
    pub max_pages: usize,

    /// Login of the automation identity, used to detect earlier
    /// acknowledgements.
    pub bot_login: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            dormant_after_days: DEFAULT_DORMANT_AFTER_DAYS,
            close_after_days: DEFAULT_CLOSE_AFTER_DAYS,
            unanswered_max_age_days: DEFAULT_UNANSWERED_MAX_AGE_DAYS,
            close_reason: CloseReason::Outdated,
            inactive_comment: DEFAULT_INACTIVE_COMMENT.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            bot_login: "github-actions".to_string(),
        }
    }
}

impl LifecycleConfig {
    /// Returns the days from last activity until a discussion is closed.
    #[must_use]
    pub fn total_days_until_close(&self) -> u32 {
        self.dormant_after_days.saturating_add(self.close_after_days)
    }

    /// Validates the lifecycle configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLifecycle`] if a threshold is zero or
    /// out of range, the page bound is out of range, or a text setting is
    /// blank.
    pub fn validate(&self) -> Result<()> {
        for (name, days) in [
            ("dormant_after_days", self.dormant_after_days),
            ("close_after_days", self.close_after_days),
            ("unanswered_max_age_days", self.unanswered_max_age_days),
        ] {
            if days == 0 || days > MAX_DAYS {
                return Err(ConfigError::InvalidLifecycle {
                    reason: format!("{name} must be between 1 and {MAX_DAYS}, got {days}"),
                });
            }
        }

        if self.max_pages == 0 || self.max_pages > MAX_PAGES_LIMIT {
            return Err(ConfigError::InvalidLifecycle {
                reason: format!(
                    "max_pages must be between 1 and {MAX_PAGES_LIMIT}, got {}",
                    self.max_pages
                ),
            });
        }

        if self.inactive_comment.trim().is_empty() {
            return Err(ConfigError::InvalidLifecycle {
                reason: "inactive_comment cannot be empty".to_string(),
            });
        }

        if self.bot_login.trim().is_empty() {
            return Err(ConfigError::InvalidLifecycle {
                reason: "bot_login cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}
