//! One lifecycle pass over a repository's discussions.
//!
//! A pass reports recent unanswered questions, labels dormant discussions
//! inactive, and closes discussions that stayed inactive through the grace
//! period. Scheduling passes is left to the caller.

use std::collections::HashSet;

use steward_protocol::CloseReason;
use tracing::{debug, info, instrument};

use crate::client::GraphQl;
use crate::discussion::{DiscussionRepository, MutationOutcome};
use crate::error::Result;

/// Thresholds and texts for a lifecycle pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSettings {
    /// Oldest last activity, in days, of a reported unanswered question.
    pub unanswered_max_age_days: u32,
    /// Days without activity before a discussion is labelled inactive.
    pub dormant_after_days: u32,
    /// Days an inactive discussion stays quiet before it is closed.
    pub close_after_days: u32,
    /// Reason given when closing.
    pub close_reason: CloseReason,
    /// Comment posted along with the inactivity label.
    pub inactive_comment: String,
}

/// Counts of what one pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Unanswered questions reported.
    pub unanswered: usize,
    /// Discussions labelled inactive.
    pub marked_inactive: usize,
    /// Discussions closed.
    pub closed: usize,
}

impl<T: GraphQl> DiscussionRepository<T> {
    /// Runs one lifecycle pass.
    ///
    /// Every dormant discussion receives the inactivity comment with its
    /// label, even when the automation commented on it in an earlier round:
    /// the comment is the activity [`closable`](Self::closable) measures the
    /// grace period from. Discussions labelled during this pass are never
    /// closed by it, even if the search index still reports their previous
    /// activity.
    ///
    /// # Errors
    ///
    /// Stops at the first failing operation and returns its error.
    #[instrument(skip_all, fields(repo = %self.full_name()))]
    pub async fn run_pass(&self, settings: &PassSettings) -> Result<PassSummary> {
        let mut summary = PassSummary::default();

        let questions = self
            .all_unanswered_questions(settings.unanswered_max_age_days)
            .await?;
        for question in &questions {
            info!(category = %question.category, url = %question.url, title = %question.title, "unanswered question");
        }
        summary.unanswered = questions.len();

        let mut marked = HashSet::new();
        for discussion in self.dormant_candidates(settings.dormant_after_days).await? {
            self.mark_inactive(&discussion, &settings.inactive_comment)
                .await?;
            marked.insert(discussion.id);
            summary.marked_inactive += 1;
        }

        for discussion in self.closable(settings.close_after_days).await? {
            if marked.contains(&discussion.id) {
                debug!(url = %discussion.url, "labelled during this pass, not closing");
                continue;
            }
            if self.close(&discussion, settings.close_reason).await? == MutationOutcome::Applied {
                summary.closed += 1;
            }
        }

        Ok(summary)
    }
}
