//! Incident status tracking.
//!
//! [`IncidentTracker`] drives an incident discussion through its
//! [`IncidentStatus`] lifecycle. Every transition re-reads the discussion,
//! since labels and body may have been edited by hand, and validates the move
//! before the first mutation is sent.

use steward_protocol::{CloseReason, Discussion, IncidentStatus};
use tracing::{debug, info, instrument};

use crate::client::GraphQl;
use crate::discussion::DiscussionRepository;
use crate::error::{Error, Result};

/// Drives incident discussions through their status lifecycle.
#[derive(Debug)]
pub struct IncidentTracker<'a, T> {
    repository: &'a DiscussionRepository<T>,
}

/// Records completed steps of a multi-step transition.
struct Steps {
    completed: Vec<String>,
}

impl Steps {
    fn new() -> Self {
        Self {
            completed: Vec::new(),
        }
    }

    fn record<V>(&mut self, step: String, result: Result<V>) -> Result<V> {
        match result {
            Ok(value) => {
                self.completed.push(step);
                Ok(value)
            }
            Err(source) if self.completed.is_empty() => Err(source),
            Err(source) => Err(Error::PartialMutation {
                completed: std::mem::take(&mut self.completed),
                failed: step,
                source: Box::new(source),
            }),
        }
    }
}

impl<'a, T: GraphQl> IncidentTracker<'a, T> {
    /// Creates a tracker over `repository`.
    #[must_use]
    pub fn new(repository: &'a DiscussionRepository<T>) -> Self {
        Self { repository }
    }

    /// Returns the current status of an incident discussion.
    ///
    /// Status labels take precedence over the body marker. A discussion with
    /// neither is `Open`.
    #[must_use]
    pub fn status_of(&self, discussion: &Discussion) -> IncidentStatus {
        self.repository
            .policy()
            .labels
            .incident
            .status_from_labels(&discussion.labels)
            .or_else(|| IncidentStatus::from_body(&discussion.body))
            .unwrap_or_default()
    }

    /// Re-reads the discussion and returns its current status.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn current_status(&self, discussion: &Discussion) -> Result<IncidentStatus> {
        let fresh = self.repository.discussion(&discussion.id).await?;
        Ok(self.status_of(&fresh))
    }

    /// Records a status update. Allowed from `Open` and `Update`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] before any mutation if the
    /// incident is resolved or closed, and [`Error::PartialMutation`] if a
    /// later step fails.
    pub async fn mark_update(&self, discussion: &Discussion) -> Result<IncidentStatus> {
        self.advance(discussion, IncidentStatus::Update, None).await
    }

    /// Marks the incident resolved and posts `summary`.
    ///
    /// # Errors
    ///
    /// See [`mark_update`](Self::mark_update).
    pub async fn mark_resolved(
        &self,
        discussion: &Discussion,
        summary: &str,
    ) -> Result<IncidentStatus> {
        self.advance(discussion, IncidentStatus::Resolved, Some(summary))
            .await
    }

    /// Marks the incident closed, posts `summary`, and closes the discussion.
    ///
    /// # Errors
    ///
    /// See [`mark_update`](Self::mark_update).
    pub async fn mark_closed(&self, discussion: &Discussion, summary: &str) -> Result<IncidentStatus> {
        self.advance(discussion, IncidentStatus::Closed, Some(summary))
            .await
    }

    /// Reopens the incident from any status.
    ///
    /// # Errors
    ///
    /// Returns transport errors, or [`Error::PartialMutation`] if a step
    /// after the first fails.
    #[instrument(skip(self, discussion), fields(discussion = %discussion.id))]
    pub async fn reopen(&self, discussion: &Discussion) -> Result<IncidentStatus> {
        let fresh = self.repository.discussion(&discussion.id).await?;
        let from = self.status_of(&fresh);
        let to = from.reopen();
        debug!(%from, %to, "reopening incident");

        let mut steps = Steps::new();
        self.relabel(&fresh, to, &mut steps).await?;
        self.rewrite_marker(&fresh, to, &mut steps).await?;
        let result = self.repository.reopen(&fresh).await;
        steps.record("reopen discussion".to_string(), result)?;

        info!(url = %fresh.url, %from, "reopened incident");
        Ok(to)
    }

    #[instrument(skip(self, discussion, summary), fields(discussion = %discussion.id))]
    async fn advance(
        &self,
        discussion: &Discussion,
        to: IncidentStatus,
        summary: Option<&str>,
    ) -> Result<IncidentStatus> {
        let fresh = self.repository.discussion(&discussion.id).await?;
        let from = self.status_of(&fresh);
        let to = from.transition(to)?;
        debug!(%from, %to, "advancing incident");

        let mut steps = Steps::new();
        self.relabel(&fresh, to, &mut steps).await?;
        self.rewrite_marker(&fresh, to, &mut steps).await?;

        if to.posts_summary() {
            if let Some(summary) = summary {
                let result = self.repository.post_comment(&fresh, summary).await;
                steps.record("post summary".to_string(), result)?;
            }
        }

        if to == IncidentStatus::Closed {
            let result = self.repository.close(&fresh, CloseReason::Resolved).await;
            steps.record("close discussion".to_string(), result)?;
        }

        info!(url = %fresh.url, %from, %to, "incident status changed");
        Ok(to)
    }

    /// Removes every status label other than the one for `to`, then applies
    /// the `to` label if it is missing.
    async fn relabel(
        &self,
        discussion: &Discussion,
        to: IncidentStatus,
        steps: &mut Steps,
    ) -> Result<()> {
        let labels = &self.repository.policy().labels.incident;
        let new = labels.for_status(to);

        let stale = discussion
            .labels
            .iter()
            .filter(|l| labels.status_of_label(l).is_some() && !l.eq_ignore_ascii_case(new));
        for old in stale {
            let result = self.repository.remove_label(discussion, old).await;
            steps.record(format!("remove label {old}"), result)?;
        }

        if !discussion.labels.iter().any(|l| l.eq_ignore_ascii_case(new)) {
            let result = self.repository.apply_label(discussion, new).await;
            steps.record(format!("apply label {new}"), result)?;
        }
        Ok(())
    }

    async fn rewrite_marker(
        &self,
        discussion: &Discussion,
        to: IncidentStatus,
        steps: &mut Steps,
    ) -> Result<()> {
        let body = to.apply_to_body(&discussion.body);
        if body == discussion.body {
            return Ok(());
        }
        let result = self.repository.update_body(discussion, &body).await;
        steps.record("update status marker".to_string(), result)
    }
}
