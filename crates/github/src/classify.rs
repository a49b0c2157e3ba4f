//! Lifecycle classification predicates.
//!
//! Pure functions over discussion snapshots and a reference instant. All
//! ages are measured from the last activity (`updated_at`), never from
//! creation, and are counted in whole elapsed days. Threshold comparisons are
//! inclusive: a discussion exactly `threshold` days old qualifies.

use chrono::{DateTime, Utc};
use steward_protocol::{Comment, Discussion, IncidentLabels};

/// Whole days elapsed between the last activity and `now`.
///
/// Negative when `updated_at` lies in the future (clock skew).
#[must_use]
pub fn age_in_days(discussion: &Discussion, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(discussion.updated_at).num_days()
}

/// Returns `true` if the discussion carried `label` at fetch time.
///
/// GitHub label names are case-insensitive.
#[must_use]
pub fn has_label(discussion: &Discussion, label: &str) -> bool {
    discussion
        .labels
        .iter()
        .any(|l| l.eq_ignore_ascii_case(label))
}

/// Returns `true` for incident discussions.
///
/// A discussion is an incident if it lives in the incident category or
/// carries any incident status label.
#[must_use]
pub fn is_incident(
    discussion: &Discussion,
    incident_category: &str,
    incident_labels: &IncidentLabels,
) -> bool {
    discussion.category.eq_ignore_ascii_case(incident_category)
        || incident_labels
            .status_from_labels(&discussion.labels)
            .is_some()
}

/// Returns `true` if the discussion should receive the inactivity label.
///
/// Open, unanswered, not yet labelled inactive, and last active at least
/// `threshold_days` ago. Incidents are excluded by the caller.
#[must_use]
pub fn is_dormant(discussion: &Discussion, threshold_days: u32, now: DateTime<Utc>) -> bool {
    !discussion.closed
        && !discussion.is_answered
        && !discussion.labelled
        && age_in_days(discussion, now) >= i64::from(threshold_days)
}

/// Returns `true` if a dormant discussion should now be closed.
///
/// The discussion must already carry the inactivity label and have been
/// quiet for at least `inactive_label_age_days`. Labelling posts a comment,
/// which counts as activity, so the age is measured from the labelling (or
/// from any later response).
#[must_use]
pub fn is_closable(
    discussion: &Discussion,
    inactive_label_age_days: u32,
    now: DateTime<Utc>,
) -> bool {
    !discussion.closed
        && discussion.labelled
        && age_in_days(discussion, now) >= i64::from(inactive_label_age_days)
}

/// Returns `true` for open, unanswered questions active within
/// `max_age_days`.
#[must_use]
pub fn is_recent_unanswered_question(
    discussion: &Discussion,
    question_label: &str,
    max_age_days: u32,
    now: DateTime<Utc>,
) -> bool {
    !discussion.closed
        && !discussion.is_answered
        && has_label(discussion, question_label)
        && age_in_days(discussion, now) <= i64::from(max_age_days)
}

/// Returns `true` if `login` is the automation identity.
///
/// Comparison ignores ASCII case and the `[bot]` suffix GitHub Apps carry in
/// the REST API but not in GraphQL.
#[must_use]
pub fn is_automation(login: &str, identity: &str) -> bool {
    fn normalize(login: &str) -> &str {
        login.strip_suffix("[bot]").unwrap_or(login)
    }
    normalize(login).eq_ignore_ascii_case(normalize(identity))
}

/// Returns `true` if any comment was authored by the automation identity.
#[must_use]
pub fn any_comment_by(comments: &[Comment], identity: &str) -> bool {
    comments
        .iter()
        .filter_map(|c| c.author.as_deref())
        .any(|author| is_automation(author, identity))
}
