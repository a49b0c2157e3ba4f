//! Incident status lifecycle.
//!
//! An incident discussion moves `Open → Update* → Resolved → Closed`. Moves
//! are forward-only; [`IncidentStatus::reopen`] is the single way back and
//! always lands on `Open`.
//!
//! Besides its status label, an incident carries a status marker in its body
//! so that the status survives a label being removed by hand.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

const MARKER_PREFIX: &str = "<!-- steward:incident-status=";
const MARKER_SUFFIX: &str = " -->";

/// The status of an incident discussion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    /// Incident is open.
    #[default]
    Open,
    /// Incident has received at least one status update.
    Update,
    /// Incident has been resolved.
    Resolved,
    /// Incident is closed.
    Closed,
}

impl IncidentStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Open, Self::Update, Self::Resolved, Self::Closed];

    /// Returns the lowercase name used in labels and body markers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Update => "update",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Validates a forward transition to `to`.
    ///
    /// `Update → Update` is allowed so that an incident can receive any
    /// number of updates. Every other self-transition, any backward move, and
    /// any move out of `Closed` is rejected. Use [`reopen`](Self::reopen) to
    /// go back to `Open`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidTransition`] if the move is not allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_protocol::IncidentStatus;
    ///
    /// assert_eq!(
    ///     IncidentStatus::Open.transition(IncidentStatus::Update).unwrap(),
    ///     IncidentStatus::Update
    /// );
    /// assert!(IncidentStatus::Closed.transition(IncidentStatus::Update).is_err());
    /// assert!(IncidentStatus::Resolved.transition(IncidentStatus::Update).is_err());
    /// ```
    pub fn transition(self, to: Self) -> Result<Self> {
        let allowed = match (self, to) {
            (Self::Closed, _) => false,
            (Self::Update, Self::Update) => true,
            (from, to) => to > from,
        };

        if allowed {
            Ok(to)
        } else {
            Err(ProtocolError::InvalidTransition { from: self, to })
        }
    }

    /// Reopens the incident. Legal from every status.
    #[must_use]
    pub const fn reopen(self) -> Self {
        Self::Open
    }

    /// Returns `true` if entering this status posts a summary comment.
    #[must_use]
    pub const fn posts_summary(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Reads the status marker from a discussion body.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_protocol::IncidentStatus;
    ///
    /// let body = "<!-- steward:incident-status=resolved -->\nDatabase outage";
    /// assert_eq!(IncidentStatus::from_body(body), Some(IncidentStatus::Resolved));
    /// assert_eq!(IncidentStatus::from_body("no marker"), None);
    /// ```
    #[must_use]
    pub fn from_body(body: &str) -> Option<Self> {
        body.lines().find_map(|line| {
            line.trim()
                .strip_prefix(MARKER_PREFIX)?
                .strip_suffix(MARKER_SUFFIX)?
                .parse()
                .ok()
        })
    }

    /// Returns `body` with its status marker set to this status.
    ///
    /// An existing marker line is replaced in place, leaving the rest of the
    /// body byte for byte as it was; otherwise the marker is prepended as the
    /// first line.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_protocol::IncidentStatus;
    ///
    /// let body = IncidentStatus::Update.apply_to_body("API latency");
    /// assert_eq!(IncidentStatus::from_body(&body), Some(IncidentStatus::Update));
    /// assert!(body.ends_with("API latency"));
    /// ```
    #[must_use]
    pub fn apply_to_body(self, body: &str) -> String {
        let marker = format!("{MARKER_PREFIX}{self}{MARKER_SUFFIX}");

        let mut offset = 0;
        for line in body.split_inclusive('\n') {
            let content = line.trim_end_matches(['\r', '\n']);
            if content.trim().starts_with(MARKER_PREFIX) {
                let end = offset + content.len();
                return format!("{}{marker}{}", &body[..offset], &body[end..]);
            }
            offset += line.len();
        }

        if body.is_empty() {
            marker
        } else if body.contains("\r\n") {
            format!("{marker}\r\n{body}")
        } else {
            format!("{marker}\n{body}")
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "update" => Ok(Self::Update),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(ProtocolError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn forward_transitions_are_allowed() {
        use IncidentStatus::*;
        let allowed = [
            (Open, Update),
            (Open, Resolved),
            (Open, Closed),
            (Update, Update),
            (Update, Resolved),
            (Update, Closed),
            (Resolved, Closed),
        ];
        for (from, to) in allowed {
            assert_eq!(from.transition(to).unwrap(), to, "{from} -> {to}");
        }
    }

    #[test]
    fn closed_rejects_everything_but_reopen() {
        use IncidentStatus::*;
        for to in IncidentStatus::ALL {
            let err = Closed.transition(to).unwrap_err();
            assert!(matches!(
                err,
                ProtocolError::InvalidTransition { from: Closed, .. }
            ));
        }
        assert_eq!(Closed.reopen(), Open);
    }

    #[test]
    fn backward_and_repeated_transitions_are_rejected() {
        use IncidentStatus::*;
        assert!(Resolved.transition(Update).is_err());
        assert!(Resolved.transition(Resolved).is_err());
        assert!(Update.transition(Open).is_err());
        assert!(Open.transition(Open).is_err());
    }

    #[test]
    fn summary_only_for_resolved_and_closed() {
        assert!(!IncidentStatus::Open.posts_summary());
        assert!(!IncidentStatus::Update.posts_summary());
        assert!(IncidentStatus::Resolved.posts_summary());
        assert!(IncidentStatus::Closed.posts_summary());
    }

    #[test]
    fn apply_to_body_replaces_existing_marker() {
        let body = "Intro\n<!-- steward:incident-status=open -->\nDetails";
        let updated = IncidentStatus::Resolved.apply_to_body(body);
        assert_eq!(
            updated,
            "Intro\n<!-- steward:incident-status=resolved -->\nDetails"
        );
    }

    #[test]
    fn apply_to_body_keeps_line_endings() {
        let body = "Intro\r\n<!-- steward:incident-status=open -->\r\nDetails\r\n";
        let updated = IncidentStatus::Update.apply_to_body(body);
        assert_eq!(
            updated,
            "Intro\r\n<!-- steward:incident-status=update -->\r\nDetails\r\n"
        );

        let body = "<!-- steward:incident-status=update -->\nDetails\n\n";
        let updated = IncidentStatus::Resolved.apply_to_body(body);
        assert_eq!(updated, "<!-- steward:incident-status=resolved -->\nDetails\n\n");
    }

    #[test]
    fn apply_to_body_prepends_with_matching_line_ending() {
        let updated = IncidentStatus::Open.apply_to_body("Outage\r\nDetails\r\n");
        assert_eq!(
            updated,
            "<!-- steward:incident-status=open -->\r\nOutage\r\nDetails\r\n"
        );
    }

    #[test]
    fn apply_to_empty_body() {
        let updated = IncidentStatus::Closed.apply_to_body("");
        assert_eq!(updated, "<!-- steward:incident-status=closed -->");
    }

    #[test]
    fn unknown_marker_is_ignored() {
        let body = "<!-- steward:incident-status=exploded -->";
        assert_eq!(IncidentStatus::from_body(body), None);
    }

    proptest! {
        #[test]
        fn transitions_never_regress(from_idx in 0usize..4, to_idx in 0usize..4) {
            let from = IncidentStatus::ALL[from_idx];
            let to = IncidentStatus::ALL[to_idx];
            if let Ok(next) = from.transition(to) {
                prop_assert!(next >= from);
                prop_assert_ne!(from, IncidentStatus::Closed);
            }
        }

        #[test]
        fn marker_roundtrips_through_any_body(body in "[a-zA-Z0-9 \n]{0,80}", idx in 0usize..4) {
            let status = IncidentStatus::ALL[idx];
            let updated = status.apply_to_body(&body);
            prop_assert_eq!(IncidentStatus::from_body(&updated), Some(status));
        }
    }
}
