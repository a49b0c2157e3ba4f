//! Governed label definitions.
//!
//! Governed labels are applied only by the automation. They mark questions,
//! dormant discussions, and the status of incident discussions. Label names
//! are configurable; [`LifecycleLabels::default`] carries the standard set.
//!
//! # Example
//!
//! ```
//! use steward_protocol::{IncidentStatus, LifecycleLabels};
//!
//! let labels = LifecycleLabels::default();
//! assert_eq!(labels.inactive, "inactive");
//! assert_eq!(labels.incident.for_status(IncidentStatus::Resolved), "incident: resolved");
//!
//! // Every governed label, ready to be synced to a repository
//! assert_eq!(labels.definitions().len(), 6);
//! ```

use serde::{Deserialize, Serialize};

use crate::incident::IncidentStatus;

/// A label definition as it should exist on a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDefinition {
    /// The label name.
    pub name: String,

    /// The hex color code without the leading `#` (e.g., "0052CC").
    pub color: String,

    /// A brief description of the label's purpose.
    pub description: String,
}

impl LabelDefinition {
    /// Creates a new label definition.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_protocol::LabelDefinition;
    ///
    /// let label = LabelDefinition::new("inactive", "6B7280", "No recent activity");
    /// assert_eq!(label.color, "6B7280");
    /// ```
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: description.into(),
        }
    }
}

/// Names of the labels that track incident status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentLabels {
    /// Incident is open and under investigation.
    pub open: String,
    /// Incident has received a status update.
    pub update: String,
    /// Incident has been resolved.
    pub resolved: String,
    /// Incident is closed.
    pub closed: String,
}

impl Default for IncidentLabels {
    fn default() -> Self {
        Self {
            open: "incident: open".to_string(),
            update: "incident: update".to_string(),
            resolved: "incident: resolved".to_string(),
            closed: "incident: closed".to_string(),
        }
    }
}

impl IncidentLabels {
    /// Returns the label name for the given status.
    #[must_use]
    pub fn for_status(&self, status: IncidentStatus) -> &str {
        match status {
            IncidentStatus::Open => &self.open,
            IncidentStatus::Update => &self.update,
            IncidentStatus::Resolved => &self.resolved,
            IncidentStatus::Closed => &self.closed,
        }
    }

    /// Returns the status a single label name stands for.
    ///
    /// Label names are matched case-insensitively, as GitHub does.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_protocol::{IncidentLabels, IncidentStatus};
    ///
    /// let labels = IncidentLabels::default();
    /// assert_eq!(labels.status_of_label("Incident: Resolved"), Some(IncidentStatus::Resolved));
    /// assert_eq!(labels.status_of_label("bug"), None);
    /// ```
    #[must_use]
    pub fn status_of_label(&self, name: &str) -> Option<IncidentStatus> {
        IncidentStatus::ALL
            .iter()
            .copied()
            .find(|status| name.eq_ignore_ascii_case(self.for_status(*status)))
    }

    /// Determines the incident status from a set of label names.
    ///
    /// When several status labels are present the most advanced status wins,
    /// since transitions only move forward.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_protocol::{IncidentLabels, IncidentStatus};
    ///
    /// let labels = IncidentLabels::default();
    /// let names = vec!["bug".to_string(), "incident: update".to_string()];
    /// assert_eq!(labels.status_from_labels(&names), Some(IncidentStatus::Update));
    /// assert_eq!(labels.status_from_labels(&["bug".to_string()]), None);
    /// ```
    #[must_use]
    pub fn status_from_labels(&self, names: &[String]) -> Option<IncidentStatus> {
        names
            .iter()
            .filter_map(|name| self.status_of_label(name))
            .max()
    }
}

/// The full set of governed label names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleLabels {
    /// Marks discussions that are questions awaiting an answer.
    pub question: String,
    /// Marks discussions that went dormant and will be closed.
    pub inactive: String,
    /// Incident status labels.
    pub incident: IncidentLabels,
}

impl Default for LifecycleLabels {
    fn default() -> Self {
        Self {
            question: "question".to_string(),
            inactive: "inactive".to_string(),
            incident: IncidentLabels::default(),
        }
    }
}

impl LifecycleLabels {
    /// Returns the definitions of every governed label.
    ///
    /// Colors follow a semantic scheme:
    ///
    /// | Label | Color | Meaning |
    /// |-------|-------|---------|
    /// | question | Blue (#2563EB) | Awaiting an answer |
    /// | inactive | Gray (#6B7280) | Dormant, will close |
    /// | incident: open | Red (#DC2626) | Active incident |
    /// | incident: update | Amber (#D97706) | Investigation ongoing |
    /// | incident: resolved | Green (#16A34A) | Mitigated |
    /// | incident: closed | Gray (#6B7280) | Post-incident, closed |
    #[must_use]
    pub fn definitions(&self) -> Vec<LabelDefinition> {
        vec![
            LabelDefinition::new(
                &self.question,
                "2563EB",
                "Question awaiting an answer",
            ),
            LabelDefinition::new(
                &self.inactive,
                "6B7280",
                "No recent activity; will be closed if it stays quiet",
            ),
            LabelDefinition::new(&self.incident.open, "DC2626", "Incident is open"),
            LabelDefinition::new(
                &self.incident.update,
                "D97706",
                "Incident has a status update",
            ),
            LabelDefinition::new(&self.incident.resolved, "16A34A", "Incident is resolved"),
            LabelDefinition::new(&self.incident.closed, "6B7280", "Incident is closed"),
        ]
    }
}
