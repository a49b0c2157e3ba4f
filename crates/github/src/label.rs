//! Governed label provisioning over the REST API.
//!
//! Label mutations on discussions reference label ids, which only resolve if
//! the governed labels exist on the repository. [`sync_labels`] creates
//! missing labels and corrects drifted colors or descriptions, so that name
//! resolution in [`DiscussionRepository`](crate::DiscussionRepository)
//! succeeds.
//!
//! Provisioning uses the REST label endpoints through the client's octocrab
//! handle.
//!
//! # Example
//!
//! ```no_run
//! use secrecy::SecretString;
//! use steward_github::{GitHubClient, sync_labels};
//! use steward_protocol::LifecycleLabels;
//!
//! # async fn example() -> steward_github::Result<()> {
//! let client = GitHubClient::new(SecretString::from("ghp_xxx".to_string()))?;
//! let result = sync_labels(&client, "owner", "repo", &LifecycleLabels::default()).await?;
//! println!("created {}, updated {}", result.created, result.updated);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use steward_protocol::{LabelDefinition, LifecycleLabels};
use tracing::{debug, info, instrument, warn};

use crate::client::GitHubClient;
use crate::error::{Error, Result};

/// A repository label as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLabel {
    /// The label name.
    pub name: String,
    /// The hex color code (without `#`).
    pub color: String,
    /// The label description.
    #[serde(default)]
    pub description: Option<String>,
}

impl RepositoryLabel {
    /// Returns `true` if this label differs from `definition` in color or
    /// description.
    #[must_use]
    pub fn drifted_from(&self, definition: &LabelDefinition) -> bool {
        !self.color.eq_ignore_ascii_case(&definition.color)
            || self.description.as_deref() != Some(definition.description.as_str())
    }
}

impl From<octocrab::models::Label> for RepositoryLabel {
    fn from(label: octocrab::models::Label) -> Self {
        Self {
            name: label.name,
            color: label.color,
            description: label.description,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateLabelRequest<'a> {
    name: &'a str,
    color: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateLabelRequest<'a> {
    new_name: &'a str,
    color: &'a str,
    description: &'a str,
}

/// A change needed to bring one governed label in line with its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    /// The label does not exist yet.
    Create(LabelDefinition),
    /// The label exists under `current_name` but has drifted.
    Update {
        /// Name of the existing label, as stored on the repository.
        current_name: String,
        /// The desired definition.
        definition: LabelDefinition,
    },
}

/// Computes the changes needed to provision `definitions`.
///
/// Names are matched ignoring ASCII case, as GitHub does. Labels that match
/// their definition produce no change.
#[must_use]
pub fn plan_sync(existing: &[RepositoryLabel], definitions: &[LabelDefinition]) -> Vec<LabelChange> {
    let by_name: HashMap<String, &RepositoryLabel> = existing
        .iter()
        .map(|l| (l.name.to_ascii_lowercase(), l))
        .collect();

    definitions
        .iter()
        .filter_map(|definition| {
            match by_name.get(&definition.name.to_ascii_lowercase()) {
                None => Some(LabelChange::Create(definition.clone())),
                Some(label) if label.drifted_from(definition) => Some(LabelChange::Update {
                    current_name: label.name.clone(),
                    definition: definition.clone(),
                }),
                Some(_) => None,
            }
        })
        .collect()
}

impl GitHubClient {
    /// Lists every label of a repository, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if a request fails.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn list_labels(&self, owner: &str, repo: &str) -> Result<Vec<RepositoryLabel>> {
        let first = self
            .inner()
            .issues(owner, repo)
            .list_labels_for_repo()
            .per_page(100)
            .send()
            .await
            .map_err(Error::Api)?;
        let labels: Vec<RepositoryLabel> = self
            .inner()
            .all_pages(first)
            .await
            .map_err(Error::Api)?
            .into_iter()
            .map(RepositoryLabel::from)
            .collect();

        debug!(count = labels.len(), "listed labels");
        Ok(labels)
    }

    /// Creates a label on a repository.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the label already exists or the request
    /// fails.
    #[instrument(skip(self, label), fields(owner = %owner, repo = %repo, label = %label.name))]
    pub async fn create_label(
        &self,
        owner: &str,
        repo: &str,
        label: &LabelDefinition,
    ) -> Result<RepositoryLabel> {
        let url = format!("/repos/{owner}/{repo}/labels");
        let body = CreateLabelRequest {
            name: &label.name,
            color: &label.color,
            description: &label.description,
        };

        let created: RepositoryLabel = self
            .inner()
            .post(&url, Some(&body))
            .await
            .map_err(Error::Api)?;

        debug!("created label");
        Ok(created)
    }

    /// Renames and restyles the label currently called `current_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the label does not exist or the request
    /// fails.
    #[instrument(skip(self, label), fields(owner = %owner, repo = %repo, current_name = %current_name))]
    pub async fn update_label(
        &self,
        owner: &str,
        repo: &str,
        current_name: &str,
        label: &LabelDefinition,
    ) -> Result<RepositoryLabel> {
        // Governed names contain spaces and colons
        let encoded = utf8_percent_encode(current_name, NON_ALPHANUMERIC).to_string();
        let url = format!("/repos/{owner}/{repo}/labels/{encoded}");
        let body = UpdateLabelRequest {
            new_name: &label.name,
            color: &label.color,
            description: &label.description,
        };

        let updated: RepositoryLabel = self
            .inner()
            .patch(&url, Some(&body))
            .await
            .map_err(Error::Api)?;

        debug!("updated label");
        Ok(updated)
    }
}

/// Provisions the governed label set on a repository.
///
/// Not atomic: on failure, changes applied before the failing one remain.
///
/// # Errors
///
/// Returns the first REST failure.
#[instrument(skip(client, labels), fields(owner = %owner, repo = %repo))]
pub async fn sync_labels(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    labels: &LifecycleLabels,
) -> Result<SyncResult> {
    let existing = client.list_labels(owner, repo).await?;
    let plan = plan_sync(&existing, &labels.definitions());

    let mut result = SyncResult::default();
    for change in &plan {
        match change {
            LabelChange::Create(definition) => {
                client
                    .create_label(owner, repo, definition)
                    .await
                    .inspect_err(|e| warn!(label = %definition.name, error = %e, "failed to create label"))?;
                result.created += 1;
            }
            LabelChange::Update {
                current_name,
                definition,
            } => {
                client
                    .update_label(owner, repo, current_name, definition)
                    .await
                    .inspect_err(|e| warn!(label = %current_name, error = %e, "failed to update label"))?;
                result.updated += 1;
            }
        }
    }

    info!(created = result.created, updated = result.updated, "label sync complete");
    Ok(result)
}

/// Result of a label sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Number of labels created.
    pub created: usize,
    /// Number of labels updated.
    pub updated: usize,
}

impl SyncResult {
    /// Returns `true` if no changes were made.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.created == 0 && self.updated == 0
    }
}
