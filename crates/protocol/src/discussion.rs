//! Discussion, category, and comment snapshots.
//!
//! These are plain value types: every query produces fresh instances and no
//! identity is shared between calls. Classification lives in the GitHub
//! crate, not on these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque GraphQL node identifier.
///
/// Node ids are only ever obtained from prior queries; they are never
/// constructed from other data.
pub type NodeId = String;

/// A point-in-time snapshot of a GitHub discussion.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use steward_protocol::Discussion;
///
/// let discussion = Discussion {
///     id: "D_kwDOA".to_string(),
///     number: 7,
///     url: "https://github.com/owner/repo/discussions/7".to_string(),
///     title: "How do I configure this?".to_string(),
///     body: String::new(),
///     category: "Q&A".to_string(),
///     labels: vec!["question".to_string()],
///     labelled: false,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
///     is_answered: false,
///     closed: false,
/// };
/// assert_eq!(discussion.number, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    /// Opaque node id.
    pub id: NodeId,
    /// Discussion number within the repository.
    pub number: u64,
    /// Web URL of the discussion.
    pub url: String,
    /// Discussion title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Name of the owning category.
    pub category: String,
    /// Label names at fetch time.
    pub labels: Vec<String>,
    /// Whether the governed inactivity label was present at fetch time.
    ///
    /// Derived from [`labels`](Self::labels); the remote label set stays
    /// authoritative.
    pub labelled: bool,
    /// When the discussion was created.
    pub created_at: DateTime<Utc>,
    /// Last activity on the discussion (comments, edits, label changes).
    pub updated_at: DateTime<Utc>,
    /// Whether an answer has been marked.
    pub is_answered: bool,
    /// Whether the discussion is closed.
    pub closed: bool,
}

/// A discussion category and the discussions fetched with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Opaque node id.
    pub id: NodeId,
    /// Display name, e.g. `"Q&A"`.
    pub name: String,
    /// Whether discussions in this category can be marked as answered.
    pub answerable: bool,
    /// Discussions belonging to this category, in query order.
    #[serde(default)]
    pub discussions: Vec<Discussion>,
}

/// A comment on a discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Opaque node id.
    pub id: NodeId,
    /// Login of the author; `None` for deleted accounts.
    pub author: Option<String>,
    /// Markdown body.
    pub body: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// Why a discussion is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The discussion has been resolved.
    Resolved,
    /// The discussion is no longer relevant.
    #[default]
    Outdated,
    /// The discussion duplicates another one.
    Duplicate,
}

impl CloseReason {
    /// Returns the `DiscussionCloseReason` enum value used by the GraphQL API.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_protocol::CloseReason;
    ///
    /// assert_eq!(CloseReason::Outdated.as_graphql(), "OUTDATED");
    /// ```
    #[must_use]
    pub const fn as_graphql(self) -> &'static str {
        match self {
            Self::Resolved => "RESOLVED",
            Self::Outdated => "OUTDATED",
            Self::Duplicate => "DUPLICATE",
        }
    }
}
