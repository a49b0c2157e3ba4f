//! GraphQL documents and search query construction.
//!
//! Discussion filters (repository, category, label, dates) are expressed in
//! GitHub's search syntax. Values are embedded as quoted terms, so quotes and
//! backslashes inside a value must be escaped before concatenation.
//! [`SearchQuery`] performs that escaping as a declared step and rejects
//! values that cannot be represented, before any network call is made.
//!
//! # Example
//!
//! ```
//! use steward_github::SearchQuery;
//!
//! # fn example() -> steward_github::Result<()> {
//! let query = SearchQuery::discussions_in("owner", "repo")?
//!     .open()
//!     .category(r#"Projects and "Issues""#)?
//!     .build();
//! assert_eq!(
//!     query,
//!     r#"repo:owner/repo is:open category:"Projects and \"Issues\"""#
//! );
//! # Ok(())
//! # }
//! ```

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Fields selected for every discussion.
macro_rules! discussion_fields {
    () => {
        r#"
        id
        number
        url
        title
        body
        createdAt
        updatedAt
        isAnswered
        closed
        category { name }
        labels(first: 50) { nodes { name } }
        "#
    };
}

/// Searches discussions. Paginated at `/search`.
pub const SEARCH_DISCUSSIONS: &str = concat!(
    r#"
query SearchDiscussions($query: String!, $cursor: String) {
  search(query: $query, type: DISCUSSION, first: 50, after: $cursor) {
    pageInfo { hasNextPage endCursor }
    nodes {
      ... on Discussion {"#,
    discussion_fields!(),
    r#"
      }
    }
  }
}
"#
);

/// Reads one discussion by node id. Result at `/node`.
pub const DISCUSSION_BY_ID: &str = concat!(
    r#"
query DiscussionById($id: ID!) {
  node(id: $id) {
    ... on Discussion {"#,
    discussion_fields!(),
    r#"
    }
  }
}
"#
);

/// Lists discussion categories. Paginated at `/repository/discussionCategories`.
pub const DISCUSSION_CATEGORIES: &str = r#"
query DiscussionCategories($owner: String!, $name: String!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    discussionCategories(first: 100, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes { id name isAnswerable }
    }
  }
}
"#;

/// Lists the comments of a discussion. Paginated at `/node/comments`.
pub const DISCUSSION_COMMENTS: &str = r#"
query DiscussionComments($id: ID!, $cursor: String) {
  node(id: $id) {
    ... on Discussion {
      comments(first: 100, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          body
          createdAt
          author { login }
        }
      }
    }
  }
}
"#;

/// Resolves a label name to its node id. Result at `/repository/label`.
pub const LABEL_BY_NAME: &str = r#"
query LabelByName($owner: String!, $name: String!, $label: String!) {
  repository(owner: $owner, name: $name) {
    label(name: $label) { id name }
  }
}
"#;

/// Adds labels to a labelable node.
pub const ADD_LABELS: &str = r#"
mutation AddLabels($id: ID!, $labelIds: [ID!]!) {
  addLabelsToLabelable(input: { labelableId: $id, labelIds: $labelIds }) {
    clientMutationId
  }
}
"#;

/// Removes labels from a labelable node.
pub const REMOVE_LABELS: &str = r#"
mutation RemoveLabels($id: ID!, $labelIds: [ID!]!) {
  removeLabelsFromLabelable(input: { labelableId: $id, labelIds: $labelIds }) {
    clientMutationId
  }
}
"#;

/// Adds a comment to a discussion. Result at `/addDiscussionComment/comment`.
pub const ADD_COMMENT: &str = r#"
mutation AddDiscussionComment($id: ID!, $body: String!) {
  addDiscussionComment(input: { discussionId: $id, body: $body }) {
    comment { id body createdAt author { login } }
  }
}
"#;

/// Closes a discussion.
pub const CLOSE_DISCUSSION: &str = r#"
mutation CloseDiscussion($id: ID!, $reason: DiscussionCloseReason!) {
  closeDiscussion(input: { discussionId: $id, reason: $reason }) {
    discussion { id closed }
  }
}
"#;

/// Reopens a discussion.
pub const REOPEN_DISCUSSION: &str = r#"
mutation ReopenDiscussion($id: ID!) {
  reopenDiscussion(input: { discussionId: $id }) {
    discussion { id closed }
  }
}
"#;

/// Replaces the body of a discussion.
pub const UPDATE_DISCUSSION_BODY: &str = r#"
mutation UpdateDiscussionBody($id: ID!, $body: String!) {
  updateDiscussion(input: { discussionId: $id, body: $body }) {
    discussion { id }
  }
}
"#;

/// Quotes a value for use in a search term.
///
/// Backslashes and double quotes are backslash-escaped. Empty values and
/// values containing control characters (newlines, tabs, ...) cannot be
/// represented in a search term and are rejected.
///
/// # Errors
///
/// Returns [`Error::QueryConstruction`] for empty values or values with
/// control characters.
///
/// # Examples
///
/// ```
/// use steward_github::query::quote;
///
/// assert_eq!(quote("Q&A").unwrap(), r#""Q&A""#);
/// assert_eq!(quote(r#"say "hi""#).unwrap(), r#""say \"hi\"""#);
/// assert!(quote("two\nlines").is_err());
/// ```
pub fn quote(value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::QueryConstruction {
            reason: "filter value is empty".to_string(),
        });
    }
    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(Error::QueryConstruction {
            reason: format!("filter value {value:?} contains control character {c:?}"),
        });
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Ok(quoted)
}

/// Returns `true` if `name` is a plausible owner or repository name.
fn is_repo_segment(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// A GitHub discussion search query.
///
/// Terms are appended in call order and joined with spaces by
/// [`build`](Self::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// Starts a query scoped to one repository.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] if `owner` or `repo` contains
    /// characters GitHub does not allow in repository names.
    pub fn discussions_in(owner: &str, repo: &str) -> Result<Self> {
        if !is_repo_segment(owner) || !is_repo_segment(repo) {
            return Err(Error::QueryConstruction {
                reason: format!("invalid repository {owner:?}/{repo:?}"),
            });
        }
        Ok(Self {
            terms: vec![format!("repo:{owner}/{repo}")],
        })
    }

    /// Only open discussions.
    #[must_use]
    pub fn open(mut self) -> Self {
        self.terms.push("is:open".to_string());
        self
    }

    /// Only discussions without an accepted answer.
    #[must_use]
    pub fn unanswered(mut self) -> Self {
        self.terms.push("is:unanswered".to_string());
        self
    }

    /// Only discussions in the named category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] if the name cannot be quoted.
    pub fn category(mut self, name: &str) -> Result<Self> {
        self.terms.push(format!("category:{}", quote(name)?));
        Ok(self)
    }

    /// Excludes discussions in the named category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] if the name cannot be quoted.
    pub fn not_category(mut self, name: &str) -> Result<Self> {
        self.terms.push(format!("-category:{}", quote(name)?));
        Ok(self)
    }

    /// Only discussions carrying the named label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] if the name cannot be quoted.
    pub fn label(mut self, name: &str) -> Result<Self> {
        self.terms.push(format!("label:{}", quote(name)?));
        Ok(self)
    }

    /// Excludes discussions carrying the named label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] if the name cannot be quoted.
    pub fn not_label(mut self, name: &str) -> Result<Self> {
        self.terms.push(format!("-label:{}", quote(name)?));
        Ok(self)
    }

    /// Only discussions last updated on or before `date`.
    #[must_use]
    pub fn updated_on_or_before(mut self, date: NaiveDate) -> Self {
        self.terms.push(format!("updated:<={}", date.format("%Y-%m-%d")));
        self
    }

    /// Only discussions last updated on or after `date`.
    #[must_use]
    pub fn updated_on_or_after(mut self, date: NaiveDate) -> Self {
        self.terms.push(format!("updated:>={}", date.format("%Y-%m-%d")));
        self
    }

    /// Returns the search string.
    #[must_use]
    pub fn build(&self) -> String {
        self.terms.join(" ")
    }
}
