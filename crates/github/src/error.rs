//! Error types for GitHub API operations.
//!
//! This module defines the error types that can occur while querying and
//! mutating discussions: transport failures, pagination contract violations,
//! label resolution failures, incident state machine misuse, and query
//! construction failures.

use steward_protocol::{IncidentStatus, ProtocolError};

/// Errors that can occur during GitHub API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error occurred while calling the GitHub API.
    ///
    /// Covers network failures, authentication failures, and non-2xx
    /// responses.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// The GraphQL response carried an `errors` array.
    #[error("GraphQL error: {}", .messages.join("; "))]
    GraphQl {
        /// The error messages reported by the server.
        messages: Vec<String>,
    },

    /// Token validation failed.
    #[error("token validation failed: {reason}")]
    TokenValidation {
        /// A description of why validation failed.
        reason: String,
    },

    /// The response did not have the expected shape.
    #[error("malformed GraphQL response: {reason}")]
    MalformedResponse {
        /// What was missing or unexpected.
        reason: String,
    },

    /// Pagination did not terminate within the safety bound.
    ///
    /// The remote service kept reporting further pages; this signals a
    /// contract violation and aborts the operation.
    #[error("pagination did not finish within {max_pages} pages")]
    PaginationExhausted {
        /// The configured page bound.
        max_pages: usize,
    },

    /// A label name does not exist on the repository.
    #[error("label not found: {name}")]
    LabelNotFound {
        /// The label name that failed to resolve.
        name: String,
    },

    /// An incident status transition is not allowed.
    #[error("invalid incident transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: IncidentStatus,
        /// The requested status.
        to: IncidentStatus,
    },

    /// A query could not be built from the given filter text.
    ///
    /// Raised before any network call is made.
    #[error("cannot build query: {reason}")]
    QueryConstruction {
        /// Why the filter text was rejected.
        reason: String,
    },

    /// A multi-step mutation failed part way through.
    #[error("{failed} failed after completing [{}]: {source}", .completed.join(", "))]
    PartialMutation {
        /// Steps that succeeded before the failure, in order.
        completed: Vec<String>,
        /// The step that failed.
        failed: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns `true` for network, authentication, and HTTP-level failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Api(_) | Self::GraphQl { .. } | Self::TokenValidation { .. }
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            ProtocolError::UnknownStatus(status) => {
                Self::malformed(format!("unknown incident status {status}"))
            }
        }
    }
}

/// A specialized Result type for GitHub API operations.
pub type Result<T> = std::result::Result<T, Error>;
