//! Error types for the steward-protocol crate.

use thiserror::Error;

use crate::incident::IncidentStatus;

/// Errors that can occur when working with protocol types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// An incident status transition is not allowed.
    #[error("invalid incident transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: IncidentStatus,
        /// The requested status.
        to: IncidentStatus,
    },

    /// A string did not name a known incident status.
    #[error("unknown incident status: {0}")]
    UnknownStatus(String),
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
