//! Shared protocol types for steward.
//!
//! This crate defines the data model used across steward components:
//! discussion and category snapshots, governed label definitions, and the
//! incident status lifecycle.
//!
//! # Overview
//!
//! - [`discussion`]: `Discussion`, `Category`, and `Comment` snapshots
//! - [`label`]: governed label names and definitions
//! - [`incident`]: the `IncidentStatus` state machine and body markers
//! - [`error`]: Error types for protocol operations
//!
//! # Examples
//!
//! Walking an incident through its lifecycle:
//!
//! ```
//! use steward_protocol::IncidentStatus;
//!
//! let status = IncidentStatus::Open;
//! let status = status.transition(IncidentStatus::Update).unwrap();
//! let status = status.transition(IncidentStatus::Resolved).unwrap();
//! let status = status.transition(IncidentStatus::Closed).unwrap();
//!
//! // Closed incidents only move again through reopen
//! assert!(status.transition(IncidentStatus::Update).is_err());
//! assert_eq!(status.reopen(), IncidentStatus::Open);
//! ```

pub mod discussion;
pub mod error;
pub mod incident;
pub mod label;

// Re-export primary types at crate root for convenience
pub use discussion::{Category, CloseReason, Comment, Discussion, NodeId};
pub use error::{ProtocolError, Result};
pub use incident::IncidentStatus;
pub use label::{IncidentLabels, LabelDefinition, LifecycleLabels};
