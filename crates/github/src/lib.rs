//! GitHub GraphQL engine for steward.
//!
//! This crate queries and mutates GitHub Discussions to drive their
//! lifecycle: finding unanswered questions, labelling and closing dormant
//! discussions, and moving incident discussions through their status
//! lifecycle.
//!
//! # Overview
//!
//! - [`GraphQl`] and [`GitHubClient`]: the transport, with rate-limit
//!   telemetry
//! - [`paginate`]: cursor pagination over GraphQL connections
//! - [`SearchQuery`]: escaped GitHub search strings
//! - [`classify`]: pure lifecycle predicates
//! - [`DiscussionRepository`]: discussion and category queries and mutations
//! - [`IncidentTracker`]: incident status transitions
//! - [`pass`]: one lifecycle pass over a repository
//! - [`sync_labels`]: provisioning of the governed labels
//! - [`Error`]: error types for all of the above
//!
//! All operations run sequentially; nothing is cached between calls.
//!
//! # Authentication
//!
//! The GraphQL API does not accept anonymous requests, so
//! [`GitHubClient::new`] always takes a token. Tokens are handled as
//! [`secrecy::SecretString`] to keep them out of logs.
//!
//! # Examples
//!
//! ```no_run
//! use secrecy::SecretString;
//! use steward_github::{DiscussionRepository, GitHubClient, LifecyclePolicy};
//!
//! # async fn example() -> steward_github::Result<()> {
//! let client = GitHubClient::new(SecretString::from("ghp_xxx".to_string()))?;
//! let repo = DiscussionRepository::new(&client, "owner", "repo", LifecyclePolicy::default());
//!
//! for question in repo.all_unanswered_questions(30).await? {
//!     println!("{} ({})", question.title, question.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod discussion;
pub mod error;
pub mod incident;
pub mod label;
pub mod paginate;
pub mod pass;
pub mod query;

#[cfg(test)]
mod testing;

pub use client::{GitHubClient, GraphQl, RATE_LIMIT_TARGET, RateLimit};
pub use discussion::{DiscussionRepository, LifecyclePolicy, MutationOutcome};
pub use error::{Error, Result};
pub use incident::IncidentTracker;
pub use label::{LabelChange, RepositoryLabel, SyncResult, sync_labels};
pub use pass::{PassSettings, PassSummary};
pub use query::SearchQuery;
