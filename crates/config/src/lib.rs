//! Configuration management for steward.
//!
//! This crate handles loading, validating, and persisting configuration.
//!
//! # Overview
//!
//! - [`config`]: Core configuration struct and loading logic
//! - [`repository`]: Repository entries with flexible parsing
//! - [`lifecycle`]: Dormancy thresholds and automation settings
//! - [`auth`]: GitHub token resolution
//! - [`persistence`]: Config file reading and writing
//! - [`error`]: Error types for configuration operations
//!
//! # Configuration Files
//!
//! The first file found is used:
//!
//! 1. Local config (`./steward.json5` or `./steward.json`)
//! 2. User config (`~/.config/steward/config.json5` or `~/.config/steward/config.json`)
//! 3. Built-in defaults
//!
//! ```json5
//! {
//!   repositories: [
//!     "rust-lang/rust",
//!     { owner: "private-org", repo: "secret-repo", token: "ghp_xxx" },
//!   ],
//!   lifecycle: {
//!     dormant_after_days: 60,
//!     close_after_days: 30,
//!     unanswered_max_age_days: 30,
//!     close_reason: "outdated",
//!   },
//!   labels: { question: "question", inactive: "inactive" },
//!   incident_category: "Incidents",
//! }
//! ```
//!
//! # Token Resolution
//!
//! 1. Repository-specific token
//! 2. Global `github_token` from config
//! 3. `gh auth token` command (GitHub CLI)
//!
//! # Examples
//!
//! ```no_run
//! use steward_config::Config;
//!
//! # fn example() -> steward_config::Result<()> {
//! let config = Config::load()?;
//! for repo in &config.repositories {
//!     println!("Managing {}", repo.full_name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod persistence;
pub mod repository;

pub use config::Config;
pub use error::{ConfigError, Result};
pub use lifecycle::LifecycleConfig;
pub use repository::Repository;
