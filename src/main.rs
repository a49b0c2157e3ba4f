//! steward - lifecycle automation for GitHub Discussions.
//!
//! Runs one lifecycle pass over every configured repository:
//!
//! 1. Provisions the governed labels
//! 2. Reports recent unanswered questions
//! 3. Labels dormant discussions inactive
//! 4. Closes discussions that stayed inactive
//!
//! Scheduling is left to the caller (cron, a workflow, ...). Log verbosity is
//! controlled with `RUST_LOG` and defaults to `info`.

use anyhow::{Context, bail};
use steward_config::{Config, Repository, auth::resolve_token, persistence};
use steward_github::{
    DiscussionRepository, GitHubClient, GraphQl, LifecyclePolicy, PassSettings, PassSummary,
    sync_labels,
};
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::EnvFilter;

fn policy(config: &Config) -> LifecyclePolicy {
    LifecyclePolicy {
        labels: config.labels.clone(),
        incident_category: config.incident_category.clone(),
        bot_login: config.lifecycle.bot_login.clone(),
        max_pages: config.lifecycle.max_pages,
    }
}

fn pass_settings(config: &Config) -> PassSettings {
    let lifecycle = &config.lifecycle;
    PassSettings {
        unanswered_max_age_days: lifecycle.unanswered_max_age_days,
        dormant_after_days: lifecycle.dormant_after_days,
        close_after_days: lifecycle.close_after_days,
        close_reason: lifecycle.close_reason,
        inactive_comment: lifecycle.inactive_comment.clone(),
    }
}

async fn run_repository(config: &Config, entry: &Repository) -> anyhow::Result<PassSummary> {
    let token = resolve_token(entry, config.github_token.as_deref())
        .await
        .with_context(|| format!("no GitHub token available for {}", entry.full_name()))?;
    let client = GitHubClient::new(token)?;
    let login = client.validate_token().await?;
    info!(repo = %entry.full_name(), %login, "authenticated");

    match sync_labels(&client, entry.owner(), entry.name(), &config.labels).await {
        Ok(result) if !result.is_unchanged() => {
            info!(created = result.created, updated = result.updated, "provisioned labels");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not provision labels, continuing"),
    }

    let repo = DiscussionRepository::new(&client, entry.owner(), entry.name(), policy(config));
    let summary = repo.run_pass(&pass_settings(config)).await?;

    if let Some(rate_limit) = client.last_rate_limit() {
        info!(
            remaining = rate_limit.remaining,
            reset_at = %rate_limit.reset_at,
            "rate limit after pass"
        );
    }

    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().context("failed to load configuration")?;
    if !config.has_repositories() {
        let hint = persistence::default_user_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "steward.json5".to_string());
        warn!(%hint, "no repositories configured");
        return Ok(());
    }

    let mut failures = 0;
    for entry in &config.repositories {
        let span = info_span!("repository", repo = %entry.full_name());
        match run_repository(&config, entry).instrument(span).await {
            Ok(summary) => info!(
                repo = %entry.full_name(),
                unanswered = summary.unanswered,
                marked_inactive = summary.marked_inactive,
                closed = summary.closed,
                "lifecycle pass complete"
            ),
            Err(e) => {
                error!(repo = %entry.full_name(), error = %format!("{e:#}"), "lifecycle pass failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} repositories failed", config.repositories.len());
    }
    Ok(())
}
