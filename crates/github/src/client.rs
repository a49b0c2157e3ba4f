//! GitHub GraphQL transport.
//!
//! This module provides the [`GraphQl`] transport trait and its production
//! implementation, [`GitHubClient`], which posts documents to the GitHub
//! GraphQL endpoint through octocrab.
//!
//! Every call records the rate-limit headers of the response as telemetry.
//! The transport never throttles or retries: a failed call surfaces to the
//! caller immediately.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};

/// Tracing target for rate-limit telemetry.
pub const RATE_LIMIT_TARGET: &str = "steward::rate_limit";

/// A transport able to execute GraphQL documents.
///
/// The repository layer is generic over this trait so it can be driven by
/// [`GitHubClient`] in production and by scripted transports in tests.
pub trait GraphQl {
    /// Executes a document and returns the response's `data` object.
    ///
    /// # Errors
    ///
    /// Returns a transport-class [`Error`] on network or authentication
    /// failure, on a non-2xx response, or when the response carries a
    /// GraphQL `errors` array.
    fn execute(
        &self,
        document: &str,
        variables: Value,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Returns the rate-limit state observed on the most recent call.
    fn last_rate_limit(&self) -> Option<RateLimit> {
        None
    }
}

impl<T: GraphQl + ?Sized> GraphQl for &T {
    fn execute(
        &self,
        document: &str,
        variables: Value,
    ) -> impl Future<Output = Result<Value>> + Send {
        (**self).execute(document, variables)
    }

    fn last_rate_limit(&self) -> Option<RateLimit> {
        (**self).last_rate_limit()
    }
}

/// Rate-limit state reported by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Total quota for the current window, if reported.
    pub limit: Option<u32>,
    /// Remaining quota in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: DateTime<Utc>,
}

impl RateLimit {
    /// Parses rate-limit state from response headers.
    ///
    /// `header` looks up a header value by lowercase name. Returns `None`
    /// when the remaining quota or the reset time is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_github::RateLimit;
    ///
    /// let rate_limit = RateLimit::from_headers(|name| match name {
    ///     "x-ratelimit-limit" => Some("5000"),
    ///     "x-ratelimit-remaining" => Some("4990"),
    ///     "x-ratelimit-reset" => Some("1700000000"),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(rate_limit.remaining, 4990);
    /// assert_eq!(rate_limit.limit, Some(5000));
    /// ```
    pub fn from_headers<'a>(header: impl Fn(&str) -> Option<&'a str>) -> Option<Self> {
        let remaining = header("x-ratelimit-remaining")?.trim().parse().ok()?;
        let reset_epoch: i64 = header("x-ratelimit-reset")?.trim().parse().ok()?;
        let reset_at = Utc.timestamp_opt(reset_epoch, 0).single()?;
        let limit = header("x-ratelimit-limit").and_then(|v| v.trim().parse().ok());

        Some(Self {
            limit,
            remaining,
            reset_at,
        })
    }

    /// Returns `true` when less than a tenth of the quota remains.
    #[must_use]
    pub fn is_low(&self) -> bool {
        match self.limit {
            Some(limit) if limit > 0 => u64::from(self.remaining) * 10 < u64::from(limit),
            _ => false,
        }
    }
}

/// Emits rate-limit telemetry.
pub(crate) fn record_rate_limit(rate_limit: &RateLimit) {
    if rate_limit.is_low() {
        warn!(
            target: RATE_LIMIT_TARGET,
            remaining = rate_limit.remaining,
            limit = ?rate_limit.limit,
            reset_at = %rate_limit.reset_at,
            "GitHub rate limit running low"
        );
    } else {
        debug!(
            target: RATE_LIMIT_TARGET,
            remaining = rate_limit.remaining,
            limit = ?rate_limit.limit,
            reset_at = %rate_limit.reset_at,
            "GitHub rate limit"
        );
    }
}

/// Extracts `data` from a GraphQL response body.
///
/// A response carrying a non-empty `errors` array is a failure even when
/// partial `data` is present.
pub(crate) fn into_data(mut response: Value) -> Result<Value> {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown GraphQL error")
                        .to_string()
                })
                .collect();
            return Err(Error::GraphQl { messages });
        }
    }

    match response.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(Error::malformed("response has no data")),
    }
}

/// GitHub GraphQL client.
///
/// The client is always authenticated: the GraphQL API does not accept
/// anonymous requests. The credential is passed in explicitly and held as a
/// [`SecretString`] until it is handed to octocrab.
///
/// # Examples
///
/// ```no_run
/// use secrecy::SecretString;
/// use steward_github::{GitHubClient, GraphQl};
///
/// # async fn example() -> steward_github::Result<()> {
/// let token = SecretString::from("ghp_your_token".to_string());
/// let client = GitHubClient::new(token)?;
///
/// let login = client.validate_token().await?;
/// println!("Acting as {login}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GitHubClient {
    /// The underlying octocrab client.
    inner: Octocrab,
    /// Rate-limit state from the most recent response.
    rate_limit: Mutex<Option<RateLimit>>,
}

impl GitHubClient {
    /// Creates a new GitHub client authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the octocrab client fails to initialize.
    #[instrument(skip(token))]
    pub fn new(token: SecretString) -> Result<Self> {
        debug!("creating authenticated GitHub client");
        let inner = Octocrab::builder()
            .personal_token(token.expose_secret())
            .build()
            .map_err(Error::Api)?;

        Ok(Self {
            inner,
            rate_limit: Mutex::new(None),
        })
    }

    /// Validates the token and returns the login it acts as.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenValidation`] if GitHub rejects the token.
    /// Returns other transport errors for network failures.
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> Result<String> {
        debug!("validating token with viewer query");
        let data = match self.execute("query Viewer { viewer { login } }", json!({})).await {
            Ok(data) => data,
            Err(Error::Api(octocrab::Error::GitHub { source, .. })) => {
                warn!(message = %source.message, "token validation failed");
                return Err(Error::TokenValidation {
                    reason: source.message,
                });
            }
            Err(e) => return Err(e),
        };

        let login = data
            .pointer("/viewer/login")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed("viewer query returned no login"))?;
        debug!(login = %login, "token validated successfully");
        Ok(login.to_string())
    }

    /// Returns a reference to the underlying octocrab client.
    ///
    /// Used for the REST endpoints that have no GraphQL counterpart.
    #[must_use]
    pub fn inner(&self) -> &Octocrab {
        &self.inner
    }
}

impl GraphQl for GitHubClient {
    #[instrument(skip(self, document, variables))]
    async fn execute(&self, document: &str, variables: Value) -> Result<Value> {
        let payload = json!({
            "query": document,
            "variables": variables,
        });

        let response = self
            .inner
            ._post("/graphql", Some(&payload))
            .await
            .map_err(Error::Api)?;

        let headers = response.headers();
        let rate_limit =
            RateLimit::from_headers(|name| headers.get(name).and_then(|v| v.to_str().ok()));
        if let Some(rate_limit) = &rate_limit {
            record_rate_limit(rate_limit);
        }
        if let Ok(mut last) = self.rate_limit.lock() {
            *last = rate_limit;
        }

        let response = octocrab::map_github_error(response)
            .await
            .map_err(Error::Api)?;
        let text = self
            .inner
            .body_to_string(response)
            .await
            .map_err(Error::Api)?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| Error::malformed(format!("response is not JSON: {e}")))?;

        into_data(body)
    }

    fn last_rate_limit(&self) -> Option<RateLimit> {
        self.rate_limit.lock().ok().and_then(|last| *last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_client_has_no_rate_limit_yet() {
        let token = SecretString::from("fake_token_for_testing".to_string());
        let client = GitHubClient::new(token).unwrap();
        assert!(client.last_rate_limit().is_none());
    }

    #[tokio::test]
    async fn inner_returns_octocrab_reference() {
        let token = SecretString::from("fake_token_for_testing".to_string());
        let client = GitHubClient::new(token).unwrap();
        let _octocrab: &Octocrab = client.inner();
    }

    #[test]
    fn rate_limit_requires_remaining_and_reset() {
        assert!(RateLimit::from_headers(|_| None).is_none());
        assert!(
            RateLimit::from_headers(|name| (name == "x-ratelimit-remaining").then_some("10"))
                .is_none()
        );
    }

    #[test]
    fn rate_limit_parses_reset_time() {
        let rate_limit = RateLimit::from_headers(|name| match name {
            "x-ratelimit-remaining" => Some("12"),
            "x-ratelimit-reset" => Some("1700000000"),
            _ => None,
        })
        .unwrap();
        assert_eq!(rate_limit.remaining, 12);
        assert_eq!(rate_limit.limit, None);
        assert_eq!(rate_limit.reset_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn rate_limit_is_low_below_ten_percent() {
        let reset_at = Utc.timestamp_opt(0, 0).unwrap();
        let low = RateLimit {
            limit: Some(5000),
            remaining: 499,
            reset_at,
        };
        assert!(low.is_low());

        let fine = RateLimit {
            limit: Some(5000),
            remaining: 500,
            reset_at,
        };
        assert!(!fine.is_low());

        let unknown = RateLimit {
            limit: None,
            remaining: 0,
            reset_at,
        };
        assert!(!unknown.is_low());
    }

    #[test]
    fn into_data_returns_data() {
        let data = into_data(json!({"data": {"viewer": {"login": "octocat"}}})).unwrap();
        assert_eq!(data, json!({"viewer": {"login": "octocat"}}));
    }

    #[test]
    fn into_data_surfaces_errors_even_with_partial_data() {
        let err = into_data(json!({
            "data": {"repository": null},
            "errors": [
                {"message": "Could not resolve to a Repository"},
                {"type": "NOT_FOUND"}
            ]
        }))
        .unwrap_err();

        match err {
            Error::GraphQl { messages } => {
                assert_eq!(
                    messages,
                    vec![
                        "Could not resolve to a Repository".to_string(),
                        "unknown GraphQL error".to_string()
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn into_data_rejects_missing_data() {
        let err = into_data(json!({"data": null})).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
