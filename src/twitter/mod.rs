//! X (Twitter) API v2 access: conversation search and user lookup.
//!
//! Every response is checked against the rate-limit quota header. A quota of
//! exactly zero is fatal; the caller is expected to stop and re-run later.

mod models;
mod thread;
mod users;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

pub use models::{Entities, Mention, Post, PublicMetrics, ThreadResponse, UrlEntity, UserProfile};
pub use thread::ThreadRetriever;
pub use users::{distinct_handles, lookup_users};

const RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";

#[derive(Debug, Error)]
pub enum ThreadError {
    #[error("rate limit quota exhausted")]
    QuotaExhausted,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ThreadError {
    /// Whether this error must abort the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::QuotaExhausted)
    }
}

/// Authenticated client for the X API.
#[derive(Clone)]
pub struct XClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl XClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    /// GET a JSON endpoint, enforcing the quota contract.
    ///
    /// The quota is checked first; a non-success status is an error after that.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, ThreadError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        match rate_limit_remaining(response.headers()) {
            Some(0) => {
                warn!(url = %url, "X API rate limit quota exhausted");
                return Err(ThreadError::QuotaExhausted);
            }
            Some(remaining) => debug!(remaining, "X API rate limit remaining"),
            None => warn!(url = %url, "Response carried no rate limit header"),
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, body = %body, "X API returned an error status");
            return Err(ThreadError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for XClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Parse the remaining-quota header, if present and numeric.
fn rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RATE_LIMIT_REMAINING)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_rate_limit_remaining() {
        let mut headers = HeaderMap::new();
        assert_eq!(rate_limit_remaining(&headers), None);

        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
        assert_eq!(rate_limit_remaining(&headers), Some(0));

        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("179"));
        assert_eq!(rate_limit_remaining(&headers), Some(179));

        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("lots"));
        assert_eq!(rate_limit_remaining(&headers), None);
    }

    #[test]
    fn test_only_quota_is_fatal() {
        assert!(ThreadError::QuotaExhausted.is_fatal());
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!ThreadError::Decode(decode).is_fatal());
        assert!(!ThreadError::Status(StatusCode::UNAUTHORIZED).is_fatal());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = XClient::new(reqwest::Client::new(), "https://api.example/", "secret");
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("https://api.example"));
    }
}
