//! Shared plumbing for outbound HTTP calls.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A failed outbound request. Carries what the upstream sent back so the
/// caller can present it; no retry is attempted.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[error("HTTP request '{url}' failed: {message}")]
pub struct HttpClientRequestError {
    pub url: String,
    /// Upstream status, absent when the request never got a response
    pub status: Option<u16>,
    /// Upstream response body as text, if any
    pub body: Option<String>,
    pub message: String,
}

impl HttpClientRequestError {
    /// Capture a non-success response. Consumes the body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let url = response.url().to_string();
        let status = response.status();
        let body = response.text().await.ok().filter(|b| !b.is_empty());
        Self {
            url,
            status: Some(status.as_u16()),
            body,
            message: format!("upstream responded with {}", status),
        }
    }

    pub fn transport(url: &str, error: reqwest::Error) -> Self {
        Self {
            url: url.to_string(),
            status: error.status().map(|s| s.as_u16()),
            body: None,
            message: error.to_string(),
        }
    }

    pub fn decode(url: &str, error: impl std::fmt::Display) -> Self {
        Self {
            url: url.to_string(),
            status: None,
            body: None,
            message: format!("invalid response body: {}", error),
        }
    }
}

pub fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()?;
    Ok(client)
}

/// Send a request and decode a JSON body, turning any failure into an
/// `HttpClientRequestError`.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<T, HttpClientRequestError> {
    let response = request
        .send()
        .await
        .map_err(|e| HttpClientRequestError::transport(url, e))?;

    if !response.status().is_success() {
        return Err(HttpClientRequestError::from_response(response).await);
    }

    response
        .json::<T>()
        .await
        .map_err(|e| HttpClientRequestError::decode(url, e))
}

/// Join a configured host and a relative path without doubling slashes
pub fn join_url(host: &str, path: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("https://x.test/", "/api/v1"), "https://x.test/api/v1");
        assert_eq!(join_url("https://x.test", "api/v1"), "https://x.test/api/v1");
    }

    #[test]
    fn error_message_names_the_url() {
        let err = HttpClientRequestError {
            url: "https://ltsa.test/titles".to_string(),
            status: Some(503),
            body: Some("down".to_string()),
            message: "upstream responded with 503".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP request 'https://ltsa.test/titles' failed: upstream responded with 503"
        );
    }
}
