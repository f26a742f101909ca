//! Client for the Rubis paste service.
//!
//! The reconciler talks to the service through the [`ScrapClient`] trait;
//! [`RubisClient`] is the blocking HTTP implementation. Every call is
//! fallible and latency-bearing, with an explicit request timeout, and no
//! call may be assumed idempotent.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Base URL of the Rubis v2 API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.rubis.app/v2";

/// Timeout budget for each request to the paste service.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum length of a scrap identifier.
pub const MIN_SCRAP_ID_LENGTH: usize = 8;

/// Errors reported by the paste-service client.
///
/// Never fatal: the reconciler downgrades `Transport` failures to offline
/// mode and import failures to an empty result.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, timeout, or HTTP-status failure.
    #[error("request to paste service failed: {0}")]
    Transport(String),
    /// The service responded, but not in the expected shape.
    #[error("unexpected response from paste service: {0}")]
    InvalidResponse(String),
}

/// Request to create a new scrap.
#[derive(Debug, Clone)]
pub struct CreateScrap {
    /// Serialized task payload.
    pub content: String,
    /// Optional scrap title.
    pub title: Option<String>,
    /// Whether the scrap is publicly readable.
    pub public: bool,
    /// Access key protecting a private scrap.
    pub access_key: Option<String>,
    /// Custom owner key; the service generates one when absent.
    pub owner_key: Option<String>,
}

/// Scrap metadata returned by create/replace calls.
///
/// Field names follow the Rubis API response shape; the `_with_key`
/// variants carry the access key in the query string and are only present
/// for private scraps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapHandle {
    /// Scrap identifier.
    #[serde(default, rename = "scrapID")]
    pub id: Option<String>,
    /// Owner key authorizing future updates.
    #[serde(default, rename = "ownerKey")]
    pub owner_key: Option<String>,
    /// Public view URL.
    #[serde(default)]
    pub view: Option<String>,
    /// Public raw-content URL.
    #[serde(default)]
    pub raw: Option<String>,
    /// View URL qualified with the access key.
    #[serde(default)]
    pub view_with_key: Option<String>,
    /// Raw-content URL qualified with the access key.
    #[serde(default)]
    pub raw_with_key: Option<String>,
}

/// Boundary trait for the remote paste service.
///
/// The reconciler is generic over this so tests can drive it with an
/// in-memory double instead of the network.
pub trait ScrapClient {
    /// Creates a new scrap with the given content.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on any network or response failure.
    fn create(&self, request: CreateScrap) -> Result<ScrapHandle, RemoteError>;

    /// Fetches a scrap's raw content.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on any network or response failure.
    fn fetch_raw(
        &self,
        scrap_id: &str,
        access_key: Option<&str>,
        owner_key: Option<&str>,
    ) -> Result<String, RemoteError>;

    /// Replaces a scrap's content, authorized by the owner key.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on any network or response failure.
    fn replace(
        &self,
        scrap_id: &str,
        owner_key: &str,
        content: &str,
    ) -> Result<ScrapHandle, RemoteError>;
}

/// Blocking HTTP client for the Rubis API.
pub struct RubisClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl RubisClient {
    /// Builds a client against `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn parse_handle(body: &str) -> Result<ScrapHandle, RemoteError> {
        serde_json::from_str(body)
            .map_err(|e| RemoteError::InvalidResponse(format!("{e}: {body}")))
    }
}

impl ScrapClient for RubisClient {
    fn create(&self, request: CreateScrap) -> Result<ScrapHandle, RemoteError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(title) = request.title {
            params.push(("title", title));
        }
        if request.public {
            params.push(("public", "true".to_string()));
        } else if let Some(key) = request.access_key {
            params.push(("accessKey", key));
        }
        if let Some(key) = request.owner_key {
            params.push(("ownerKey", key));
        }

        tracing::debug!(url = %format!("{}/scrap", self.base_url), "creating scrap");
        let response = self
            .http
            .post(format!("{}/scrap", self.base_url))
            .query(&params)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(request.content)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let body = response
            .text()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let handle = Self::parse_handle(&body)?;
        if handle.id.is_none() {
            return Err(RemoteError::InvalidResponse(
                "create response missing scrapID".to_string(),
            ));
        }
        Ok(handle)
    }

    fn fetch_raw(
        &self,
        scrap_id: &str,
        access_key: Option<&str>,
        owner_key: Option<&str>,
    ) -> Result<String, RemoteError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(key) = access_key {
            params.push(("accessKey", key.to_string()));
        }
        if let Some(key) = owner_key {
            params.push(("ownerKey", key.to_string()));
        }
        let response = self
            .http
            .get(format!("{}/scrap/{scrap_id}/raw", self.base_url))
            .query(&params)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        response
            .text()
            .map_err(|e| RemoteError::Transport(e.to_string()))
    }

    fn replace(
        &self,
        scrap_id: &str,
        owner_key: &str,
        content: &str,
    ) -> Result<ScrapHandle, RemoteError> {
        let response = self
            .http
            .put(format!("{}/scrap/{scrap_id}", self.base_url))
            .query(&[("ownerKey", owner_key)])
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(content.to_string())
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let body = response
            .text()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Self::parse_handle(&body)
    }
}

/// Extracts a scrap id from a view link (`…/s/<id>`), an API link
/// (`…/scrap/<id>`), or a bare id.
///
/// Returns `None` when the final path segment is shorter than
/// [`MIN_SCRAP_ID_LENGTH`] or contains characters outside `[A-Za-z0-9_-]`.
#[must_use]
pub fn extract_scrap_id(source: &str) -> Option<String> {
    let trimmed = source.trim().trim_end_matches('/');
    let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let candidate = path.rsplit('/').next().unwrap_or(path);
    let valid = candidate.len() >= MIN_SCRAP_ID_LENGTH
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| candidate.to_string())
}
