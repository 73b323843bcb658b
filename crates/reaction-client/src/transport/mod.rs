//! HTTP transport seam
//!
//! The caller only needs "send this method with these parameters and give me the
//! status, headers of interest and body". Keeping that behind a trait lets tests
//! script responses without a network.

mod http;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::Endpoint;

pub use http::HttpTransport;

/// Form parameters for one request
pub type Params = Vec<(&'static str, String)>;

/// Transport-level failure; no response was received
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to build request: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether a fresh attempt might succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Request(_))
    }
}

/// Response as seen by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// `Retry-After` header, when present and numeric
    pub retry_after: Option<Duration>,
    /// `x-oauth-scopes` header, when present
    pub oauth_scopes: Option<String>,
    pub body: String,
}

impl RawResponse {
    /// 200 response with a JSON body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            ..Self::default()
        }
    }

    /// HTTP 429 with an optional wait hint
    pub fn too_many_requests(retry_after: Option<Duration>) -> Self {
        Self {
            status: 429,
            retry_after,
            body: r#"{"ok":false,"error":"ratelimited"}"#.to_string(),
            ..Self::default()
        }
    }

    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.oauth_scopes = Some(scopes.into());
        self
    }

    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    #[inline]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Sends one API request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: Endpoint, params: &Params) -> Result<RawResponse, TransportError>;
}
