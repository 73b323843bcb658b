//! API client errors
//!
//! By the time an `ApiError` reaches the orchestrator, every retryable condition
//! has already been retried; what remains tells it how far the failure reaches.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::{Endpoint, ProtocolError};

/// Result type alias for client operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Rate limited on {endpoint} after {attempts} attempts")]
    RateLimited {
        endpoint: Endpoint,
        attempts: u32,
        last_hint: Option<Duration>,
    },

    #[error("Network error on {endpoint} after {attempts} attempts: {message}")]
    Network {
        endpoint: Endpoint,
        attempts: u32,
        message: String,
    },

    #[error("Authentication failed: {code}")]
    Auth { code: String },

    #[error("Missing OAuth scope ({code}); needed: {}, provided: {}",
        .needed.as_deref().unwrap_or("?"), .provided.as_deref().unwrap_or("?"))]
    Scope {
        code: String,
        needed: Option<String>,
        provided: Option<String>,
    },

    #[error("Channel not readable via {endpoint}: {code}")]
    Channel { endpoint: Endpoint, code: String },

    #[error("Protocol error on {endpoint}: {source}")]
    Protocol {
        endpoint: Endpoint,
        #[source]
        source: ProtocolError,
    },

    #[error("API error on {endpoint}: {code}")]
    Api { endpoint: Endpoint, code: String },
}

impl ApiError {
    /// Get the error code for this error
    pub fn code(&self) -> &str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Network { .. } => "network_error",
            Self::Protocol { .. } => "protocol_error",
            Self::Auth { code }
            | Self::Scope { code, .. }
            | Self::Channel { code, .. }
            | Self::Api { code, .. } => code,
        }
    }

    /// Credential-level failure; the whole run must stop
    pub fn is_workspace_fatal(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Scope { .. })
    }

    /// Failure confined to the channel being walked
    pub fn is_channel_fatal(&self) -> bool {
        !self.is_workspace_fatal()
    }

    /// Whether the condition was retryable (and its budget is now exhausted)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }

    pub(crate) fn protocol(endpoint: Endpoint, source: ProtocolError) -> Self {
        Self::Protocol { endpoint, source }
    }
}
