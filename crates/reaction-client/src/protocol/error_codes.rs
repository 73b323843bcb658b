//! Platform error-code classification
//!
//! The API reports failures as `{"ok": false, "error": "<code>"}`. Each code is
//! mapped to how the caller and the orchestrator must react to it.

use serde::Serialize;

/// Reaction class for a platform error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Retry after the server's wait hint
    RateLimited,
    /// Retry after a jittered backoff
    Transient,
    /// Credential is unusable; abort the whole run
    Auth,
    /// Credential lacks a scope; abort the whole run
    Scope,
    /// This channel cannot be read; fail it and continue
    ChannelFatal,
    /// Anything else; surfaced without retry
    Other,
}

impl ErrorClass {
    /// Classify a platform error code
    #[must_use]
    pub fn classify(code: &str) -> Self {
        match code {
            "ratelimited" | "rate_limited" => Self::RateLimited,
            "timeout" | "service_unavailable" | "fatal_error" | "internal_error"
            | "request_timeout" => Self::Transient,
            "invalid_auth" | "not_authed" | "account_inactive" | "token_revoked"
            | "token_expired" => Self::Auth,
            "missing_scope" | "no_permission" => Self::Scope,
            "channel_not_found" | "is_archived" | "not_in_channel" | "access_denied"
            | "thread_not_found" => Self::ChannelFatal,
            _ => Self::Other,
        }
    }

    /// Whether the caller retries this class itself
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Transient)
    }

    /// Whether the class aborts the run rather than a single channel
    #[must_use]
    pub const fn is_workspace_fatal(self) -> bool {
        matches!(self, Self::Auth | Self::Scope)
    }

    /// Get the description for this class
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limited",
            Self::Transient => "Transient server failure",
            Self::Auth => "Authentication failed",
            Self::Scope => "Missing OAuth scope",
            Self::ChannelFatal => "Channel not readable",
            Self::Other => "API error",
        }
    }
}
