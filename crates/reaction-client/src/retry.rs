//! Retry policy for outbound API calls.
//!
//! Two independent budgets are tracked per call:
//!
//! - **Rate limited**: wait exactly the server's `Retry-After` hint (10 s when
//!   absent) plus a fixed safety margin, then resend the same request.
//! - **Transient** (timeouts, connection failures, 5xx, `service_unavailable`…):
//!   wait a uniformly random delay from a range that doubles per attempt, capped.
//!
//! # Transient backoff schedule (defaults)
//!
//! | Attempt | Range            |
//! |---------|------------------|
//! | 1       | 10 s – 20 s      |
//! | 2       | 20 s – 40 s      |
//! | 3       | 40 s – 80 s      |
//! | 4       | 80 s – 120 s     |
//! | 5       | 120 s            |
//!
//! The state machine only decides; sleeping goes through [`Sleeper`] so tests can
//! record waits instead of taking them.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reaction_common::RetryConfig;

/// Bounds for the retry state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Rate-limited responses tolerated before giving up
    pub max_rate_limited: u32,
    /// Added on top of every rate-limit wait hint
    pub rate_limit_margin: Duration,
    /// Transient failures tolerated before giving up
    pub max_network: u32,
    /// Lower bound of the first transient backoff range
    pub network_base: Duration,
    /// Upper cap for any transient backoff
    pub network_max: Duration,
    /// Wait hint used when the server sends none
    pub default_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_rate_limited: config.max_rate_limited,
            rate_limit_margin: Duration::from_millis(config.rate_limit_margin_ms),
            max_network: config.max_network,
            network_base: Duration::from_millis(config.network_base_ms),
            network_max: Duration::from_millis(config.network_max_ms),
            default_wait: Duration::from_secs(config.default_wait_secs),
        }
    }
}

impl RetryPolicy {
    /// Backoff range for the n-th (1-based) transient failure
    pub fn network_range(&self, attempt: u32) -> (Duration, Duration) {
        let exp = attempt.saturating_sub(1).min(20);
        let lower = self.network_base.saturating_mul(1 << exp).min(self.network_max);
        let upper = self
            .network_base
            .saturating_mul(1 << (exp + 1))
            .min(self.network_max);
        (lower, upper)
    }
}

/// Why a request is being retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited,
    Timeout,
    Connection,
    ServerError,
}

impl RetryReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::ServerError => "server_error",
        }
    }

    pub const fn is_rate_limit(self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        wait: Duration,
        reason: RetryReason,
        attempt: u32,
        max_attempts: u32,
    },
    GiveUp {
        reason: RetryReason,
        attempts: u32,
    },
}

impl RetryDecision {
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }
}

/// Per-call retry bookkeeping
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    rate_limited: u32,
    network: u32,
    last_hint: Option<Duration>,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            rate_limited: 0,
            network: 0,
            last_hint: None,
        }
    }

    /// Record a rate-limited response carrying an optional wait hint
    pub fn on_rate_limited(&mut self, hint: Option<Duration>) -> RetryDecision {
        self.rate_limited += 1;
        let hint = hint.unwrap_or(self.policy.default_wait);
        self.last_hint = Some(hint);

        if self.rate_limited > self.policy.max_rate_limited {
            return RetryDecision::GiveUp {
                reason: RetryReason::RateLimited,
                attempts: self.attempts(),
            };
        }

        RetryDecision::Retry {
            wait: hint + self.policy.rate_limit_margin,
            reason: RetryReason::RateLimited,
            attempt: self.rate_limited,
            max_attempts: self.policy.max_rate_limited,
        }
    }

    /// Record a transient failure
    pub fn on_transient(&mut self, reason: RetryReason) -> RetryDecision {
        self.network += 1;

        if self.network > self.policy.max_network {
            return RetryDecision::GiveUp {
                reason,
                attempts: self.attempts(),
            };
        }

        let (lower, upper) = self.policy.network_range(self.network);
        let wait = if upper > lower {
            let millis = rand::thread_rng()
                .gen_range(lower.as_millis() as u64..=upper.as_millis() as u64);
            Duration::from_millis(millis)
        } else {
            lower
        };

        RetryDecision::Retry {
            wait,
            reason,
            attempt: self.network,
            max_attempts: self.policy.max_network,
        }
    }

    /// Requests sent so far (failures recorded; the in-flight one is not counted)
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.rate_limited + self.network
    }

    #[inline]
    pub fn last_hint(&self) -> Option<Duration> {
        self.last_hint
    }
}

/// Sleeps between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
