//! Rate-limited API caller
//!
//! Every outbound request goes through [`RateLimitedCaller::call`], which paces
//! requests, classifies responses and retries rate-limited and transient failures
//! according to [`RetryPolicy`]. Nothing else is mutated.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::protocol::{Endpoint, Envelope, ErrorClass, ProtocolError};
use crate::retry::{RetryDecision, RetryPolicy, RetryReason, RetryState, Sleeper, TokioSleeper};
use crate::transport::{Params, RawResponse, Transport, TransportError};

/// Classified outcome of one attempt
enum Attempt {
    Done(RawResponse),
    RateLimited(Option<Duration>),
    Transient(RetryReason, String),
}

/// Paced, retrying wrapper around a [`Transport`]
#[derive(Clone)]
pub struct RateLimitedCaller {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    pacer: Option<Arc<DefaultDirectRateLimiter>>,
}

impl std::fmt::Debug for RateLimitedCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedCaller")
            .field("policy", &self.policy)
            .field("paced", &self.pacer.is_some())
            .finish()
    }
}

impl RateLimitedCaller {
    /// Create a caller with real sleeping and no pacing
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            policy,
            pacer: None,
        }
    }

    /// Replace the sleeper (tests record waits instead of taking them)
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Pace requests to at most `per_minute`; 0 disables pacing
    pub fn with_requests_per_minute(mut self, per_minute: u32) -> Self {
        self.pacer = NonZeroU32::new(per_minute)
            .map(|n| Arc::new(RateLimiter::direct(Quota::per_minute(n))));
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send a request, retrying until success, a non-retryable error, or an
    /// exhausted budget
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub async fn call(&self, endpoint: Endpoint, params: &Params) -> ApiResult<RawResponse> {
        let mut state = RetryState::new(self.policy);

        loop {
            if let Some(pacer) = &self.pacer {
                pacer.until_ready().await;
            }

            let attempt = match self.transport.send(endpoint, params).await {
                Ok(response) => classify(endpoint, response)?,
                Err(err) if err.is_retryable() => {
                    let reason = match &err {
                        TransportError::Timeout => RetryReason::Timeout,
                        _ => RetryReason::Connection,
                    };
                    Attempt::Transient(reason, err.to_string())
                }
                Err(err) => {
                    return Err(ApiError::Network {
                        endpoint,
                        attempts: state.attempts() + 1,
                        message: err.to_string(),
                    });
                }
            };

            let (decision, message) = match attempt {
                Attempt::Done(response) => {
                    debug!(attempts = state.attempts() + 1, "Request succeeded");
                    return Ok(response);
                }
                Attempt::RateLimited(hint) => (state.on_rate_limited(hint), None),
                Attempt::Transient(reason, message) => (state.on_transient(reason), Some(message)),
            };

            match decision {
                RetryDecision::Retry {
                    wait,
                    reason,
                    attempt,
                    max_attempts,
                } => {
                    warn!(
                        endpoint = %endpoint,
                        reason = %reason,
                        wait_ms = wait.as_millis() as u64,
                        attempt,
                        max_attempts,
                        "Retrying request"
                    );
                    self.sleeper.sleep(wait).await;
                }
                RetryDecision::GiveUp { reason, attempts } => {
                    warn!(endpoint = %endpoint, reason = %reason, attempts, "Giving up on request");
                    return Err(if reason.is_rate_limit() {
                        ApiError::RateLimited {
                            endpoint,
                            attempts,
                            last_hint: state.last_hint(),
                        }
                    } else {
                        ApiError::Network {
                            endpoint,
                            attempts,
                            message: message.unwrap_or_else(|| reason.to_string()),
                        }
                    });
                }
            }
        }
    }

    /// [`call`](Self::call) and decode the body as `T`
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &Params,
    ) -> ApiResult<(T, RawResponse)> {
        let response = self.call(endpoint, params).await?;
        let payload = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::protocol(endpoint, ProtocolError::from_json(&e)))?;
        Ok((payload, response))
    }
}

fn classify(endpoint: Endpoint, response: RawResponse) -> ApiResult<Attempt> {
    if response.is_rate_limited() {
        return Ok(Attempt::RateLimited(response.retry_after));
    }

    let envelope = match Envelope::parse(&response.body) {
        Ok(envelope) => envelope,
        Err(_) if response.is_server_error() => {
            return Ok(Attempt::Transient(
                RetryReason::ServerError,
                format!("HTTP {}", response.status),
            ));
        }
        Err(err) => return Err(ApiError::protocol(endpoint, err)),
    };

    let Some(code) = envelope.error_code() else {
        return Ok(Attempt::Done(response));
    };

    match ErrorClass::classify(code) {
        ErrorClass::RateLimited => Ok(Attempt::RateLimited(response.retry_after)),
        ErrorClass::Transient => Ok(Attempt::Transient(RetryReason::ServerError, code.to_string())),
        ErrorClass::Auth => Err(ApiError::Auth {
            code: code.to_string(),
        }),
        ErrorClass::Scope => Err(ApiError::Scope {
            code: code.to_string(),
            needed: envelope.needed.clone(),
            provided: envelope.provided.clone(),
        }),
        ErrorClass::ChannelFatal => Err(ApiError::Channel {
            endpoint,
            code: code.to_string(),
        }),
        ErrorClass::Other => Err(ApiError::Api {
            endpoint,
            code: code.to_string(),
        }),
    }
}
