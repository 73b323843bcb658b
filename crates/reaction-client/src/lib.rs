//! # reaction-client
//!
//! Client for the chat platform's Web API.
//!
//! - `protocol`: endpoints, wire payloads and error-code classification
//! - `transport`: the HTTP seam (`reqwest` in production, scripted fakes in tests)
//! - `retry`: backoff policy as an explicit state machine with injectable sleep
//! - `caller`: every outbound request goes through `RateLimitedCaller`
//! - `pagination`: lazy, restartable page walks over history and thread replies
//! - `client`: the typed operations the aggregator uses

pub mod caller;
pub mod client;
pub mod error;
pub mod pagination;
pub mod protocol;
pub mod retry;
pub mod transport;

// Re-export commonly used types
pub use caller::RateLimitedCaller;
pub use client::{SlackClient, SlackClientOptions};
pub use error::{ApiError, ApiResult};
pub use pagination::{Page, PageRequest, PageWalker};
pub use protocol::{Endpoint, ErrorClass, ProtocolError};
pub use retry::{RetryDecision, RetryPolicy, RetryReason, RetryState, Sleeper, TokioSleeper};
pub use transport::{HttpTransport, Params, RawResponse, Transport, TransportError};
