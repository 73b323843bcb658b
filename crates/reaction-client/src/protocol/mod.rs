//! Web API protocol definitions
//!
//! Defines the endpoints used, their response payloads, and how platform error
//! strings are classified.

mod endpoints;
mod error_codes;
mod payloads;

pub use endpoints::Endpoint;
pub use error_codes::ErrorClass;
pub use payloads::{
    AuthTestResponse, EmojiListResponse, Envelope, HistoryResponse, ProtocolError,
    ReactionsGetResponse, RepliesResponse, ResponseMetadata, WireMessage, WireReaction,
};
