//! Value objects - immutable types that represent domain concepts

mod channel_id;
mod message_ts;
mod scopes;

pub use channel_id::ChannelId;
pub use message_ts::{MessageTs, MessageTsParseError};
pub use scopes::Scopes;
