//! Database models - SQLx-compatible structs for SQLite tables

mod channel;
mod message;
mod progress;
mod reaction;

pub use channel::ChannelModel;
pub use message::MessageModel;
pub use progress::ProgressModel;
pub use reaction::ReactionCountModel;
