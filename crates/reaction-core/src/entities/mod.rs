//! Domain entities - core business objects

mod channel;
mod message;
mod progress;
mod reaction;

pub use channel::{Channel, ChannelVisibility};
pub use message::Message;
pub use progress::{
    Checkpoint, ClaimOutcome, ClaimRequest, PageOrder, ProgressRecord, ProgressStatus,
    ResumePoint,
};
pub use reaction::{ReactionEntry, ReactionTally};
