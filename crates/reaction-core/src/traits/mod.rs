//! Ports - interfaces the domain needs from infrastructure

mod clock;
mod repositories;

pub use clock::{Clock, SystemClock};
pub use repositories::{
    ChannelRepository, FlushBatch, MessageRepository, PersistenceWriter, ProgressLedger,
    ReactionRepository, RepoResult,
};
