//! # reaction-core
//!
//! Domain layer containing entities, value objects and the ports the ingestion
//! pipeline is written against. This crate has zero dependencies on infrastructure
//! (database, HTTP client, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Channel, ChannelVisibility, Checkpoint, ClaimOutcome, ClaimRequest, Message, PageOrder,
    ProgressRecord, ProgressStatus, ReactionEntry, ReactionTally, ResumePoint,
};
pub use error::DomainError;
pub use traits::{
    ChannelRepository, Clock, FlushBatch, MessageRepository, PersistenceWriter, ProgressLedger,
    ReactionRepository, RepoResult, SystemClock,
};
pub use value_objects::{ChannelId, MessageTs, MessageTsParseError, Scopes};
