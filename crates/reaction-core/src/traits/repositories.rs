//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    Channel, Checkpoint, ClaimOutcome, ClaimRequest, Message, ProgressRecord, ProgressStatus,
    ReactionTally,
};
use crate::error::DomainError;
use crate::value_objects::{ChannelId, MessageTs};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Progress Ledger
// ============================================================================

/// Durable per-channel ingestion state
#[async_trait]
pub trait ProgressLedger: Send + Sync {
    /// Insert a `pending` record for each channel that has none
    async fn register(&self, channel_ids: &[ChannelId]) -> RepoResult<()>;

    /// Current record for a channel
    async fn get_status(&self, channel_id: &ChannelId) -> RepoResult<Option<ProgressRecord>>;

    /// Claim a channel for this run
    ///
    /// Idempotent for the owning run. A `completed` record is left untouched unless
    /// `force_rescan` is set, and a live claim held by another run is refused.
    async fn mark_in_progress(
        &self,
        channel_id: &ChannelId,
        claim: &ClaimRequest,
    ) -> RepoResult<ClaimOutcome>;

    /// Advance position and running count outside of a writer flush
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> RepoResult<ProgressRecord>;

    /// `in_progress` → `completed`
    async fn mark_completed(&self, channel_id: &ChannelId, run_id: &str) -> RepoResult<()>;

    /// Any non-terminal state → `failed`
    ///
    /// An `in_progress` record is only released by the run that owns it; one taken
    /// over by another run is refused with `NotInProgress`.
    async fn mark_failed(&self, channel_id: &ChannelId, run_id: &str, reason: &str)
        -> RepoResult<()>;

    /// Refresh the lease on a claim held by `run_id`
    async fn renew(&self, channel_id: &ChannelId, run_id: &str) -> RepoResult<()>;

    /// Records matching any of `statuses` (all when empty)
    ///
    /// Completed records come first, ordered by reaction count descending; the rest
    /// follow ordered by last update, newest first.
    async fn list(&self, statuses: &[ProgressStatus]) -> RepoResult<Vec<ProgressRecord>>;
}

// ============================================================================
// Persistence Writer
// ============================================================================

/// Everything one processed page contributes to the store
#[derive(Debug, Clone)]
pub struct FlushBatch {
    pub checkpoint: Checkpoint,
    pub messages: Vec<Message>,
    pub reactions: ReactionTally,
}

impl FlushBatch {
    #[inline]
    pub fn channel_id(&self) -> &ChannelId {
        &self.checkpoint.channel_id
    }
}

/// Transactional sink for processed pages
#[async_trait]
pub trait PersistenceWriter: Send + Sync {
    /// Insert absent messages, add reaction deltas and apply the checkpoint in one
    /// transaction. Nothing is written when the checkpoint is refused.
    async fn flush(&self, batch: &FlushBatch) -> RepoResult<()>;
}

// ============================================================================
// Channel Repository
// ============================================================================

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Find channel by ID
    async fn find_by_id(&self, id: &ChannelId) -> RepoResult<Option<Channel>>;

    /// Insert or refresh channel metadata
    async fn upsert(&self, channel: &Channel) -> RepoResult<()>;

    /// Non-archived channel IDs, in stable order
    async fn list_candidates(&self) -> RepoResult<Vec<ChannelId>>;

    /// All known channels
    async fn list_all(&self) -> RepoResult<Vec<Channel>>;
}

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a stored message (without reactions)
    async fn find(&self, channel_id: &ChannelId, ts: &MessageTs) -> RepoResult<Option<Message>>;

    /// Stored message count for a channel
    async fn count_by_channel(&self, channel_id: &ChannelId) -> RepoResult<i64>;
}

// ============================================================================
// Reaction Repository
// ============================================================================

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Stored emoji totals for one channel
    async fn totals_for_channel(&self, channel_id: &ChannelId) -> RepoResult<ReactionTally>;

    /// Most used emoji across channels (or one channel)
    async fn top_emojis(
        &self,
        channel_id: Option<&ChannelId>,
        limit: u32,
    ) -> RepoResult<Vec<(String, u64)>>;

    /// Last time any count for the channel changed
    async fn last_updated(&self, channel_id: &ChannelId) -> RepoResult<Option<DateTime<Utc>>>;
}
