//! Report DTOs
//!
//! All report DTOs implement `Serialize` for `--json` output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reaction_common::{EXIT_ABORTED, EXIT_OK, EXIT_PARTIAL};
use reaction_core::{ChannelId, MessageTs, ProgressStatus, ReactionTally};
use serde::Serialize;

// ============================================================================
// Aggregation
// ============================================================================

/// How a run ended overall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every requested channel is completed
    Completed,
    /// Some channels failed, were interrupted or were held by another run
    Partial,
    /// A workspace-fatal error stopped the run
    Aborted,
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Completed => EXIT_OK,
            Self::Partial => EXIT_PARTIAL,
            Self::Aborted => EXIT_ABORTED,
        }
    }
}

/// What happened to one channel in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ChannelResult {
    /// History walked to the end; record marked completed
    Completed,
    /// Record was already completed and no rescan was requested
    AlreadyCompleted,
    /// Another live run holds the claim
    HeldByOther { owner: Option<String> },
    /// Channel-fatal error; record marked failed
    Failed { reason: String },
    /// Stop requested before the walk finished
    Interrupted,
}

impl ChannelResult {
    /// Whether the channel counts as done for the run outcome
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed | Self::AlreadyCompleted)
    }
}

/// Per-channel run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub channel_id: ChannelId,
    #[serde(flatten)]
    pub result: ChannelResult,
    /// History pages flushed in this run
    pub pages: u32,
    /// Thread reply walks finished in this run
    pub threads: u32,
    /// Messages flushed in this run (top-level and replies)
    pub messages: u64,
    /// Reaction counts accumulated in this run only
    pub reactions: ReactionTally,
}

impl ChannelReport {
    pub fn new(channel_id: ChannelId, result: ChannelResult) -> Self {
        Self {
            channel_id,
            result,
            pages: 0,
            threads: 0,
            messages: 0,
            reactions: ReactionTally::new(),
        }
    }
}

/// Result of one `aggregate` invocation
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub window_days: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub channels: Vec<ChannelReport>,
}

impl AggregateReport {
    /// channel → emoji → count accumulated in this invocation
    pub fn totals(&self) -> BTreeMap<ChannelId, BTreeMap<String, u64>> {
        self.channels
            .iter()
            .filter(|c| !c.reactions.is_empty())
            .map(|c| (c.channel_id.clone(), c.reactions.clone().into_map()))
            .collect()
    }

    /// Report for a single channel
    pub fn channel(&self, channel_id: &ChannelId) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| &c.channel_id == channel_id)
    }

    /// Sum of reactions counted in this invocation
    pub fn total_reactions(&self) -> u64 {
        self.channels.iter().map(|c| c.reactions.total()).sum()
    }

    pub fn count_where(&self, pred: impl Fn(&ChannelResult) -> bool) -> usize {
        self.channels.iter().filter(|c| pred(&c.result)).count()
    }
}

// ============================================================================
// Status
// ============================================================================

/// One channel row in the status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatusEntry {
    pub channel_id: ChannelId,
    pub name: String,
    pub status: ProgressStatus,
    pub reaction_count: i64,
    pub message_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<MessageTs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_thread_ts: Option<MessageTs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Emoji usage row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmojiCount {
    pub emoji: String,
    pub count: u64,
    /// Workspace custom emoji; unknown unless the custom list was fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<bool>,
}

/// Progress overview across channels
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Completed channels, largest reaction count first
    pub completed: Vec<ChannelStatusEntry>,
    /// Everything else, most recently updated first
    pub in_progress: Vec<ChannelStatusEntry>,
    pub top_emojis: Vec<EmojiCount>,
}

impl StatusReport {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.in_progress.is_empty()
    }

    pub fn total_reactions(&self) -> i64 {
        self.completed
            .iter()
            .chain(&self.in_progress)
            .map(|e| e.reaction_count)
            .sum()
    }
}
