//! Progress ledger entities - per-channel ingestion state

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{ChannelId, MessageTs};

/// Ingestion status of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ProgressStatus {
    pub const ALL: [ProgressStatus; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Failed,
    ];

    /// Storage representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `completed` is the only state a plain restart never leaves
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether a worker may move a record from `self` into `in_progress`
    pub fn is_claimable(self, force_rescan: bool) -> bool {
        match self {
            Self::Pending | Self::Failed | Self::InProgress => true,
            Self::Completed => force_rescan,
        }
    }

    /// Forward-only transition table
    ///
    /// | from        | to                                   |
    /// |-------------|--------------------------------------|
    /// | pending     | in_progress, failed                  |
    /// | in_progress | in_progress, completed, failed       |
    /// | failed      | in_progress, failed                  |
    /// | completed   | (none without a forced rescan)       |
    pub fn can_transition_to(self, next: ProgressStatus) -> bool {
        use ProgressStatus::{Completed, Failed, InProgress, Pending};
        matches!(
            (self, next),
            (Pending, InProgress | Failed)
                | (InProgress, InProgress | Completed | Failed)
                | (Failed, InProgress | Failed)
        )
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Order in which the platform returns a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrder {
    /// Newest record first; continuation moves back in time
    #[default]
    NewestFirst,
    /// Oldest record first; continuation moves forward in time
    OldestFirst,
}

impl PageOrder {
    /// Timestamp that, once a page is flushed, marks everything before it (in walk
    /// order) as processed
    pub fn frontier<'a>(self, timestamps: impl IntoIterator<Item = &'a MessageTs>) -> Option<MessageTs> {
        let iter = timestamps.into_iter();
        match self {
            Self::NewestFirst => iter.min().cloned(),
            Self::OldestFirst => iter.max().cloned(),
        }
    }

    /// Whether `root` was walked before `last_done` in this order
    pub fn thread_done(self, root: &MessageTs, last_done: Option<&MessageTs>) -> bool {
        match (self, last_done) {
            (_, None) => false,
            (Self::NewestFirst, Some(last)) => root >= last,
            (Self::OldestFirst, Some(last)) => root <= last,
        }
    }
}

/// Where a resumed walk starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    /// History frontier: every message beyond it in walk order is durable
    pub cursor: Option<MessageTs>,
    /// Last thread root whose replies were fully flushed in the current page
    pub last_thread_ts: Option<MessageTs>,
}

impl ResumePoint {
    pub fn at(cursor: MessageTs) -> Self {
        Self {
            cursor: Some(cursor),
            last_thread_ts: None,
        }
    }

    /// Same history position with another thread done
    pub fn with_thread(&self, root: MessageTs) -> Self {
        Self {
            cursor: self.cursor.clone(),
            last_thread_ts: Some(root),
        }
    }
}

/// Progress record entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub channel_id: ChannelId,
    pub status: ProgressStatus,
    pub position: ResumePoint,
    /// Running reaction count for the current scan
    pub reaction_count: i64,
    pub failure_reason: Option<String>,
    /// Run that holds (or last held) the claim
    pub owner: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// A fresh `pending` record
    pub fn pending(channel_id: ChannelId, now: DateTime<Utc>) -> Self {
        Self {
            channel_id,
            status: ProgressStatus::Pending,
            position: ResumePoint::default(),
            reaction_count: 0,
            failure_reason: None,
            owner: None,
            started_at: None,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }

    /// An `in_progress` claim that has not been refreshed within `lease`
    pub fn is_lease_expired(&self, now: DateTime<Utc>, lease: chrono::Duration) -> bool {
        self.status == ProgressStatus::InProgress && self.updated_at + lease < now
    }
}

/// Parameters for claiming a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub run_id: String,
    /// Cursor used when the record has no position yet
    pub initial_cursor: Option<MessageTs>,
    /// Re-enter `in_progress` even from `completed`, resetting position and count
    pub force_rescan: bool,
    /// Age after which another run's `in_progress` claim counts as abandoned
    pub lease: chrono::Duration,
}

/// Result of `mark_in_progress`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This run now owns the channel; walk from the record's position
    Claimed(ProgressRecord),
    /// Channel already finished and no rescan was requested
    AlreadyCompleted(ProgressRecord),
    /// A live claim by another run
    HeldByOther(ProgressRecord),
}

impl ClaimOutcome {
    pub fn record(&self) -> &ProgressRecord {
        match self {
            Self::Claimed(r) | Self::AlreadyCompleted(r) | Self::HeldByOther(r) => r,
        }
    }

    #[inline]
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }
}

/// Ledger advance committed together with a writer flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub channel_id: ChannelId,
    pub run_id: String,
    pub position: ResumePoint,
    pub reaction_delta: i64,
}
