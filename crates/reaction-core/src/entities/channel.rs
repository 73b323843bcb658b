//! Channel entity - a conversation space in the workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ChannelId;

/// Channel visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelVisibility {
    #[default]
    Public,
    Private,
}

impl ChannelVisibility {
    #[inline]
    #[must_use]
    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

impl From<bool> for ChannelVisibility {
    fn from(is_private: bool) -> Self {
        if is_private {
            Self::Private
        } else {
            Self::Public
        }
    }
}

/// Channel entity
///
/// Owned by the channel-metadata refresh collaborator. The aggregator only reads
/// `(id, is_archived)` to build its work list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub visibility: ChannelVisibility,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Create a new, non-archived channel
    #[must_use]
    pub fn new(id: ChannelId, name: impl Into<String>, visibility: ChannelVisibility) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            visibility,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark channel as archived
    #[must_use]
    pub fn archived(mut self) -> Self {
        self.is_archived = true;
        self
    }

    /// Whether the aggregator should consider this channel
    #[inline]
    pub fn is_candidate(&self) -> bool {
        !self.is_archived
    }
}
