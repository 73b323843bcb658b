//! Entity to DTO mappers

use reaction_core::ProgressRecord;

use super::responses::{ChannelStatusEntry, EmojiCount};

/// Display name for channels missing from the channel table
pub const UNKNOWN_CHANNEL_NAME: &str = "Unknown";

impl From<&ProgressRecord> for ChannelStatusEntry {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            channel_id: record.channel_id.clone(),
            name: UNKNOWN_CHANNEL_NAME.to_string(),
            status: record.status,
            reaction_count: record.reaction_count,
            message_count: 0,
            cursor: record.position.cursor.clone(),
            last_thread_ts: record.position.last_thread_ts.clone(),
            failure_reason: record.failure_reason.clone(),
            updated_at: record.updated_at,
        }
    }
}

impl ChannelStatusEntry {
    pub fn with_name(mut self, name: Option<&str>) -> Self {
        if let Some(name) = name {
            self.name = name.to_string();
        }
        self
    }

    pub fn with_message_count(mut self, count: i64) -> Self {
        self.message_count = count;
        self
    }
}

impl From<(String, u64)> for EmojiCount {
    fn from((emoji, count): (String, u64)) -> Self {
        Self {
            emoji,
            count,
            custom: None,
        }
    }
}
