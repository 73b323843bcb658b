//! Message database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub channel_id: String,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub user_id: Option<String>,
    pub is_reply: bool,
    pub parent_ts: Option<String>,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
}

impl MessageModel {
    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.is_reply
    }
}
