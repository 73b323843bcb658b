//! Progress database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for progress table
#[derive(Debug, Clone, FromRow)]
pub struct ProgressModel {
    pub channel_id: String,
    pub status: String,
    pub cursor: Option<String>,
    pub last_thread_ts: Option<String>,
    pub reaction_count: i64,
    pub failure_reason: Option<String>,
    pub owner: Option<String>,
    /// Optimistic concurrency token, bumped on every write
    pub version: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
