//! SQLite implementation of MessageRepository

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;

use reaction_core::entities::Message;
use reaction_core::traits::{MessageRepository, RepoResult};
use reaction_core::value_objects::{ChannelId, MessageTs};

use crate::models::MessageModel;

use super::error::map_db_error;

/// SQLite implementation of MessageRepository
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    /// Create a new SqliteMessageRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    #[instrument(skip(self))]
    async fn find(&self, channel_id: &ChannelId, ts: &MessageTs) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT channel_id, ts, thread_ts, user_id, is_reply, parent_ts, reply_count, created_at
            FROM messages
            WHERE channel_id = ?1 AND ts = ?2
            ",
        )
        .bind(channel_id.as_str())
        .bind(ts.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Message::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn count_by_channel(&self, channel_id: &ChannelId) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE channel_id = ?1")
            .bind(channel_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }
}
