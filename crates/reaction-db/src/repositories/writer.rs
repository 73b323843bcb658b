//! SQLite implementation of PersistenceWriter

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;

use reaction_core::traits::{Clock, FlushBatch, PersistenceWriter, RepoResult, SystemClock};

use crate::mappers::MessageInsert;

use super::error::{encode_time, map_db_error, to_db_count};
use super::progress::checkpoint_in;

/// SQLite implementation of PersistenceWriter
///
/// A flush is one transaction: the ledger checkpoint, message rows and reaction
/// deltas commit together or not at all.
#[derive(Clone)]
pub struct SqlitePersistenceWriter {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqlitePersistenceWriter {
    /// Create a new SqlitePersistenceWriter
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a specific clock for row timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl PersistenceWriter for SqlitePersistenceWriter {
    #[instrument(
        skip(self, batch),
        fields(
            channel_id = %batch.channel_id(),
            messages = batch.messages.len(),
            emojis = batch.reactions.len(),
        )
    )]
    async fn flush(&self, batch: &FlushBatch) -> RepoResult<()> {
        let now = self.clock.now();
        let stamp = encode_time(now);
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Refused checkpoints abort the whole batch (tx rolls back on drop)
        checkpoint_in(&mut tx, &batch.checkpoint, now).await?;

        for message in &batch.messages {
            let insert = MessageInsert::new(message);
            sqlx::query(
                r"
                INSERT INTO messages
                    (channel_id, ts, thread_ts, user_id, is_reply, parent_ts, reply_count, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (channel_id, ts) DO UPDATE SET
                    reply_count = excluded.reply_count
                ",
            )
            .bind(insert.channel_id)
            .bind(insert.ts)
            .bind(insert.thread_ts)
            .bind(insert.user_id)
            .bind(insert.is_reply)
            .bind(insert.parent_ts)
            .bind(insert.reply_count)
            .bind(&stamp)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        for (emoji, count) in batch.reactions.iter() {
            sqlx::query(
                r"
                INSERT INTO reactions (channel_id, emoji, count, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (channel_id, emoji) DO UPDATE SET
                    count = reactions.count + excluded.count,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(batch.channel_id().as_str())
            .bind(emoji)
            .bind(to_db_count(count))
            .bind(&stamp)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        tracing::debug!(
            cursor = ?batch.checkpoint.position.cursor,
            delta = batch.checkpoint.reaction_delta,
            "Flushed page"
        );
        Ok(())
    }
}
