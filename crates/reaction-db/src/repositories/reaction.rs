//! SQLite implementation of ReactionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use reaction_core::entities::ReactionTally;
use reaction_core::error::DomainError;
use reaction_core::traits::{ReactionRepository, RepoResult};
use reaction_core::value_objects::ChannelId;

use crate::models::ReactionCountModel;

use super::error::map_db_error;

/// SQLite implementation of ReactionRepository
#[derive(Clone)]
pub struct SqliteReactionRepository {
    pool: SqlitePool,
}

impl SqliteReactionRepository {
    /// Create a new SqliteReactionRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn to_count(model: ReactionCountModel) -> (String, u64) {
    (model.emoji, u64::try_from(model.count).unwrap_or(0))
}

#[async_trait]
impl ReactionRepository for SqliteReactionRepository {
    #[instrument(skip(self))]
    async fn totals_for_channel(&self, channel_id: &ChannelId) -> RepoResult<ReactionTally> {
        let results = sqlx::query_as::<_, ReactionCountModel>(
            r"
            SELECT emoji, count
            FROM reactions
            WHERE channel_id = ?1
            ",
        )
        .bind(channel_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(to_count).collect())
    }

    #[instrument(skip(self))]
    async fn top_emojis(
        &self,
        channel_id: Option<&ChannelId>,
        limit: u32,
    ) -> RepoResult<Vec<(String, u64)>> {
        let limit = i64::from(limit.clamp(1, 1000));

        let results = sqlx::query_as::<_, ReactionCountModel>(
            r"
            SELECT emoji, SUM(count) AS count
            FROM reactions
            WHERE ?1 IS NULL OR channel_id = ?1
            GROUP BY emoji
            ORDER BY count DESC, emoji
            LIMIT ?2
            ",
        )
        .bind(channel_id.map(ChannelId::as_str))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(to_count).collect())
    }

    #[instrument(skip(self))]
    async fn last_updated(&self, channel_id: &ChannelId) -> RepoResult<Option<DateTime<Utc>>> {
        let raw = sqlx::query_scalar::<_, Option<String>>(
            "SELECT MAX(updated_at) FROM reactions WHERE channel_id = ?1",
        )
        .bind(channel_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| DomainError::DatabaseError(format!("bad timestamp {s:?}: {e}")))
        })
        .transpose()
    }
}
