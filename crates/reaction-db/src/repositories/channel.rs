//! SQLite implementation of ChannelRepository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use reaction_core::entities::Channel;
use reaction_core::traits::{ChannelRepository, RepoResult};
use reaction_core::value_objects::ChannelId;

use crate::mappers::ChannelInsert;
use crate::models::ChannelModel;

use super::error::{encode_time, map_db_error};

/// SQLite implementation of ChannelRepository
#[derive(Clone)]
pub struct SqliteChannelRepository {
    pool: SqlitePool,
}

impl SqliteChannelRepository {
    /// Create a new SqliteChannelRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for SqliteChannelRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &ChannelId) -> RepoResult<Option<Channel>> {
        let result = sqlx::query_as::<_, ChannelModel>(
            r"
            SELECT channel_id, name, is_private, is_archived, created_at, updated_at
            FROM channels
            WHERE channel_id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Channel::from))
    }

    #[instrument(skip(self, channel), fields(channel_id = %channel.id))]
    async fn upsert(&self, channel: &Channel) -> RepoResult<()> {
        let insert = ChannelInsert::new(channel);
        let now = encode_time(Utc::now());

        sqlx::query(
            r"
            INSERT INTO channels (channel_id, name, is_private, is_archived, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT (channel_id) DO UPDATE SET
                name = excluded.name,
                is_private = excluded.is_private,
                is_archived = excluded.is_archived,
                updated_at = excluded.updated_at
            ",
        )
        .bind(insert.channel_id)
        .bind(insert.name)
        .bind(insert.is_private)
        .bind(insert.is_archived)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_candidates(&self) -> RepoResult<Vec<ChannelId>> {
        let ids = sqlx::query_scalar::<_, String>(
            r"
            SELECT channel_id FROM channels
            WHERE is_archived = 0
            ORDER BY channel_id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(ChannelId::new).collect())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> RepoResult<Vec<Channel>> {
        let results = sqlx::query_as::<_, ChannelModel>(
            r"
            SELECT channel_id, name, is_private, is_archived, created_at, updated_at
            FROM channels
            ORDER BY channel_id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Channel::from).collect())
    }
}
