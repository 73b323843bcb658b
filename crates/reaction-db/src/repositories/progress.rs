//! SQLite implementation of ProgressLedger
//!
//! Every write bumps `version`; claims are compare-and-swap on it so that two
//! workers racing for the same channel cannot both win.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

use reaction_core::entities::{
    Checkpoint, ClaimOutcome, ClaimRequest, ProgressRecord, ProgressStatus, ResumePoint,
};
use reaction_core::error::DomainError;
use reaction_core::traits::{Clock, ProgressLedger, RepoResult, SystemClock};
use reaction_core::value_objects::{ChannelId, MessageTs};

use crate::mappers::{ProgressRow, PROGRESS_COLUMNS};
use crate::models::ProgressModel;

use super::error::{encode_time, map_db_error, progress_not_found};

/// SQLite implementation of ProgressLedger
#[derive(Clone)]
pub struct SqliteProgressLedger {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteProgressLedger {
    /// Create a new SqliteProgressLedger
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a specific clock for lease checks and timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn fetch_row(&self, channel_id: &ChannelId) -> RepoResult<Option<ProgressRow>> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        fetch_row_in(&mut conn, channel_id).await
    }

    async fn insert_pending(&self, channel_id: &ChannelId, now: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO progress (channel_id, status, updated_at)
            VALUES (?1, 'pending', ?2)
            ON CONFLICT (channel_id) DO NOTHING
            ",
        )
        .bind(channel_id.as_str())
        .bind(encode_time(now))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    /// Error for a refused transition, based on the record's current state
    async fn transition_error(
        &self,
        channel_id: &ChannelId,
        to: ProgressStatus,
    ) -> DomainError {
        match self.fetch_row(channel_id).await {
            Ok(Some(row)) if row.record.status == ProgressStatus::InProgress => {
                DomainError::NotInProgress(channel_id.clone())
            }
            Ok(Some(row)) => DomainError::InvalidTransition {
                channel_id: channel_id.clone(),
                from: row.record.status,
                to,
            },
            Ok(None) => progress_not_found(channel_id),
            Err(e) => e,
        }
    }
}

async fn fetch_row_in(
    conn: &mut SqliteConnection,
    channel_id: &ChannelId,
) -> RepoResult<Option<ProgressRow>> {
    let sql = format!("SELECT {PROGRESS_COLUMNS} FROM progress WHERE channel_id = ?1");
    let result = sqlx::query_as::<_, ProgressModel>(&sql)
        .bind(channel_id.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?;

    result.map(ProgressRow::try_from).transpose()
}

/// Apply a checkpoint on an open connection or transaction
///
/// Only the run that holds the `in_progress` claim may advance the record.
pub(crate) async fn checkpoint_in(
    conn: &mut SqliteConnection,
    checkpoint: &Checkpoint,
    now: DateTime<Utc>,
) -> RepoResult<()> {
    let result = sqlx::query(
        r"
        UPDATE progress SET
            cursor = ?1,
            last_thread_ts = ?2,
            reaction_count = reaction_count + ?3,
            updated_at = ?4,
            version = version + 1
        WHERE channel_id = ?5 AND status = 'in_progress' AND owner = ?6
        ",
    )
    .bind(checkpoint.position.cursor.as_ref().map(MessageTs::as_str))
    .bind(checkpoint.position.last_thread_ts.as_ref().map(MessageTs::as_str))
    .bind(checkpoint.reaction_delta)
    .bind(encode_time(now))
    .bind(checkpoint.channel_id.as_str())
    .bind(&checkpoint.run_id)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    if result.rows_affected() == 0 {
        return Err(DomainError::NotInProgress(checkpoint.channel_id.clone()));
    }
    Ok(())
}

/// Position and counters a claim writes, decided from the current record
struct ClaimPlan {
    position: ResumePoint,
    reaction_count: i64,
    started_at: DateTime<Utc>,
}

fn plan_claim(
    current: &ProgressRecord,
    claim: &ClaimRequest,
    now: DateTime<Utc>,
) -> Result<ClaimPlan, ClaimOutcome> {
    match current.status {
        ProgressStatus::Completed if !claim.force_rescan => {
            return Err(ClaimOutcome::AlreadyCompleted(current.clone()));
        }
        ProgressStatus::InProgress
            if current.owner.as_deref() != Some(claim.run_id.as_str())
                && !current.is_lease_expired(now, claim.lease) =>
        {
            return Err(ClaimOutcome::HeldByOther(current.clone()));
        }
        _ => {}
    }

    // A forced rescan starts over; anything else resumes where it stopped
    if current.status == ProgressStatus::Completed {
        return Ok(ClaimPlan {
            position: ResumePoint {
                cursor: claim.initial_cursor.clone(),
                last_thread_ts: None,
            },
            reaction_count: 0,
            started_at: now,
        });
    }

    let position = if current.position.cursor.is_some() {
        current.position.clone()
    } else {
        ResumePoint {
            cursor: claim.initial_cursor.clone(),
            last_thread_ts: None,
        }
    };
    Ok(ClaimPlan {
        position,
        reaction_count: current.reaction_count,
        started_at: current.started_at.unwrap_or(now),
    })
}

#[async_trait]
impl ProgressLedger for SqliteProgressLedger {
    #[instrument(skip(self, channel_ids), fields(count = channel_ids.len()))]
    async fn register(&self, channel_ids: &[ChannelId]) -> RepoResult<()> {
        let now = encode_time(self.clock.now());
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for channel_id in channel_ids {
            sqlx::query(
                r"
                INSERT INTO progress (channel_id, status, updated_at)
                VALUES (?1, 'pending', ?2)
                ON CONFLICT (channel_id) DO NOTHING
                ",
            )
            .bind(channel_id.as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn get_status(&self, channel_id: &ChannelId) -> RepoResult<Option<ProgressRecord>> {
        Ok(self.fetch_row(channel_id).await?.map(|row| row.record))
    }

    #[instrument(skip(self, claim), fields(run_id = %claim.run_id, force = claim.force_rescan))]
    async fn mark_in_progress(
        &self,
        channel_id: &ChannelId,
        claim: &ClaimRequest,
    ) -> RepoResult<ClaimOutcome> {
        let now = self.clock.now();
        self.insert_pending(channel_id, now).await?;

        let row = self
            .fetch_row(channel_id)
            .await?
            .ok_or_else(|| progress_not_found(channel_id))?;

        let plan = match plan_claim(&row.record, claim, now) {
            Ok(plan) => plan,
            Err(outcome) => return Ok(outcome),
        };

        let result = sqlx::query(
            r"
            UPDATE progress SET
                status = 'in_progress',
                cursor = ?1,
                last_thread_ts = ?2,
                reaction_count = ?3,
                failure_reason = NULL,
                owner = ?4,
                started_at = ?5,
                updated_at = ?6,
                version = version + 1
            WHERE channel_id = ?7 AND version = ?8
            ",
        )
        .bind(plan.position.cursor.as_ref().map(MessageTs::as_str))
        .bind(plan.position.last_thread_ts.as_ref().map(MessageTs::as_str))
        .bind(plan.reaction_count)
        .bind(&claim.run_id)
        .bind(encode_time(plan.started_at))
        .bind(encode_time(now))
        .bind(channel_id.as_str())
        .bind(row.version)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        let current = self
            .fetch_row(channel_id)
            .await?
            .ok_or_else(|| progress_not_found(channel_id))?
            .record;

        if result.rows_affected() == 0 {
            // Lost the race: someone else wrote between our read and update
            tracing::debug!(channel_id = %channel_id, "Claim lost to a concurrent writer");
            return Ok(if current.is_completed() {
                ClaimOutcome::AlreadyCompleted(current)
            } else {
                ClaimOutcome::HeldByOther(current)
            });
        }

        Ok(ClaimOutcome::Claimed(current))
    }

    #[instrument(skip(self, checkpoint), fields(channel_id = %checkpoint.channel_id))]
    async fn checkpoint(&self, checkpoint: &Checkpoint) -> RepoResult<ProgressRecord> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        checkpoint_in(&mut conn, checkpoint, self.clock.now()).await?;

        fetch_row_in(&mut conn, &checkpoint.channel_id)
            .await?
            .map(|row| row.record)
            .ok_or_else(|| progress_not_found(&checkpoint.channel_id))
    }

    #[instrument(skip(self))]
    async fn mark_completed(&self, channel_id: &ChannelId, run_id: &str) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE progress SET
                status = 'completed',
                last_thread_ts = NULL,
                updated_at = ?1,
                version = version + 1
            WHERE channel_id = ?2 AND status = 'in_progress' AND owner = ?3
            ",
        )
        .bind(encode_time(self.clock.now()))
        .bind(channel_id.as_str())
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(self
                .transition_error(channel_id, ProgressStatus::Completed)
                .await);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_failed(
        &self,
        channel_id: &ChannelId,
        run_id: &str,
        reason: &str,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE progress SET
                status = 'failed',
                failure_reason = ?1,
                updated_at = ?2,
                version = version + 1
            WHERE channel_id = ?3
              AND (status IN ('pending', 'failed')
                   OR (status = 'in_progress' AND owner = ?4))
            ",
        )
        .bind(reason)
        .bind(encode_time(self.clock.now()))
        .bind(channel_id.as_str())
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(self.transition_error(channel_id, ProgressStatus::Failed).await);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn renew(&self, channel_id: &ChannelId, run_id: &str) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE progress SET
                updated_at = ?1,
                version = version + 1
            WHERE channel_id = ?2 AND status = 'in_progress' AND owner = ?3
            ",
        )
        .bind(encode_time(self.clock.now()))
        .bind(channel_id.as_str())
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotInProgress(channel_id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, statuses: &[ProgressStatus]) -> RepoResult<Vec<ProgressRecord>> {
        let filter = if statuses.is_empty() {
            String::new()
        } else {
            let placeholders = (1..=statuses.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("WHERE status IN ({placeholders})")
        };
        let sql = format!(
            r"
            SELECT {PROGRESS_COLUMNS}
            FROM progress
            {filter}
            ORDER BY
                CASE WHEN status = 'completed' THEN 0 ELSE 1 END,
                CASE WHEN status = 'completed' THEN reaction_count END DESC,
                updated_at DESC,
                channel_id
            "
        );

        let mut query = sqlx::query_as::<_, ProgressModel>(&sql);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        let results = query.fetch_all(&self.pool).await.map_err(map_db_error)?;

        results.into_iter().map(ProgressRecord::try_from).collect()
    }
}
