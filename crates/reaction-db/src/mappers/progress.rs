//! Progress record <-> model mapper

use reaction_core::entities::{ProgressRecord, ProgressStatus, ResumePoint};
use reaction_core::error::DomainError;
use reaction_core::value_objects::{ChannelId, MessageTs};

use crate::models::ProgressModel;

/// Column list shared by every progress SELECT
pub const PROGRESS_COLUMNS: &str = "channel_id, status, cursor, last_thread_ts, reaction_count, \
     failure_reason, owner, version, started_at, updated_at";

/// A decoded record together with its concurrency token
#[derive(Debug, Clone)]
pub struct ProgressRow {
    pub record: ProgressRecord,
    pub version: i64,
}

fn parse_ts(raw: Option<&str>) -> Result<Option<MessageTs>, DomainError> {
    Ok(raw.map(MessageTs::parse).transpose()?)
}

impl TryFrom<ProgressModel> for ProgressRow {
    type Error = DomainError;

    fn try_from(model: ProgressModel) -> Result<Self, Self::Error> {
        let record = ProgressRecord {
            channel_id: ChannelId::new(model.channel_id),
            status: model.status.parse::<ProgressStatus>()?,
            position: ResumePoint {
                cursor: parse_ts(model.cursor.as_deref())?,
                last_thread_ts: parse_ts(model.last_thread_ts.as_deref())?,
            },
            reaction_count: model.reaction_count,
            failure_reason: model.failure_reason,
            owner: model.owner,
            started_at: model.started_at,
            updated_at: model.updated_at,
        };
        Ok(Self {
            record,
            version: model.version,
        })
    }
}

impl TryFrom<ProgressModel> for ProgressRecord {
    type Error = DomainError;

    fn try_from(model: ProgressModel) -> Result<Self, Self::Error> {
        ProgressRow::try_from(model).map(|row| row.record)
    }
}
