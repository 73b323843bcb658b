//! Error handling utilities for repositories

use chrono::{DateTime, SecondsFormat, Utc};
use reaction_core::error::DomainError;
use reaction_core::value_objects::ChannelId;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Create a "progress not found" error
pub fn progress_not_found(id: &ChannelId) -> DomainError {
    DomainError::ProgressNotFound(id.clone())
}

/// Fixed-width UTC text so that stored timestamps sort chronologically
pub fn encode_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Saturating conversion for counts bound as SQLite integers
pub fn to_db_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
