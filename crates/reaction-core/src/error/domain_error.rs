//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::ProgressStatus;
use crate::value_objects::{ChannelId, MessageTsParseError};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Progress record not found: {0}")]
    ProgressNotFound(ChannelId),

    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid message timestamp: {0}")]
    InvalidTimestamp(#[from] MessageTsParseError),

    #[error("Invalid progress status: {0}")]
    InvalidStatus(String),

    // =========================================================================
    // Ledger State Errors
    // =========================================================================
    #[error("Channel {0} is not in progress for this run")]
    NotInProgress(ChannelId),

    #[error("Invalid progress transition for {channel_id}: {from} -> {to}")]
    InvalidTransition {
        channel_id: ChannelId,
        from: ProgressStatus,
        to: ProgressStatus,
    },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable error code for logs and status output
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::ProgressNotFound(_) => "UNKNOWN_PROGRESS",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidTimestamp(_) => "INVALID_TIMESTAMP",
            Self::InvalidStatus(_) => "INVALID_STATUS",

            // Ledger
            Self::NotInProgress(_) => "NOT_IN_PROGRESS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProgressNotFound(_) | Self::ChannelNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::InvalidTimestamp(_) | Self::InvalidStatus(_)
        )
    }

    /// Check if the ledger refused the operation because of the record's state
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::NotInProgress(_) | Self::InvalidTransition { .. })
    }
}
