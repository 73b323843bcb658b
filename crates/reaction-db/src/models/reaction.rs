//! Reaction database model

use sqlx::FromRow;

/// Emoji count (stored row or aggregate)
#[derive(Debug, Clone, FromRow)]
pub struct ReactionCountModel {
    pub emoji: String,
    pub count: i64,
}
