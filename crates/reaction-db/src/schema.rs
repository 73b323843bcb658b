//! Schema bootstrap
//!
//! Timestamps are stored as fixed-width RFC 3339 text (see `repositories::encode_time`)
//! so that text ordering matches time ordering.

use sqlx::SqlitePool;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS channels (
    channel_id   TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    is_private   INTEGER NOT NULL DEFAULT 0,
    is_archived  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    channel_id   TEXT NOT NULL,
    ts           TEXT NOT NULL,
    thread_ts    TEXT,
    user_id      TEXT,
    is_reply     INTEGER NOT NULL DEFAULT 0,
    parent_ts    TEXT,
    reply_count  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (channel_id, ts)
);

CREATE TABLE IF NOT EXISTS reactions (
    channel_id   TEXT NOT NULL,
    emoji        TEXT NOT NULL,
    count        INTEGER NOT NULL DEFAULT 0,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (channel_id, emoji)
);

CREATE TABLE IF NOT EXISTS progress (
    channel_id      TEXT PRIMARY KEY,
    status          TEXT NOT NULL DEFAULT 'pending',
    cursor          TEXT,
    last_thread_ts  TEXT,
    reaction_count  INTEGER NOT NULL DEFAULT 0,
    failure_reason  TEXT,
    owner           TEXT,
    version         INTEGER NOT NULL DEFAULT 0,
    started_at      TEXT,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_progress_status ON progress (status);
CREATE INDEX IF NOT EXISTS idx_messages_parent ON messages (channel_id, parent_ts);
";

/// Create all tables if they don't already exist
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA).execute(pool).await?;
    tracing::debug!("Schema initialized");
    Ok(())
}
