//! # reaction-db
//!
//! Database layer implementing the repository ports with SQLite via SQLx.
//!
//! ## Overview
//!
//! This crate provides SQLite implementations for the ports defined in
//! `reaction-core`. It handles:
//!
//! - Connection pool management and schema bootstrap
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - The progress ledger and the transactional persistence writer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reaction_db::pool::{create_pool, DatabaseConfig};
//! use reaction_db::repositories::SqliteProgressLedger;
//! use reaction_core::traits::ProgressLedger;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     reaction_db::init_schema(&pool).await?;
//!     let ledger = SqliteProgressLedger::new(pool);
//!
//!     // Use the ledger...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use pool::{create_memory_pool, create_pool, DatabaseConfig, SqlitePool};
pub use repositories::{
    SqliteChannelRepository, SqliteMessageRepository, SqlitePersistenceWriter,
    SqliteProgressLedger, SqliteReactionRepository,
};
pub use schema::init_schema;
