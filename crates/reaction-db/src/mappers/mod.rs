//! Entity to model mappers
//!
//! This module provides conversions between domain entities (reaction-core) and database models.
//! - `TryFrom<Model> for Entity`: Convert database rows to domain objects
//! - `*Insert` structs: Prepare entity data for database operations

mod channel;
mod message;
mod progress;

pub use channel::ChannelInsert;
pub use message::MessageInsert;
pub use progress::{ProgressRow, PROGRESS_COLUMNS};
