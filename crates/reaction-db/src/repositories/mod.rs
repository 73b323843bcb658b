//! Repository implementations
//!
//! SQLite implementations of the ports defined in reaction-core.

mod channel;
mod error;
mod message;
mod progress;
mod reaction;
mod writer;

pub use channel::SqliteChannelRepository;
pub use error::encode_time;
pub use message::SqliteMessageRepository;
pub use progress::SqliteProgressLedger;
pub use reaction::SqliteReactionRepository;
pub use writer::SqlitePersistenceWriter;
