//! Services
//!
//! Each service borrows the shared [`ServiceContext`] and exposes one use case
//! family.

pub mod aggregator;
pub mod channel;
pub mod context;
pub mod error;
pub mod status;
pub mod stop;

pub use aggregator::AggregatorService;
pub use channel::ChannelService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use status::StatusService;
pub use stop::StopHandle;
