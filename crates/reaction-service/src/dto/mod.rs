//! Data transfer objects
//!
//! This module provides:
//! - Request DTOs with validation for CLI inputs
//! - Report DTOs serialized for `--json` output
//! - Mappers from domain entities to report rows

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{AddChannelRequest, AggregationRequest};
pub use responses::{
    AggregateReport, ChannelReport, ChannelResult, ChannelStatusEntry, EmojiCount, RunOutcome,
    StatusReport,
};
