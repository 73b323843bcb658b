//! # reaction-service
//!
//! Application layer: drives the ingestion pipeline, builds status reports and
//! seeds channel metadata. DTOs carry validated requests in and serializable
//! reports out.

pub mod dto;
pub mod services;

pub use dto::{
    AddChannelRequest, AggregateReport, AggregationRequest, ChannelReport, ChannelResult,
    ChannelStatusEntry, EmojiCount, RunOutcome, StatusReport,
};
pub use services::{
    AggregatorService, ChannelService, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, StatusService, StopHandle,
};
