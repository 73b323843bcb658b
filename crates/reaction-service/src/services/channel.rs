//! Channel service
//!
//! Narrow seeding interface for the channel table; the aggregator reads
//! candidates from it.

use reaction_core::Channel;
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::AddChannelRequest;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Channel service
pub struct ChannelService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChannelService<'a> {
    /// Create a new ChannelService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Insert or refresh one channel
    #[instrument(skip(self))]
    pub async fn add_channel(&self, request: &AddChannelRequest) -> ServiceResult<Channel> {
        request.validate()?;

        let channel = request.to_channel();
        self.ctx.channel_repo().upsert(&channel).await?;

        info!(
            channel_id = %channel.id,
            private = channel.visibility.is_private(),
            archived = channel.is_archived,
            "Channel saved"
        );
        Ok(channel)
    }

    /// Every known channel
    pub async fn list_channels(&self) -> ServiceResult<Vec<Channel>> {
        Ok(self.ctx.channel_repo().list_all().await?)
    }
}
