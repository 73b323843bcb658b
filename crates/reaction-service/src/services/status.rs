//! Status service
//!
//! Builds the progress overview: completed channels with their final counts, the
//! rest with their resume position or failure reason.

use std::collections::{HashMap, HashSet};

use reaction_core::ChannelId;
use tracing::{instrument, warn};

use crate::dto::{ChannelStatusEntry, EmojiCount, StatusReport};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Status service
pub struct StatusService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatusService<'a> {
    /// Create a new StatusService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Progress of every channel in the ledger plus the most used emoji.
    ///
    /// With `flag_custom`, the workspace's custom emoji list is fetched so each
    /// emoji row can say whether it is custom; a failed lookup only logs.
    #[instrument(skip(self))]
    pub async fn report(&self, top_limit: u32, flag_custom: bool) -> ServiceResult<StatusReport> {
        let records = self.ctx.progress_ledger().list(&[]).await?;
        let names: HashMap<ChannelId, String> = self
            .ctx
            .channel_repo()
            .list_all()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut completed = Vec::new();
        let mut in_progress = Vec::new();
        for record in &records {
            let message_count = self.ctx.message_repo().count_by_channel(&record.channel_id).await?;
            let entry = ChannelStatusEntry::from(record)
                .with_name(names.get(&record.channel_id).map(String::as_str))
                .with_message_count(message_count);

            if record.is_completed() {
                completed.push(entry);
            } else {
                in_progress.push(entry);
            }
        }

        let mut top_emojis: Vec<EmojiCount> = self
            .ctx
            .reaction_repo()
            .top_emojis(None, top_limit)
            .await?
            .into_iter()
            .map(EmojiCount::from)
            .collect();

        if flag_custom {
            self.flag_custom(&mut top_emojis).await;
        }

        Ok(StatusReport {
            completed,
            in_progress,
            top_emojis,
        })
    }

    /// Stored emoji totals for one channel, most used first
    #[instrument(skip(self))]
    pub async fn channel_emojis(
        &self,
        channel_id: &ChannelId,
        limit: u32,
    ) -> ServiceResult<Vec<EmojiCount>> {
        Ok(self
            .ctx
            .reaction_repo()
            .top_emojis(Some(channel_id), limit)
            .await?
            .into_iter()
            .map(EmojiCount::from)
            .collect())
    }

    async fn flag_custom(&self, emojis: &mut [EmojiCount]) {
        match self.ctx.slack().custom_emojis().await {
            Ok(custom) => {
                let custom: HashSet<String> = custom.into_iter().collect();
                for emoji in emojis {
                    emoji.custom = Some(custom.contains(&emoji.emoji));
                }
            }
            Err(e) => warn!(error = %e, "Could not fetch custom emoji list"),
        }
    }
}
