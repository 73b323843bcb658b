//! Typed API operations used by the aggregator

use std::sync::Arc;

use reaction_common::{RetryConfig, SlackConfig};
use reaction_core::{ChannelId, Message, MessageTs, PageOrder, ReactionEntry, Scopes};
use tracing::{debug, instrument};

use crate::caller::RateLimitedCaller;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageRequest, PageWalker};
use crate::protocol::{EmojiListResponse, Endpoint, HistoryResponse, ReactionsGetResponse};
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, Params, TransportError};

/// Client behaviour knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlackClientOptions {
    /// Messages requested per page
    pub page_limit: u32,
    /// Look up reactions individually when a listing omits them
    pub reactions_fallback: bool,
    /// Order in which history pages deliver messages
    pub history_order: PageOrder,
}

impl Default for SlackClientOptions {
    fn default() -> Self {
        Self {
            page_limit: 200,
            reactions_fallback: false,
            history_order: PageOrder::NewestFirst,
        }
    }
}

impl From<&SlackConfig> for SlackClientOptions {
    fn from(config: &SlackConfig) -> Self {
        Self {
            page_limit: config.page_limit,
            reactions_fallback: config.reactions_fallback,
            ..Self::default()
        }
    }
}

/// Web API client
#[derive(Debug, Clone)]
pub struct SlackClient {
    caller: RateLimitedCaller,
    options: SlackClientOptions,
}

impl SlackClient {
    pub fn new(caller: RateLimitedCaller, options: SlackClientOptions) -> Self {
        Self { caller, options }
    }

    /// Build the production client: HTTP transport, paced caller
    pub fn from_config(slack: &SlackConfig, retry: &RetryConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&slack.api_base_url, &slack.token, slack.timeout())?;
        let caller = RateLimitedCaller::new(Arc::new(transport), RetryPolicy::from(retry))
            .with_requests_per_minute(slack.requests_per_minute);
        Ok(Self::new(caller, SlackClientOptions::from(slack)))
    }

    pub fn options(&self) -> &SlackClientOptions {
        &self.options
    }

    #[inline]
    pub fn history_order(&self) -> PageOrder {
        self.options.history_order
    }

    /// Walk channel history strictly between `oldest` and `latest`
    pub fn history(
        &self,
        channel: &ChannelId,
        oldest: Option<MessageTs>,
        latest: Option<MessageTs>,
    ) -> PageWalker<'_> {
        PageWalker::new(
            self,
            PageRequest::History {
                channel: channel.clone(),
                oldest,
                latest,
            },
        )
    }

    /// Walk the replies of one thread
    pub fn replies(&self, channel: &ChannelId, thread_ts: &MessageTs) -> PageWalker<'_> {
        PageWalker::new(
            self,
            PageRequest::Replies {
                channel: channel.clone(),
                thread_ts: thread_ts.clone(),
            },
        )
    }

    pub(crate) async fn fetch_page(
        &self,
        request: &PageRequest,
        cursor: Option<&str>,
    ) -> ApiResult<(Vec<Message>, Option<String>)> {
        let endpoint = request.endpoint();
        let params = request.params(self.options.page_limit, cursor);
        let (payload, _) = self.caller.call_json::<HistoryResponse>(endpoint, &params).await?;

        let next_cursor = payload.next_cursor().map(str::to_string);
        let channel = request.channel();
        let mut messages = Vec::with_capacity(payload.messages.len());

        for wire in payload.messages {
            let lacks_reactions = wire.lacks_reactions();
            let mut message = wire
                .into_message(channel)
                .map_err(|e| ApiError::protocol(endpoint, e))?;

            if lacks_reactions && self.options.reactions_fallback {
                message.reactions = self.reactions_for(channel, &message.ts).await?;
            }
            messages.push(message);
        }

        debug!(
            channel_id = %channel,
            endpoint = %endpoint,
            count = messages.len(),
            has_more = next_cursor.is_some(),
            "Fetched page"
        );
        Ok((messages, next_cursor))
    }

    /// Reactions on a single message
    #[instrument(skip(self))]
    pub async fn reactions_for(
        &self,
        channel: &ChannelId,
        ts: &MessageTs,
    ) -> ApiResult<Vec<ReactionEntry>> {
        let params: Params = vec![
            ("channel", channel.to_string()),
            ("timestamp", ts.to_string()),
            ("full", "true".to_string()),
        ];
        let (payload, _) = self
            .caller
            .call_json::<ReactionsGetResponse>(Endpoint::ReactionsGet, &params)
            .await?;
        Ok(payload.into_reactions())
    }

    /// Scopes granted to the credential, or `None` when the server did not say
    #[instrument(skip(self))]
    pub async fn granted_scopes(&self) -> ApiResult<Option<Scopes>> {
        let response = self.caller.call(Endpoint::AuthTest, &Vec::new()).await?;
        Ok(response.oauth_scopes.as_deref().map(Scopes::from_scope_list))
    }

    /// Custom emoji names in the workspace, aliases excluded
    #[instrument(skip(self))]
    pub async fn custom_emojis(&self) -> ApiResult<Vec<String>> {
        let (payload, _) = self
            .caller
            .call_json::<EmojiListResponse>(Endpoint::EmojiList, &Vec::new())
            .await?;
        Ok(payload.custom_names())
    }
}
