//! Cursor-based page walks
//!
//! A [`PageWalker`] fetches one page per [`next_page`](PageWalker::next_page) call
//! and holds nothing but the continuation cursor between calls. Pages come back in
//! the API's native order; mapping that order onto a resume point is the caller's
//! concern.

use reaction_core::{ChannelId, Message, MessageTs};

use crate::client::SlackClient;
use crate::error::ApiResult;
use crate::protocol::Endpoint;
use crate::transport::Params;

/// What to walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Channel history between two exclusive bounds
    History {
        channel: ChannelId,
        oldest: Option<MessageTs>,
        latest: Option<MessageTs>,
    },
    /// Replies of one thread; the root itself is the first element
    Replies {
        channel: ChannelId,
        thread_ts: MessageTs,
    },
}

impl PageRequest {
    pub fn channel(&self) -> &ChannelId {
        match self {
            Self::History { channel, .. } | Self::Replies { channel, .. } => channel,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::History { .. } => Endpoint::ConversationsHistory,
            Self::Replies { .. } => Endpoint::ConversationsReplies,
        }
    }

    pub(crate) fn params(&self, limit: u32, cursor: Option<&str>) -> Params {
        let mut params: Params = vec![
            ("channel", self.channel().to_string()),
            ("limit", limit.to_string()),
        ];

        match self {
            Self::History { oldest, latest, .. } => {
                if let Some(oldest) = oldest {
                    params.push(("oldest", oldest.to_string()));
                }
                if let Some(latest) = latest {
                    params.push(("latest", latest.to_string()));
                }
                params.push(("inclusive", "false".to_string()));
            }
            Self::Replies { thread_ts, .. } => {
                params.push(("ts", thread_ts.to_string()));
            }
        }

        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        params
    }
}

/// One page of messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based position within the walk
    pub number: u32,
    pub messages: Vec<Message>,
    pub next_cursor: Option<String>,
}

impl Page {
    #[inline]
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &MessageTs> {
        self.messages.iter().map(|m| &m.ts)
    }
}

/// Lazy walk over the pages of one [`PageRequest`]
#[derive(Debug)]
pub struct PageWalker<'a> {
    client: &'a SlackClient,
    request: PageRequest,
    cursor: Option<String>,
    pages: u32,
    finished: bool,
}

impl<'a> PageWalker<'a> {
    pub(crate) fn new(client: &'a SlackClient, request: PageRequest) -> Self {
        Self {
            client,
            request,
            cursor: None,
            pages: 0,
            finished: false,
        }
    }

    /// Continue a walk from a previously returned cursor
    pub fn starting_at(mut self, cursor: impl Into<String>) -> Self {
        let cursor = cursor.into();
        self.cursor = (!cursor.is_empty()).then_some(cursor);
        self
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// Cursor the next request will send
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetch the next page, or `None` once the API reported no more.
    ///
    /// On error the walker is left as it was, so the same page can be requested
    /// again.
    pub async fn next_page(&mut self) -> ApiResult<Option<Page>> {
        if self.finished {
            return Ok(None);
        }

        let (messages, next_cursor) = self
            .client
            .fetch_page(&self.request, self.cursor.as_deref())
            .await?;

        self.pages += 1;
        self.finished = next_cursor.is_none();
        self.cursor.clone_from(&next_cursor);

        Ok(Some(Page {
            number: self.pages,
            messages,
            next_cursor,
        }))
    }
}
