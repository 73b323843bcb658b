//! Message entity - a history or thread-reply record

use crate::entities::ReactionEntry;
use crate::value_objects::{ChannelId, MessageTs};

/// Message entity
///
/// Created when a page is processed. Only `reply_count` may change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel_id: ChannelId,
    pub ts: MessageTs,
    pub thread_ts: Option<MessageTs>,
    pub user_id: Option<String>,
    pub reply_count: u32,
    pub reactions: Vec<ReactionEntry>,
}

impl Message {
    /// Create a new top-level Message
    pub fn new(channel_id: ChannelId, ts: MessageTs) -> Self {
        Self {
            channel_id,
            ts,
            thread_ts: None,
            user_id: None,
            reply_count: 0,
            reactions: Vec::new(),
        }
    }

    /// Create a reply in the thread rooted at `thread_ts`
    pub fn new_reply(channel_id: ChannelId, ts: MessageTs, thread_ts: MessageTs) -> Self {
        Self {
            thread_ts: Some(thread_ts),
            ..Self::new(channel_id, ts)
        }
    }

    /// A thread root has replies and is its own thread parent
    #[inline]
    pub fn is_thread_root(&self) -> bool {
        self.reply_count > 0 && self.thread_ts.as_ref() == Some(&self.ts)
    }

    /// Check if message is a reply inside a thread
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.thread_ts.as_ref().is_some_and(|root| *root != self.ts)
    }

    /// Root timestamp of the thread this reply belongs to
    pub fn parent_ts(&self) -> Option<&MessageTs> {
        if self.is_reply() {
            self.thread_ts.as_ref()
        } else {
            None
        }
    }

    /// Legacy `channel-ts` message identifier
    pub fn message_key(&self) -> String {
        format!("{}-{}", self.channel_id, self.ts)
    }

    /// Check if message carries any reactions
    #[inline]
    pub fn has_reactions(&self) -> bool {
        !self.reactions.is_empty()
    }
}
