//! Message entity <-> model mapper

use reaction_core::entities::Message;
use reaction_core::error::DomainError;
use reaction_core::value_objects::{ChannelId, MessageTs};

use crate::models::MessageModel;

/// Convert MessageModel to Message entity (reactions are not stored per message)
impl TryFrom<MessageModel> for Message {
    type Error = DomainError;

    fn try_from(model: MessageModel) -> Result<Self, Self::Error> {
        Ok(Message {
            channel_id: ChannelId::new(model.channel_id),
            ts: MessageTs::parse(&model.ts)?,
            thread_ts: model.thread_ts.as_deref().map(MessageTs::parse).transpose()?,
            user_id: model.user_id,
            reply_count: u32::try_from(model.reply_count).unwrap_or(0),
            reactions: Vec::new(),
        })
    }
}

/// Convert Message entity reference to values for database insertion
pub struct MessageInsert<'a> {
    pub channel_id: &'a str,
    pub ts: &'a str,
    pub thread_ts: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub is_reply: bool,
    pub parent_ts: Option<&'a str>,
    pub reply_count: i64,
}

impl<'a> MessageInsert<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            channel_id: message.channel_id.as_str(),
            ts: message.ts.as_str(),
            thread_ts: message.thread_ts.as_ref().map(MessageTs::as_str),
            user_id: message.user_id.as_deref(),
            is_reply: message.is_reply(),
            parent_ts: message.parent_ts().map(MessageTs::as_str),
            reply_count: i64::from(message.reply_count),
        }
    }
}
