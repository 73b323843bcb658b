//! Response payload definitions
//!
//! Wire shapes for the endpoints in [`Endpoint`](super::Endpoint). Everything is
//! decoded leniently (unknown fields ignored) and then validated into domain types.

use std::collections::BTreeMap;

use reaction_core::{ChannelId, Message, MessageTs, ReactionEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed or unexpected response content
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Invalid timestamp in field '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl ProtocolError {
    pub(crate) fn from_json(err: &serde_json::Error) -> Self {
        Self::MalformedJson(err.to_string())
    }
}

/// Fields present on every response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Scope the call needed, on `missing_scope`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needed: Option<String>,

    /// Scopes the token holds, on `missing_scope`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided: Option<String>,
}

impl Envelope {
    /// Decode only the envelope fields of a response body
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(body).map_err(|e| ProtocolError::from_json(&e))
    }

    /// Error code, or `unknown_error` when `ok` is false without one
    pub fn error_code(&self) -> Option<&str> {
        if self.ok {
            None
        } else {
            Some(self.error.as_deref().unwrap_or("unknown_error"))
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl ResponseMetadata {
    /// Next page cursor; an empty string means the walk is over
    pub fn cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// One reaction as delivered on a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireReaction {
    pub name: String,
    pub count: u32,
    #[serde(default)]
    pub users: Vec<String>,
}

impl From<WireReaction> for ReactionEntry {
    fn from(wire: WireReaction) -> Self {
        Self {
            name: wire.name,
            count: wire.count,
            users: wire.users,
        }
    }
}

/// One message as delivered by history or replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub ts: String,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub thread_ts: Option<String>,

    #[serde(default)]
    pub reply_count: Option<u32>,

    /// Absent (not empty) when the platform omitted reactions from the listing
    #[serde(default)]
    pub reactions: Option<Vec<WireReaction>>,
}

impl WireMessage {
    /// Validate into a domain message belonging to `channel_id`
    pub fn into_message(self, channel_id: &ChannelId) -> Result<Message, ProtocolError> {
        let ts = parse_ts("ts", &self.ts)?;
        let thread_ts = self
            .thread_ts
            .as_deref()
            .map(|raw| parse_ts("thread_ts", raw))
            .transpose()?;

        Ok(Message {
            channel_id: channel_id.clone(),
            ts,
            thread_ts,
            user_id: self.user,
            reply_count: self.reply_count.unwrap_or(0),
            reactions: self
                .reactions
                .unwrap_or_default()
                .into_iter()
                .map(ReactionEntry::from)
                .collect(),
        })
    }

    /// Whether the reactions field was missing entirely
    #[inline]
    pub fn lacks_reactions(&self) -> bool {
        self.reactions.is_none()
    }
}

fn parse_ts(field: &'static str, raw: &str) -> Result<MessageTs, ProtocolError> {
    MessageTs::parse(raw).map_err(|_| ProtocolError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

/// `conversations.history` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<WireMessage>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

/// `conversations.replies` response; same shape as history
pub type RepliesResponse = HistoryResponse;

impl HistoryResponse {
    /// Next page cursor, if any
    pub fn next_cursor(&self) -> Option<&str> {
        self.response_metadata
            .as_ref()
            .and_then(ResponseMetadata::cursor)
    }
}

/// `reactions.get` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionsGetResponse {
    pub message: Option<WireMessage>,
}

impl ReactionsGetResponse {
    /// Reactions on the requested message (empty when none)
    pub fn into_reactions(self) -> Vec<ReactionEntry> {
        self.message
            .and_then(|m| m.reactions)
            .unwrap_or_default()
            .into_iter()
            .map(ReactionEntry::from)
            .collect()
    }
}

/// `auth.test` response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthTestResponse {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `emoji.list` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmojiListResponse {
    #[serde(default)]
    pub emoji: BTreeMap<String, String>,
}

impl EmojiListResponse {
    /// Custom emoji names, excluding aliases of other emoji
    pub fn custom_names(&self) -> Vec<String> {
        self.emoji
            .iter()
            .filter(|(_, target)| !target.starts_with("alias:"))
            .map(|(name, _)| name.clone())
            .collect()
    }
}
