//! Web API endpoints

use std::fmt;

/// Web API methods used by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Channel history, newest first
    ConversationsHistory,
    /// Thread replies, root first then oldest to newest
    ConversationsReplies,
    /// Token identity; granted scopes arrive in a response header
    AuthTest,
    /// Reactions on a single message
    ReactionsGet,
    /// Workspace custom emoji
    EmojiList,
}

impl Endpoint {
    /// API method name
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::ConversationsHistory => "conversations.history",
            Self::ConversationsReplies => "conversations.replies",
            Self::AuthTest => "auth.test",
            Self::ReactionsGet => "reactions.get",
            Self::EmojiList => "emoji.list",
        }
    }

    /// Look up an endpoint by method name
    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "conversations.history" => Some(Self::ConversationsHistory),
            "conversations.replies" => Some(Self::ConversationsReplies),
            "auth.test" => Some(Self::AuthTest),
            "reactions.get" => Some(Self::ReactionsGet),
            "emoji.list" => Some(Self::EmojiList),
            _ => None,
        }
    }

    /// Whether the endpoint is paginated with `cursor`
    #[must_use]
    pub const fn is_paginated(self) -> bool {
        matches!(self, Self::ConversationsHistory | Self::ConversationsReplies)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}
