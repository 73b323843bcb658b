//! OAuth scope bitflags for the platform credential
//!
//! Granted scopes arrive as a comma-separated header value; the aggregator needs
//! history read on both public and private channels plus reactions read.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// OAuth scopes relevant to reaction aggregation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Scopes: u32 {
        /// Read public channel history
        const CHANNELS_HISTORY = 1 << 0;
        /// Read private channel history
        const GROUPS_HISTORY   = 1 << 1;
        /// Read reactions on messages
        const REACTIONS_READ   = 1 << 2;
        /// List public channels
        const CHANNELS_READ    = 1 << 3;
        /// List private channels
        const GROUPS_READ      = 1 << 4;
        /// List custom emoji
        const EMOJI_READ       = 1 << 5;

        /// Scopes the aggregation pipeline cannot run without
        const REQUIRED = Self::CHANNELS_HISTORY.bits()
            | Self::GROUPS_HISTORY.bits()
            | Self::REACTIONS_READ.bits();
    }
}

const SCOPE_NAMES: [(Scopes, &str); 6] = [
    (Scopes::CHANNELS_HISTORY, "channels:history"),
    (Scopes::GROUPS_HISTORY, "groups:history"),
    (Scopes::REACTIONS_READ, "reactions:read"),
    (Scopes::CHANNELS_READ, "channels:read"),
    (Scopes::GROUPS_READ, "groups:read"),
    (Scopes::EMOJI_READ, "emoji:read"),
];

impl Scopes {
    /// Parse a comma-separated scope list, ignoring scopes we don't track
    pub fn from_scope_list(list: &str) -> Self {
        list.split(',')
            .map(str::trim)
            .filter_map(Self::from_scope_name)
            .fold(Self::empty(), |acc, scope| acc | scope)
    }

    /// Look up a single scope by its platform name
    pub fn from_scope_name(name: &str) -> Option<Self> {
        SCOPE_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(scope, _)| *scope)
    }

    /// Required scopes absent from this (granted) set
    #[inline]
    pub fn missing_required(&self) -> Scopes {
        Scopes::REQUIRED.difference(*self)
    }

    /// Platform names of the scopes in this set
    pub fn names(&self) -> Vec<&'static str> {
        SCOPE_NAMES
            .iter()
            .filter(|(scope, _)| self.contains(*scope))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}
