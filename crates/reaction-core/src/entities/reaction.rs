//! Reaction entries and per-channel reaction tallies

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One reaction entry attached to a message
///
/// `count` is the platform-supplied participant count; it is treated as an opaque
/// integer and may exceed `users.len()` when the user list is truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEntry {
    pub name: String,
    pub count: u32,
    #[serde(default)]
    pub users: Vec<String>,
}

impl ReactionEntry {
    /// Create a new ReactionEntry
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            users: Vec::new(),
        }
    }

    /// Check if reaction uses a specific emoji
    #[inline]
    pub fn is_emoji(&self, emoji: &str) -> bool {
        self.name == emoji
    }
}

/// Emoji → count accumulator for one channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionTally {
    counts: BTreeMap<String, u64>,
}

impl ReactionTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` uses of `emoji`
    pub fn add(&mut self, emoji: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(emoji.to_string()).or_insert(0) += count;
    }

    /// Fold every reaction entry in, weighted by participant count
    pub fn add_entries<'a>(&mut self, entries: impl IntoIterator<Item = &'a ReactionEntry>) {
        for entry in entries {
            self.add(&entry.name, u64::from(entry.count));
        }
    }

    /// Add another tally into this one
    pub fn merge(&mut self, other: &ReactionTally) {
        for (emoji, count) in &other.counts {
            self.add(emoji, *count);
        }
    }

    pub fn get(&self, emoji: &str) -> u64 {
        self.counts.get(emoji).copied().unwrap_or(0)
    }

    /// Sum over all emoji
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct emoji
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(emoji, count)| (emoji.as_str(), *count))
    }

    /// Entries ordered by count descending, then emoji name
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn into_map(self) -> BTreeMap<String, u64> {
        self.counts
    }
}

impl FromIterator<(String, u64)> for ReactionTally {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut tally = Self::new();
        for (emoji, count) in iter {
            tally.add(&emoji, count);
        }
        tally
    }
}
