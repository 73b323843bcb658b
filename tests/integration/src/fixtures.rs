//! Test fixtures and data generators
//!
//! Messages are described with a small builder and rendered to the wire JSON the
//! API delivers, so the fake server and the assertions share one source of truth.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use reaction_core::MessageTs;
use serde_json::{json, Value};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Fixed "now" every scenario starts from
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Wire timestamp `offset` before `now`
pub fn ts_before(now: DateTime<Utc>, offset: Duration) -> String {
    MessageTs::from_datetime(now - offset).as_str().to_string()
}

/// Wire timestamp `hours` before `now`
pub fn hours_ago(now: DateTime<Utc>, hours: i64) -> String {
    ts_before(now, Duration::hours(hours))
}

/// Wire timestamp `days` before `now`
pub fn days_ago(now: DateTime<Utc>, days: i64) -> String {
    ts_before(now, Duration::days(days))
}

/// A message as the fake server will deliver it
#[derive(Debug, Clone)]
pub struct MessageFixture {
    pub ts: String,
    pub user: String,
    pub thread_ts: Option<String>,
    pub reply_count: u32,
    pub reactions: Vec<(String, u32)>,
    /// Render without a `reactions` field at all
    pub omit_reactions: bool,
}

impl MessageFixture {
    pub fn new(ts: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            user: format!("U{}", unique_suffix()),
            thread_ts: None,
            reply_count: 0,
            reactions: Vec::new(),
            omit_reactions: false,
        }
    }

    pub fn reaction(mut self, name: &str, count: u32) -> Self {
        self.reactions.push((name.to_string(), count));
        self
    }

    /// Make this message the root of a thread with `reply_count` replies
    pub fn thread_root(mut self, reply_count: u32) -> Self {
        self.thread_ts = Some(self.ts.clone());
        self.reply_count = reply_count;
        self
    }

    /// Make this message a reply in the thread rooted at `root_ts`
    pub fn reply_to(mut self, root_ts: &str) -> Self {
        self.thread_ts = Some(root_ts.to_string());
        self
    }

    pub fn without_reactions_field(mut self) -> Self {
        self.omit_reactions = true;
        self
    }

    pub fn reaction_total(&self) -> u64 {
        self.reactions.iter().map(|(_, c)| u64::from(*c)).sum()
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "type": "message",
            "ts": self.ts,
            "user": self.user,
            "text": "fixture",
        });
        if let Some(thread_ts) = &self.thread_ts {
            value["thread_ts"] = json!(thread_ts);
        }
        if self.reply_count > 0 {
            value["reply_count"] = json!(self.reply_count);
        }
        if !self.omit_reactions {
            value["reactions"] = Value::Array(
                self.reactions
                    .iter()
                    .map(|(name, count)| json!({ "name": name, "count": count, "users": [] }))
                    .collect(),
            );
        }
        value
    }
}

/// emoji → count over a set of fixtures
pub fn expected_totals<'a>(
    messages: impl IntoIterator<Item = &'a MessageFixture>,
) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for message in messages {
        for (name, count) in &message.reactions {
            *totals.entry(name.clone()).or_insert(0) += u64::from(*count);
        }
    }
    totals
}

/// Body of a successful history or replies page
pub fn page_body(messages: &[Value], next_cursor: Option<&str>) -> String {
    json!({
        "ok": true,
        "messages": messages,
        "has_more": next_cursor.is_some(),
        "response_metadata": { "next_cursor": next_cursor.unwrap_or("") },
    })
    .to_string()
}

/// Body of an error envelope
pub fn error_body(code: &str) -> String {
    json!({ "ok": false, "error": code }).to_string()
}

/// A thread: root plus replies, oldest reply first
#[derive(Debug, Clone)]
pub struct ThreadFixture {
    pub root: MessageFixture,
    pub replies: Vec<MessageFixture>,
}

impl ThreadFixture {
    /// Root at `root_ts` whose replies follow it at one-minute steps
    pub fn new(root: MessageFixture, reply_reactions: &[&[(&str, u32)]]) -> Self {
        let root_ts = root.ts.clone();
        let root_time = MessageTs::parse(&root_ts)
            .map(|ts| ts.to_datetime())
            .unwrap_or_else(|_| base_time());

        let replies = reply_reactions
            .iter()
            .enumerate()
            .map(|(i, reactions)| {
                let ts = MessageTs::from_datetime(root_time + Duration::minutes(i as i64 + 1));
                reactions.iter().fold(
                    MessageFixture::new(ts.as_str()).reply_to(&root_ts),
                    |m, (name, count)| m.reaction(name, *count),
                )
            })
            .collect::<Vec<_>>();

        Self {
            root: root.thread_root(replies.len() as u32),
            replies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_json_shape() {
        let m = MessageFixture::new("1700000000.000100")
            .reaction("tada", 2)
            .thread_root(3);
        let v = m.to_json();
        assert_eq!(v["ts"], "1700000000.000100");
        assert_eq!(v["thread_ts"], "1700000000.000100");
        assert_eq!(v["reply_count"], 3);
        assert_eq!(v["reactions"][0]["name"], "tada");

        let bare = MessageFixture::new("1700000000.000200").without_reactions_field();
        assert!(bare.to_json().get("reactions").is_none());
    }

    #[test]
    fn test_thread_fixture_orders_replies_after_root() {
        let root = MessageFixture::new(hours_ago(base_time(), 5));
        let thread = ThreadFixture::new(root, &[&[("eyes", 1)], &[]]);
        assert_eq!(thread.root.reply_count, 2);
        assert!(thread.replies[0].ts > thread.root.ts);
        assert!(thread.replies[1].ts > thread.replies[0].ts);
        assert_eq!(thread.replies[0].thread_ts.as_deref(), Some(thread.root.ts.as_str()));
    }
}
