//! Test helpers for integration tests
//!
//! `FakeSlack` answers API calls from in-memory channel histories, honouring
//! the `oldest`/`latest`/`limit`/`cursor` parameters the way the real endpoints
//! do, and can be scripted to fail or rate limit. `TestHarness` wires it, a fixed
//! clock and a recording sleeper into a service context over SQLite.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reaction_client::{
    Endpoint, Params, RateLimitedCaller, RawResponse, RetryPolicy, SlackClient,
    SlackClientOptions, Sleeper, Transport, TransportError,
};
use reaction_core::{
    Channel, ChannelId, ChannelVisibility, Clock, MessageTs, PersistenceWriter, ProgressRecord,
};
use reaction_db::{create_memory_pool, init_schema, SqlitePool};
use reaction_service::{
    AggregateReport, AggregationRequest, AggregatorService, ServiceContext,
    ServiceContextBuilder, StopHandle,
};
use serde_json::json;

use crate::fixtures::{base_time, error_body, page_body, MessageFixture, ThreadFixture};

/// Scopes the pipeline requires, as the auth.test header reports them
pub const FULL_SCOPES: &str = "channels:history,groups:history,reactions:read,channels:read";

// ============================================================================
// Fake API
// ============================================================================

/// One request the fake received
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub params: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn channel(&self) -> Option<&str> {
        self.param("channel")
    }
}

#[derive(Default)]
struct FakeState {
    history: HashMap<String, Vec<MessageFixture>>,
    /// (channel, root ts) → root followed by replies
    threads: HashMap<(String, String), Vec<MessageFixture>>,
    channel_errors: HashMap<String, String>,
    scripted: HashMap<Endpoint, VecDeque<RawResponse>>,
    scopes: Option<String>,
    custom_emoji: BTreeMap<String, String>,
    calls: Vec<RecordedCall>,
    /// Request a stop once this many history pages have been served
    stop_after: Option<(usize, StopHandle)>,
    history_pages_served: usize,
}

/// In-process stand-in for the Web API
pub struct FakeSlack {
    state: Mutex<FakeState>,
}

impl Default for FakeSlack {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSlack {
    pub fn new() -> Self {
        let state = FakeState {
            scopes: Some(FULL_SCOPES.to_string()),
            ..FakeState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Add top-level messages to a channel's history
    pub fn add_messages(&self, channel: &str, messages: impl IntoIterator<Item = MessageFixture>) {
        self.state
            .lock()
            .history
            .entry(channel.to_string())
            .or_default()
            .extend(messages);
    }

    /// Add a thread: the root goes into history, the replies behind the replies endpoint
    pub fn add_thread(&self, channel: &str, thread: &ThreadFixture) {
        let mut state = self.state.lock();
        state
            .history
            .entry(channel.to_string())
            .or_default()
            .push(thread.root.clone());

        let mut listing = vec![thread.root.clone()];
        listing.extend(thread.replies.iter().cloned());
        state
            .threads
            .insert((channel.to_string(), thread.root.ts.clone()), listing);
    }

    /// Answer every history request for `channel` with an error envelope
    pub fn fail_channel(&self, channel: &str, code: &str) {
        self.state
            .lock()
            .channel_errors
            .insert(channel.to_string(), code.to_string());
    }

    pub fn clear_failure(&self, channel: &str) {
        self.state.lock().channel_errors.remove(channel);
    }

    /// Serve `response` for the next call to `endpoint`, ahead of the normal answer
    pub fn push_response(&self, endpoint: Endpoint, response: RawResponse) {
        self.state
            .lock()
            .scripted
            .entry(endpoint)
            .or_default()
            .push_back(response);
    }

    /// Serve `count` HTTP 429 responses to `endpoint`
    pub fn rate_limit(&self, endpoint: Endpoint, count: usize, retry_after: Option<Duration>) {
        for _ in 0..count {
            self.push_response(endpoint, RawResponse::too_many_requests(retry_after));
        }
    }

    /// Scopes reported by auth.test; `None` omits the header
    pub fn set_scopes(&self, scopes: Option<&str>) {
        self.state.lock().scopes = scopes.map(str::to_string);
    }

    pub fn add_custom_emoji(&self, name: &str, target: &str) {
        self.state
            .lock()
            .custom_emoji
            .insert(name.to_string(), target.to_string());
    }

    /// Request a stop after `pages` history pages have been served
    pub fn stop_after_history_pages(&self, pages: usize, stop: StopHandle) {
        let mut state = self.state.lock();
        state.history_pages_served = 0;
        state.stop_after = Some((pages, stop));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<RecordedCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls_to(endpoint).len()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn serve(state: &mut FakeState, endpoint: Endpoint, call: &RecordedCall) -> RawResponse {
        if let Some(response) = state
            .scripted
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
        {
            return response;
        }

        match endpoint {
            Endpoint::AuthTest => {
                let response = RawResponse::ok(
                    json!({ "ok": true, "team": "Test", "team_id": "T0", "user_id": "U0" })
                        .to_string(),
                );
                match &state.scopes {
                    Some(scopes) => response.with_scopes(scopes.clone()),
                    None => response,
                }
            }
            Endpoint::EmojiList => RawResponse::ok(
                json!({ "ok": true, "emoji": state.custom_emoji }).to_string(),
            ),
            Endpoint::ConversationsHistory => Self::serve_history(state, call),
            Endpoint::ConversationsReplies => Self::serve_replies(state, call),
            Endpoint::ReactionsGet => Self::serve_reactions(state, call),
        }
    }

    fn serve_history(state: &mut FakeState, call: &RecordedCall) -> RawResponse {
        let channel = call.channel().unwrap_or_default().to_string();
        if let Some(code) = state.channel_errors.get(&channel) {
            return RawResponse::ok(error_body(code));
        }

        let oldest = call.param("oldest").and_then(|v| MessageTs::parse(v).ok());
        let latest = call.param("latest").and_then(|v| MessageTs::parse(v).ok());

        let mut visible: Vec<(MessageTs, &MessageFixture)> = state
            .history
            .get(&channel)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|m| MessageTs::parse(&m.ts).ok().map(|ts| (ts, m)))
            .filter(|(ts, _)| oldest.as_ref().is_none_or(|o| ts > o))
            .filter(|(ts, _)| latest.as_ref().is_none_or(|l| ts < l))
            .collect();
        visible.sort_by(|a, b| b.0.cmp(&a.0));

        let messages: Vec<_> = visible.into_iter().map(|(_, m)| m.to_json()).collect();
        let response = paginate(&messages, call);

        state.history_pages_served += 1;
        if let Some((after, stop)) = &state.stop_after {
            if state.history_pages_served >= *after {
                stop.request_stop();
            }
        }
        response
    }

    fn serve_replies(state: &FakeState, call: &RecordedCall) -> RawResponse {
        let key = (
            call.channel().unwrap_or_default().to_string(),
            call.param("ts").unwrap_or_default().to_string(),
        );
        match state.threads.get(&key) {
            Some(listing) => {
                let messages: Vec<_> = listing.iter().map(MessageFixture::to_json).collect();
                paginate(&messages, call)
            }
            None => RawResponse::ok(error_body("thread_not_found")),
        }
    }

    fn serve_reactions(state: &FakeState, call: &RecordedCall) -> RawResponse {
        let channel = call.channel().unwrap_or_default();
        let ts = call.param("timestamp").unwrap_or_default();

        let found = state
            .history
            .get(channel)
            .into_iter()
            .flatten()
            .chain(
                state
                    .threads
                    .iter()
                    .filter(|((c, _), _)| c == channel)
                    .flat_map(|(_, listing)| listing),
            )
            .find(|m| m.ts == ts);

        match found {
            Some(message) => {
                let mut full = message.clone();
                full.omit_reactions = false;
                RawResponse::ok(
                    json!({ "ok": true, "type": "message", "message": full.to_json() })
                        .to_string(),
                )
            }
            None => RawResponse::ok(error_body("message_not_found")),
        }
    }
}

/// Slice one page out of `messages` using the `limit` and numeric `cursor` params
fn paginate(messages: &[serde_json::Value], call: &RecordedCall) -> RawResponse {
    let limit = call
        .param("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(100)
        .max(1);
    let start = call
        .param("cursor")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
        .min(messages.len());
    let end = (start + limit).min(messages.len());

    let next = (end < messages.len()).then(|| end.to_string());
    RawResponse::ok(page_body(&messages[start..end], next.as_deref()))
}

#[async_trait]
impl Transport for FakeSlack {
    async fn send(&self, endpoint: Endpoint, params: &Params) -> Result<RawResponse, TransportError> {
        let call = RecordedCall {
            endpoint,
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        };

        let mut state = self.state.lock();
        let response = Self::serve(&mut state, endpoint, &call);
        state.calls.push(call);
        Ok(response)
    }
}

// ============================================================================
// Time
// ============================================================================

/// Records requested waits instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }

    pub fn total(&self) -> Duration {
        self.waits.lock().iter().sum()
    }

    pub fn clear(&self) {
        self.waits.lock().clear();
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

/// Manually advanced clock
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Fake API + fixed clock + SQLite store
pub struct TestHarness {
    pub pool: SqlitePool,
    pub slack: Arc<FakeSlack>,
    pub sleeper: Arc<RecordingSleeper>,
    pub clock: Arc<FixedClock>,
    pub options: SlackClientOptions,
    pub policy: RetryPolicy,
}

impl TestHarness {
    /// Harness over a private in-memory database
    pub async fn new() -> Result<Self> {
        let pool = create_memory_pool()
            .await
            .context("Failed to open in-memory database")?;
        Self::with_pool(pool).await
    }

    /// Harness over an existing pool; the schema is created if missing
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        init_schema(&pool).await.context("Failed to create schema")?;
        Ok(Self {
            pool,
            slack: Arc::new(FakeSlack::new()),
            sleeper: Arc::new(RecordingSleeper::default()),
            clock: Arc::new(FixedClock::new(base_time())),
            options: SlackClientOptions::default(),
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.options.page_limit = page_limit;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn client(&self) -> SlackClient {
        self.client_with_sleeper(self.sleeper.clone())
    }

    /// Client over the fake API whose retry waits go to `sleeper`
    pub fn client_with_sleeper(&self, sleeper: Arc<dyn Sleeper>) -> SlackClient {
        let caller = RateLimitedCaller::new(self.slack.clone(), self.policy).with_sleeper(sleeper);
        SlackClient::new(caller, self.options)
    }

    pub fn context(&self) -> Result<ServiceContext> {
        self.builder().build().context("Failed to build context")
    }

    /// Context whose pages go through `writer` instead of the SQLite writer
    pub fn context_with_writer(&self, writer: Arc<dyn PersistenceWriter>) -> Result<ServiceContext> {
        self.builder()
            .writer(writer)
            .build()
            .context("Failed to build context")
    }

    /// Context that calls the API through `client`
    pub fn context_with_client(&self, client: SlackClient) -> Result<ServiceContext> {
        self.builder()
            .slack(client)
            .build()
            .context("Failed to build context")
    }

    fn builder(&self) -> ServiceContextBuilder {
        ServiceContextBuilder::new()
            .pool(self.pool.clone())
            .slack(self.client())
            .clock(self.clock.clone())
    }

    /// 30-day request over `channels` with strict scope checking
    pub fn request(&self, channels: &[&str]) -> AggregationRequest {
        AggregationRequest {
            channels: channels.iter().map(|c| (*c).to_string()).collect(),
            window_days: 30,
            max_workers: 2,
            force_rescan: false,
            strict_scopes: true,
            lease_secs: 300,
        }
    }

    pub async fn aggregate(&self, request: &AggregationRequest) -> Result<AggregateReport> {
        self.aggregate_with_stop(request, &StopHandle::new()).await
    }

    pub async fn aggregate_with_stop(
        &self,
        request: &AggregationRequest,
        stop: &StopHandle,
    ) -> Result<AggregateReport> {
        let ctx = self.context()?;
        let report = AggregatorService::new(&ctx).aggregate(request, stop).await?;
        Ok(report)
    }

    pub async fn seed_channel(&self, id: &str, name: &str, archived: bool) -> Result<()> {
        let mut channel = Channel::new(ChannelId::new(id), name, ChannelVisibility::Public);
        if archived {
            channel = channel.archived();
        }
        let ctx = self.context()?;
        ctx.channel_repo().upsert(&channel).await?;
        Ok(())
    }

    /// Stored emoji totals for a channel
    pub async fn stored_totals(&self, channel: &str) -> Result<BTreeMap<String, u64>> {
        let ctx = self.context()?;
        let tally = ctx
            .reaction_repo()
            .totals_for_channel(&ChannelId::new(channel))
            .await?;
        Ok(tally.into_map())
    }

    pub async fn stored_message_count(&self, channel: &str) -> Result<i64> {
        let ctx = self.context()?;
        Ok(ctx
            .message_repo()
            .count_by_channel(&ChannelId::new(channel))
            .await?)
    }

    pub async fn progress(&self, channel: &str) -> Result<ProgressRecord> {
        let ctx = self.context()?;
        ctx.progress_ledger()
            .get_status(&ChannelId::new(channel))
            .await?
            .with_context(|| format!("no progress record for {channel}"))
    }
}
