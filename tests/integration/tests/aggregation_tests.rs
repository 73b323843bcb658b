//! Aggregation pipeline tests
//!
//! Drive `AggregatorService` end to end against the scripted API and an
//! in-memory SQLite store.
//!
//! Run with: cargo test -p integration-tests --test aggregation_tests

use integration_tests::{
    days_ago, expected_totals, hours_ago, MessageFixture, TestHarness, ThreadFixture,
};
use reaction_client::Endpoint;
use reaction_core::{ChannelId, MessageTs, ProgressStatus};
use reaction_service::{ChannelResult, RunOutcome};

// ============================================================================
// Counting
// ============================================================================

#[tokio::test]
async fn test_counts_top_level_and_thread_reactions() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();

    let first = MessageFixture::new(hours_ago(now, 1)).reaction("tada", 2);
    let thread = ThreadFixture::new(
        MessageFixture::new(hours_ago(now, 2)).reaction("eyes", 1),
        &[&[("tada", 1)], &[("eyes", 4)]],
    );
    let third = MessageFixture::new(hours_ago(now, 3))
        .reaction("tada", 1)
        .reaction("fire", 3);

    h.slack.add_messages("C1", [first.clone(), third.clone()]);
    h.slack.add_thread("C1", &thread);

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.outcome.exit_code(), 0);

    let channel = report.channel(&ChannelId::new("C1")).unwrap();
    assert_eq!(channel.result, ChannelResult::Completed);
    assert_eq!(channel.pages, 1);
    assert_eq!(channel.threads, 1);

    // root counted once, from history, not again from the replies listing
    assert_eq!(channel.reactions.get("tada"), 4);
    assert_eq!(channel.reactions.get("eyes"), 5);
    assert_eq!(channel.reactions.get("fire"), 3);

    let all = [&first, &third, &thread.root, &thread.replies[0], &thread.replies[1]];
    let expected = expected_totals(all);
    assert_eq!(h.stored_totals("C1").await.unwrap(), expected);
    assert_eq!(h.stored_message_count("C1").await.unwrap(), 5);

    let record = h.progress("C1").await.unwrap();
    assert_eq!(record.status, ProgressStatus::Completed);
    assert_eq!(record.reaction_count, 12);
}

#[tokio::test]
async fn test_replies_are_stored_with_parent() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();

    let thread = ThreadFixture::new(MessageFixture::new(hours_ago(now, 4)), &[&[("wave", 1)]]);
    h.slack.add_thread("C1", &thread);

    h.aggregate(&h.request(&["C1"])).await.unwrap();

    let ctx = h.context().unwrap();
    let reply_ts = MessageTs::parse(&thread.replies[0].ts).unwrap();
    let reply = ctx
        .message_repo()
        .find(&ChannelId::new("C1"), &reply_ts)
        .await
        .unwrap()
        .unwrap();
    assert!(reply.is_reply());
    assert_eq!(reply.parent_ts().map(MessageTs::as_str), Some(thread.root.ts.as_str()));
}

#[tokio::test]
async fn test_multiple_history_pages() {
    let h = TestHarness::new().await.unwrap().with_page_limit(2);
    let now = h.now();

    let messages: Vec<_> = (1..=5)
        .map(|i| MessageFixture::new(hours_ago(now, i)).reaction("thumbsup", 1))
        .collect();
    h.slack.add_messages("C1", messages.clone());

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();

    let channel = report.channel(&ChannelId::new("C1")).unwrap();
    assert_eq!(channel.pages, 3);
    assert_eq!(channel.reactions.get("thumbsup"), 5);
    assert_eq!(h.slack.call_count(Endpoint::ConversationsHistory), 3);

    // newest-first walk ends with the cursor at the oldest message seen
    let record = h.progress("C1").await.unwrap();
    assert_eq!(
        record.position.cursor.map(|c| c.as_str().to_string()),
        Some(messages[4].ts.clone())
    );
}

#[tokio::test]
async fn test_empty_channel_completes() {
    let h = TestHarness::new().await.unwrap();

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.total_reactions(), 0);
    assert!(report.totals().is_empty());
    assert_eq!(h.progress("C1").await.unwrap().status, ProgressStatus::Completed);
}

#[tokio::test]
async fn test_reactions_fallback_when_listing_omits_them() {
    let mut h = TestHarness::new().await.unwrap();
    h.options.reactions_fallback = true;
    let now = h.now();

    h.slack.add_messages(
        "C1",
        [
            MessageFixture::new(hours_ago(now, 1))
                .reaction("rocket", 2)
                .without_reactions_field(),
            MessageFixture::new(hours_ago(now, 2)).reaction("rocket", 1),
        ],
    );

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();

    assert_eq!(h.slack.call_count(Endpoint::ReactionsGet), 1);
    assert_eq!(report.total_reactions(), 3);
}

// ============================================================================
// Window bound
// ============================================================================

#[tokio::test]
async fn test_window_excludes_older_messages() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();

    let inside = MessageFixture::new(days_ago(now, 29)).reaction("tada", 1);
    let boundary = MessageFixture::new(days_ago(now, 30)).reaction("tada", 10);
    let outside = MessageFixture::new(days_ago(now, 31)).reaction("tada", 100);
    h.slack
        .add_messages("C1", [inside.clone(), boundary.clone(), outside.clone()]);

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();

    assert_eq!(report.total_reactions(), 1);
    assert_eq!(h.stored_totals("C1").await.unwrap().get("tada"), Some(&1));

    let ctx = h.context().unwrap();
    let channel = ChannelId::new("C1");
    for excluded in [&boundary, &outside] {
        let ts = MessageTs::parse(&excluded.ts).unwrap();
        assert!(ctx.message_repo().find(&channel, &ts).await.unwrap().is_none());
    }

    let history = h.slack.calls_to(Endpoint::ConversationsHistory);
    assert_eq!(history[0].param("oldest"), Some(boundary.ts.as_str()));
    assert_eq!(history[0].param("inclusive"), Some("false"));
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn test_channel_fatal_error_is_isolated() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();

    for channel in ["C1", "C2", "C3"] {
        h.slack.add_messages(
            channel,
            [MessageFixture::new(hours_ago(now, 1)).reaction("tada", 1)],
        );
    }
    h.slack.fail_channel("C2", "channel_not_found");

    let report = h.aggregate(&h.request(&["C1", "C2", "C3"])).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Partial);
    assert_eq!(report.outcome.exit_code(), 2);
    assert_eq!(report.count_where(ChannelResult::is_done), 2);
    assert_eq!(
        report.channel(&ChannelId::new("C2")).unwrap().result,
        ChannelResult::Failed {
            reason: "channel_not_found".to_string()
        }
    );

    for channel in ["C1", "C3"] {
        assert_eq!(h.progress(channel).await.unwrap().status, ProgressStatus::Completed);
        assert_eq!(h.stored_totals(channel).await.unwrap().get("tada"), Some(&1));
    }

    let failed = h.progress("C2").await.unwrap();
    assert_eq!(failed.status, ProgressStatus::Failed);
    assert_eq!(failed.failure_reason.as_deref(), Some("channel_not_found"));
    assert!(h.stored_totals("C2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_workspace_fatal_error_aborts_run() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();

    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(now, 1)).reaction("tada", 1)]);
    h.slack.fail_channel("C1", "invalid_auth");

    let mut request = h.request(&["C1"]);
    request.max_workers = 1;
    let report = h.aggregate(&request).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Aborted);
    assert_eq!(report.outcome.exit_code(), 1);
    assert!(report.abort_reason.is_some());

    let record = h.progress("C1").await.unwrap();
    assert_eq!(record.status, ProgressStatus::Failed);
    assert!(record
        .failure_reason
        .unwrap_or_default()
        .starts_with("run aborted"));
}

#[tokio::test]
async fn test_failed_channel_is_retried_by_next_run() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();

    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(now, 1)).reaction("tada", 2)]);
    h.slack.fail_channel("C1", "not_in_channel");

    let first = h.aggregate(&h.request(&["C1"])).await.unwrap();
    assert_eq!(first.outcome, RunOutcome::Partial);

    h.slack.clear_failure("C1");
    let second = h.aggregate(&h.request(&["C1"])).await.unwrap();
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(h.stored_totals("C1").await.unwrap().get("tada"), Some(&2));
}

// ============================================================================
// Scope preflight
// ============================================================================

#[tokio::test]
async fn test_missing_scopes_abort_before_ingestion() {
    let h = TestHarness::new().await.unwrap();
    h.slack.set_scopes(Some("channels:history,channels:read"));
    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(h.now(), 1)).reaction("tada", 1)]);

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Aborted);
    let reason = report.abort_reason.unwrap();
    assert!(reason.contains("groups:history"));
    assert!(reason.contains("reactions:read"));
    assert!(report.channels.is_empty());
    assert_eq!(h.slack.call_count(Endpoint::ConversationsHistory), 0);

    let ctx = h.context().unwrap();
    assert!(ctx
        .progress_ledger()
        .get_status(&ChannelId::new("C1"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_missing_scopes_tolerated_when_not_strict() {
    let h = TestHarness::new().await.unwrap();
    h.slack.set_scopes(Some("channels:history"));
    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(h.now(), 1)).reaction("tada", 1)]);

    let mut request = h.request(&["C1"]);
    request.strict_scopes = false;
    let report = h.aggregate(&request).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.total_reactions(), 1);
}

#[tokio::test]
async fn test_unreported_scopes_skip_check() {
    let h = TestHarness::new().await.unwrap();
    h.slack.set_scopes(None);

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
}

// ============================================================================
// Channel selection
// ============================================================================

#[tokio::test]
async fn test_default_channels_exclude_archived() {
    let h = TestHarness::new().await.unwrap();
    h.seed_channel("C1", "general", false).await.unwrap();
    h.seed_channel("C2", "old-project", true).await.unwrap();

    let report = h.aggregate(&h.request(&[])).await.unwrap();

    assert_eq!(report.channels.len(), 1);
    assert_eq!(report.channels[0].channel_id, ChannelId::new("C1"));
    assert!(h
        .slack
        .calls_to(Endpoint::ConversationsHistory)
        .iter()
        .all(|c| c.channel() == Some("C1")));
}

#[tokio::test]
async fn test_explicit_channels_are_deduplicated() {
    let h = TestHarness::new().await.unwrap();

    let report = h.aggregate(&h.request(&["C1", " C1", "C2"])).await.unwrap();

    assert_eq!(report.channels.len(), 2);
    assert_eq!(h.slack.call_count(Endpoint::ConversationsHistory), 2);
}

#[tokio::test]
async fn test_invalid_request_is_rejected() {
    let h = TestHarness::new().await.unwrap();
    let mut request = h.request(&["C1"]);
    request.window_days = 0;

    assert!(h.aggregate(&request).await.is_err());
    assert!(h.slack.calls().is_empty());
}

// ============================================================================
// Completed channels
// ============================================================================

#[tokio::test]
async fn test_completed_channel_is_skipped() {
    let h = TestHarness::new().await.unwrap();
    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(h.now(), 1)).reaction("tada", 3)]);

    h.aggregate(&h.request(&["C1"])).await.unwrap();
    h.slack.clear_calls();

    let report = h.aggregate(&h.request(&["C1"])).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(
        report.channel(&ChannelId::new("C1")).unwrap().result,
        ChannelResult::AlreadyCompleted
    );
    assert_eq!(report.total_reactions(), 0);
    assert_eq!(h.slack.call_count(Endpoint::ConversationsHistory), 0);
    assert_eq!(h.stored_totals("C1").await.unwrap().get("tada"), Some(&3));
}

#[tokio::test]
async fn test_force_rescan_restarts_completed_channel() {
    let h = TestHarness::new().await.unwrap();
    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(h.now(), 1)).reaction("tada", 3)]);

    h.aggregate(&h.request(&["C1"])).await.unwrap();

    let mut request = h.request(&["C1"]);
    request.force_rescan = true;
    let report = h.aggregate(&request).await.unwrap();

    assert_eq!(
        report.channel(&ChannelId::new("C1")).unwrap().result,
        ChannelResult::Completed
    );
    assert_eq!(report.total_reactions(), 3);

    let record = h.progress("C1").await.unwrap();
    assert_eq!(record.status, ProgressStatus::Completed);
    assert_eq!(record.reaction_count, 3);
}
