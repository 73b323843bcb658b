//! Status report and channel seeding tests
//!
//! Run with: cargo test -p integration-tests --test status_tests

use integration_tests::{hours_ago, MessageFixture, TestHarness};
use reaction_client::Endpoint;
use reaction_core::{ChannelId, ProgressStatus};
use reaction_service::{AddChannelRequest, ChannelService, StatusService};

#[tokio::test]
async fn test_status_splits_completed_and_pending() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();
    h.seed_channel("C1", "general", false).await.unwrap();
    h.seed_channel("C2", "random", false).await.unwrap();

    h.slack.add_messages(
        "C1",
        [
            MessageFixture::new(hours_ago(now, 1)).reaction("tada", 5),
            MessageFixture::new(hours_ago(now, 2)).reaction("partyparrot", 2),
        ],
    );
    h.slack.fail_channel("C2", "not_in_channel");

    h.aggregate(&h.request(&[])).await.unwrap();

    let ctx = h.context().unwrap();
    let status = StatusService::new(&ctx).report(10, false).await.unwrap();

    assert!(!status.is_empty());
    assert_eq!(status.completed.len(), 1);
    assert_eq!(status.completed[0].channel_id, ChannelId::new("C1"));
    assert_eq!(status.completed[0].name, "general");
    assert_eq!(status.completed[0].reaction_count, 7);
    assert_eq!(status.completed[0].message_count, 2);

    assert_eq!(status.in_progress.len(), 1);
    assert_eq!(status.in_progress[0].status, ProgressStatus::Failed);
    assert_eq!(
        status.in_progress[0].failure_reason.as_deref(),
        Some("not_in_channel")
    );

    assert_eq!(status.total_reactions(), 7);
    assert_eq!(status.top_emojis[0].emoji, "tada");
    assert_eq!(status.top_emojis[0].count, 5);
    assert!(status.top_emojis.iter().all(|e| e.custom.is_none()));
    assert_eq!(h.slack.call_count(Endpoint::EmojiList), 0);
}

#[tokio::test]
async fn test_status_flags_custom_emoji() {
    let h = TestHarness::new().await.unwrap();
    h.slack.add_messages(
        "C1",
        [MessageFixture::new(hours_ago(h.now(), 1))
            .reaction("partyparrot", 3)
            .reaction("tada", 1)],
    );
    h.slack.add_custom_emoji("partyparrot", "https://emoji.example/partyparrot.gif");
    h.slack.add_custom_emoji("parrot", "alias:partyparrot");

    h.aggregate(&h.request(&["C1"])).await.unwrap();

    let ctx = h.context().unwrap();
    let status = StatusService::new(&ctx).report(10, true).await.unwrap();

    let flags: Vec<(&str, Option<bool>)> = status
        .top_emojis
        .iter()
        .map(|e| (e.emoji.as_str(), e.custom))
        .collect();
    assert_eq!(flags, vec![("partyparrot", Some(true)), ("tada", Some(false))]);

    // channels never seeded show the placeholder name
    assert_eq!(status.completed[0].name, "Unknown");
}

#[tokio::test]
async fn test_status_survives_emoji_list_failure() {
    let h = TestHarness::new().await.unwrap();
    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(h.now(), 1)).reaction("tada", 1)]);
    h.aggregate(&h.request(&["C1"])).await.unwrap();

    h.slack.push_response(
        Endpoint::EmojiList,
        reaction_client::RawResponse::ok(integration_tests::error_body("missing_scope")),
    );

    let ctx = h.context().unwrap();
    let status = StatusService::new(&ctx).report(10, true).await.unwrap();
    assert_eq!(status.top_emojis.len(), 1);
    assert_eq!(status.top_emojis[0].custom, None);
}

#[tokio::test]
async fn test_status_empty_store() {
    let h = TestHarness::new().await.unwrap();
    let ctx = h.context().unwrap();

    let status = StatusService::new(&ctx).report(10, false).await.unwrap();
    assert!(status.is_empty());
    assert!(status.top_emojis.is_empty());
}

#[tokio::test]
async fn test_channel_emojis_scoped_to_channel() {
    let h = TestHarness::new().await.unwrap();
    let now = h.now();
    h.slack
        .add_messages("C1", [MessageFixture::new(hours_ago(now, 1)).reaction("tada", 4)]);
    h.slack
        .add_messages("C2", [MessageFixture::new(hours_ago(now, 1)).reaction("eyes", 9)]);
    h.aggregate(&h.request(&["C1", "C2"])).await.unwrap();

    let ctx = h.context().unwrap();
    let emojis = StatusService::new(&ctx)
        .channel_emojis(&ChannelId::new("C1"), 5)
        .await
        .unwrap();
    assert_eq!(emojis.len(), 1);
    assert_eq!(emojis[0].emoji, "tada");
    assert_eq!(emojis[0].count, 4);
}

#[tokio::test]
async fn test_add_and_list_channels() {
    let h = TestHarness::new().await.unwrap();
    let ctx = h.context().unwrap();
    let service = ChannelService::new(&ctx);

    let request = AddChannelRequest {
        id: "C9".to_string(),
        name: "secret-plans".to_string(),
        private: true,
        archived: false,
    };
    let channel = service.add_channel(&request).await.unwrap();
    assert!(channel.visibility.is_private());

    let listed = service.list_channels().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "secret-plans");

    let invalid = AddChannelRequest {
        id: String::new(),
        ..request
    };
    assert!(service.add_channel(&invalid).await.is_err());
}
