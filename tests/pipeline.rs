//! End-to-end pipeline tests: a fake platform and a canned completion model
//! wired into the real executor and store.

use async_trait::async_trait;
use chrono::Utc;
use mimus::composer::Composer;
use mimus::config::RateLimitConfig;
use mimus::executor::{Executor, FeedSource};
use mimus::llm::Completion;
use mimus::platform::{Author, Metrics, Platform, Post};
use mimus::profile::Profile;
use mimus::store::{EngagementStore, InteractionKind, SqliteStore};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

#[derive(Default)]
struct FakePlatform {
    likes: AtomicU32,
    replies: AtomicU32,
    reposts: AtomicU32,
    fail_actions: bool,
}

impl FakePlatform {
    fn failing() -> Self {
        Self {
            fail_actions: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn verify_credentials(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn timeline(&self, _limit: u32) -> anyhow::Result<Vec<Post>> {
        Ok(Vec::new())
    }

    async fn mentions(&self, _limit: u32) -> anyhow::Result<Vec<Post>> {
        Ok(Vec::new())
    }

    async fn account(&self, _username: &str) -> anyhow::Result<Option<Author>> {
        Ok(None)
    }

    async fn user_posts(&self, _username: &str, _limit: u32) -> anyhow::Result<Vec<Post>> {
        Ok(Vec::new())
    }

    async fn user_likes(&self, _user_id: &str, _limit: u32) -> anyhow::Result<Vec<Post>> {
        Ok(Vec::new())
    }

    async fn like(&self, _post_id: &str) -> anyhow::Result<bool> {
        self.likes.fetch_add(1, Ordering::SeqCst);
        Ok(!self.fail_actions)
    }

    async fn repost(&self, _post_id: &str) -> anyhow::Result<bool> {
        self.reposts.fetch_add(1, Ordering::SeqCst);
        Ok(!self.fail_actions)
    }

    async fn reply(&self, _post_id: &str, _text: &str) -> anyhow::Result<bool> {
        self.replies.fetch_add(1, Ordering::SeqCst);
        Ok(!self.fail_actions)
    }
}

struct CannedCompletion;

#[async_trait]
impl Completion for CannedCompletion {
    async fn complete(
        &self,
        _system_prompt: Option<&str>,
        _user_prompt: &str,
        _temperature: f64,
        _max_tokens: u32,
    ) -> anyhow::Result<String> {
        Ok("Thanks for the mention!".to_string())
    }
}

struct Harness {
    _db_file: NamedTempFile,
    store: Arc<SqliteStore>,
    platform: Arc<FakePlatform>,
    executor: Executor,
}

fn harness(platform: FakePlatform, limits: RateLimitConfig, dry_run: bool) -> Harness {
    let db_file = NamedTempFile::new().unwrap();
    let store = Arc::new(SqliteStore::new(db_file.path()).unwrap());
    let platform = Arc::new(platform);
    let composer = Composer::new(Arc::new(CannedCompletion), 0.7, 280);
    let executor = Executor::new(
        Arc::clone(&store) as Arc<dyn EngagementStore>,
        Arc::clone(&platform) as Arc<dyn Platform>,
        composer,
        limits,
        dry_run,
    );
    Harness {
        _db_file: db_file,
        store,
        platform,
        executor,
    }
}

fn author(username: &str) -> Author {
    Author {
        id: format!("id-{username}"),
        username: username.into(),
        name: username.into(),
        bio: None,
        followers_count: None,
    }
}

fn post(id: &str, text: &str) -> Post {
    Post {
        id: id.into(),
        text: text.into(),
        author: author("alice"),
        created_at: Utc::now(),
        metrics: None,
    }
}

fn likeable_post(id: &str) -> Post {
    post(id, "this is awesome work")
}

fn limits() -> RateLimitConfig {
    RateLimitConfig::default()
}

#[tokio::test]
async fn likeable_timeline_post_is_liked_logged_and_marked() {
    let h = harness(FakePlatform::default(), limits(), false);
    let item = likeable_post("p1");

    h.executor
        .process(&item, FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 1);
    assert!(h.store.is_processed("p1").unwrap());

    let records = h
        .store
        .recent_interactions(chrono::Duration::hours(1))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, InteractionKind::Like);
    assert!(records[0].success);
}

#[tokio::test]
async fn processed_post_is_skipped_entirely() {
    let h = harness(FakePlatform::default(), limits(), false);
    let item = likeable_post("p1");
    h.store.mark_processed("p1").unwrap();

    h.executor
        .process(&item, FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 0);
    assert!(h
        .store
        .recent_interactions(chrono::Duration::hours(1))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn reprocessing_same_post_takes_no_second_action() {
    let h = harness(FakePlatform::default(), limits(), false);
    let item = likeable_post("p1");

    for _ in 0..2 {
        h.executor
            .process(&item, FeedSource::Timeline, &Profile::default())
            .await
            .unwrap();
    }

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn like_ceiling_stops_further_likes() {
    let h = harness(
        FakePlatform::default(),
        RateLimitConfig {
            likes_per_hour: 1,
            ..limits()
        },
        false,
    );

    h.executor
        .process(&likeable_post("p1"), FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();
    h.executor
        .process(&likeable_post("p2"), FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 1);
    // The throttled post is still marked processed.
    assert!(h.store.is_processed("p2").unwrap());
}

#[tokio::test]
async fn ceilings_are_tracked_per_action_kind() {
    let h = harness(
        FakePlatform::default(),
        RateLimitConfig {
            likes_per_hour: 0,
            ..limits()
        },
        false,
    );

    // A mention wants both a reply and a like; only the like is throttled.
    h.executor
        .process(&post("m1", "@mimus_bot hello"), FeedSource::Mentions, &Profile::default())
        .await
        .unwrap();

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 0);
    assert_eq!(h.platform.replies.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dry_run_takes_no_action_and_writes_no_ledger_row() {
    let h = harness(FakePlatform::default(), limits(), true);
    let item = likeable_post("p1");

    h.executor
        .process(&item, FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 0);
    assert!(h
        .store
        .recent_interactions(chrono::Duration::hours(1))
        .unwrap()
        .is_empty());
    // Still marked, so flipping dry-run off later does not replay history.
    assert!(h.store.is_processed("p1").unwrap());
}

#[tokio::test]
async fn mention_gets_reply_and_like() {
    let h = harness(FakePlatform::default(), limits(), false);

    h.executor
        .process(
            &post("m1", "@mimus_bot what do you think?"),
            FeedSource::Mentions,
            &Profile::default(),
        )
        .await
        .unwrap();

    assert_eq!(h.platform.replies.load(Ordering::SeqCst), 1);
    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 1);
    assert_eq!(h.platform.reposts.load(Ordering::SeqCst), 0);

    let records = h
        .store
        .recent_interactions(chrono::Duration::hours(1))
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.reasoning.contains("Responding to mention")));
}

#[tokio::test]
async fn rejected_action_is_logged_failed_and_post_still_marked() {
    let h = harness(FakePlatform::failing(), limits(), false);
    let item = likeable_post("p1");

    h.executor
        .process(&item, FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();

    assert!(h.store.is_processed("p1").unwrap());
    let records = h
        .store
        .recent_interactions(chrono::Duration::hours(1))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
}

#[tokio::test]
async fn failed_attempts_count_against_the_ceiling() {
    let h = harness(
        FakePlatform::failing(),
        RateLimitConfig {
            likes_per_hour: 1,
            ..limits()
        },
        false,
    );

    h.executor
        .process(&likeable_post("p1"), FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();
    h.executor
        .process(&likeable_post("p2"), FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unremarkable_post_is_marked_without_any_action() {
    let h = harness(FakePlatform::default(), limits(), false);
    let item = Post {
        metrics: Some(Metrics {
            like_count: 2,
            repost_count: 0,
            reply_count: 0,
        }),
        ..post("p1", "nothing special here")
    };

    h.executor
        .process(&item, FeedSource::Timeline, &Profile::default())
        .await
        .unwrap();

    assert_eq!(h.platform.likes.load(Ordering::SeqCst), 0);
    assert_eq!(h.platform.replies.load(Ordering::SeqCst), 0);
    assert_eq!(h.platform.reposts.load(Ordering::SeqCst), 0);
    assert!(h.store.is_processed("p1").unwrap());
}

#[tokio::test]
async fn question_post_draws_a_reply() {
    let h = harness(FakePlatform::default(), limits(), false);

    h.executor
        .process(
            &post("p1", "does anyone understand borrow checking?"),
            FeedSource::Timeline,
            &Profile::default(),
        )
        .await
        .unwrap();

    assert_eq!(h.platform.replies.load(Ordering::SeqCst), 1);
    let records = h
        .store
        .recent_interactions(chrono::Duration::hours(1))
        .unwrap();
    let reply = records
        .iter()
        .find(|r| r.kind == InteractionKind::Reply)
        .unwrap();
    assert_eq!(reply.response_text.as_deref(), Some("Thanks for the mention!"));
}
