use crate::composer::Composer;
use crate::config::RateLimitConfig;
use crate::engine::{self, Decision};
use crate::platform::{Platform, Post};
use crate::profile::Profile;
use crate::store::{EngagementStore, InteractionKind};
use chrono::Duration;
use std::sync::Arc;

/// Which feed a post came from. Mentions get the unconditional courtesy
/// decision instead of the keyword rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Timeline,
    Mentions,
}

/// Drives one post through the full decision-and-execution state machine:
/// dedup check, evaluation, per-action rate limiting, text generation,
/// the external call, ledger write, and the processed marker.
pub struct Executor {
    store: Arc<dyn EngagementStore>,
    platform: Arc<dyn Platform>,
    composer: Composer,
    limits: RateLimitConfig,
    dry_run: bool,
}

impl Executor {
    pub fn new(
        store: Arc<dyn EngagementStore>,
        platform: Arc<dyn Platform>,
        composer: Composer,
        limits: RateLimitConfig,
        dry_run: bool,
    ) -> Self {
        Self {
            store,
            platform,
            composer,
            limits,
            dry_run,
        }
    }

    /// Handle one post end to end. The processed marker is written exactly
    /// once, after every flagged action has been attempted, even if some of
    /// them failed. Re-fetching is idempotent for likes and reposts (the
    /// platform de-duplicates) and replies are best-effort, so a permanently
    /// failing item must not become a retry storm.
    pub async fn process(
        &self,
        post: &Post,
        source: FeedSource,
        profile: &Profile,
    ) -> anyhow::Result<()> {
        if self.store.is_processed(&post.id)? {
            tracing::debug!(post_id = %post.id, "already processed, skipping");
            return Ok(());
        }

        let decision = match source {
            FeedSource::Timeline => engine::evaluate(post, profile),
            FeedSource::Mentions => engine::evaluate_mention(post),
        };

        if decision.is_actionable() {
            if decision.should_like {
                self.attempt_like(post, &decision).await;
            }
            if decision.should_reply {
                self.attempt_reply(post, &decision, profile).await;
            }
            if decision.should_repost {
                self.attempt_repost(post, &decision).await;
            }
        }

        // Terminal, regardless of individual action outcomes.
        self.store.mark_processed(&post.id)?;
        Ok(())
    }

    fn within_limit(&self, kind: InteractionKind) -> bool {
        let ceiling = match kind {
            InteractionKind::Like => self.limits.likes_per_hour,
            InteractionKind::Reply => self.limits.replies_per_hour,
            InteractionKind::Repost => self.limits.reposts_per_hour,
        };

        match self.store.count_recent(kind, Duration::hours(1)) {
            Ok(count) if count < ceiling => true,
            Ok(count) => {
                tracing::info!(
                    kind = kind.as_str(),
                    count,
                    ceiling,
                    "hourly rate limit reached, skipping action"
                );
                false
            }
            Err(error) => {
                // Fail closed: an unreadable counter must not let actions through.
                tracing::warn!(kind = kind.as_str(), "rate limit check failed: {error:#}");
                false
            }
        }
    }

    async fn attempt_like(&self, post: &Post, decision: &Decision) {
        if !self.within_limit(InteractionKind::Like) {
            return;
        }

        if self.dry_run {
            tracing::info!(
                post_id = %post.id,
                author = %post.author.username,
                "[dry-run] would like post: {}",
                preview(&post.text)
            );
            return;
        }

        let success = match self.platform.like(&post.id).await {
            Ok(success) => success,
            Err(error) => {
                tracing::error!(post_id = %post.id, "like failed: {error:#}");
                false
            }
        };

        if success {
            tracing::info!(post_id = %post.id, author = %post.author.username, "liked post");
        }
        self.record(InteractionKind::Like, post, &decision.reasoning, None, success);
    }

    async fn attempt_reply(&self, post: &Post, decision: &Decision, profile: &Profile) {
        if !self.within_limit(InteractionKind::Reply) {
            return;
        }

        let reply_text = match self.composer.generate_reply(post, decision, profile).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(post_id = %post.id, "reply generation failed, skipping reply: {error:#}");
                return;
            }
        };

        if self.dry_run {
            tracing::info!(
                post_id = %post.id,
                author = %post.author.username,
                "[dry-run] would reply: {reply_text}"
            );
            return;
        }

        let success = match self.platform.reply(&post.id, &reply_text).await {
            Ok(success) => success,
            Err(error) => {
                tracing::error!(post_id = %post.id, "reply failed: {error:#}");
                false
            }
        };

        if success {
            tracing::info!(post_id = %post.id, author = %post.author.username, "replied to post");
        }
        self.record(
            InteractionKind::Reply,
            post,
            &decision.reasoning,
            Some(&reply_text),
            success,
        );
    }

    async fn attempt_repost(&self, post: &Post, decision: &Decision) {
        if !self.within_limit(InteractionKind::Repost) {
            return;
        }

        if self.dry_run {
            tracing::info!(
                post_id = %post.id,
                author = %post.author.username,
                "[dry-run] would repost: {}",
                preview(&post.text)
            );
            return;
        }

        let success = match self.platform.repost(&post.id).await {
            Ok(success) => success,
            Err(error) => {
                tracing::error!(post_id = %post.id, "repost failed: {error:#}");
                false
            }
        };

        if success {
            tracing::info!(post_id = %post.id, author = %post.author.username, "reposted post");
        }
        self.record(InteractionKind::Repost, post, &decision.reasoning, None, success);
    }

    fn record(
        &self,
        kind: InteractionKind,
        post: &Post,
        reasoning: &str,
        response_text: Option<&str>,
        success: bool,
    ) {
        if let Err(error) =
            self.store
                .log_interaction(kind, &post.id, reasoning, response_text, success)
        {
            tracing::error!(post_id = %post.id, kind = kind.as_str(), "ledger write failed: {error:#}");
        }
    }
}

fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 50;
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let mut shortened: String = text.chars().take(PREVIEW_CHARS).collect();
        shortened.push_str("...");
        shortened
    }
}
