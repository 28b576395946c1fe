use crate::executor::{Executor, FeedSource};
use crate::platform::Platform;
use crate::profile::Profile;
use crate::store::EngagementStore;
use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cooldown after a failed cycle before trying again.
const ERROR_COOLDOWN_SECS: u64 = 60;
/// Lite mode stretches the polling interval: at least four times the
/// configured value and never under four hours.
const LITE_MULTIPLIER: u64 = 4;
const LITE_FLOOR_MINUTES: u64 = 240;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    pub cycle_interval_minutes: u64,
    pub timeline_batch: u32,
    pub mentions_batch: u32,
    pub retention_days: u32,
    pub lite_mode: bool,
}

/// Owns the top-level run/stop lifecycle: poll timeline, poll mentions,
/// sleep, repeat. One cycle runs to completion before the next begins.
pub struct Scheduler {
    store: Arc<dyn EngagementStore>,
    platform: Arc<dyn Platform>,
    executor: Executor,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn EngagementStore>,
        platform: Arc<dyn Platform>,
        executor: Executor,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            store,
            platform,
            executor,
            options,
        }
    }

    /// Main loop. A failing cycle is logged and followed by a short
    /// cooldown; the loop itself only ends when `cancel` fires, observed at
    /// cycle boundaries and during sleeps, never mid-item.
    pub async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        tracing::info!(
            interval_minutes = self.effective_interval_minutes(),
            lite = self.options.lite_mode,
            "starting engagement loop"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if let Err(error) = self.cycle().await {
                tracing::error!("cycle failed: {error:#}");
                if self
                    .sleep_or_cancel(Duration::from_secs(ERROR_COOLDOWN_SECS), &cancel)
                    .await
                {
                    break;
                }
                continue;
            }

            let interval = Duration::from_secs(self.effective_interval_minutes() * 60);
            if self.sleep_or_cancel(interval, &cancel).await {
                break;
            }
        }

        tracing::info!("engagement loop stopped");
        Ok(())
    }

    fn effective_interval_minutes(&self) -> u64 {
        let minutes = self.options.cycle_interval_minutes;
        if self.options.lite_mode {
            (minutes * LITE_MULTIPLIER).max(LITE_FLOOR_MINUTES)
        } else {
            minutes
        }
    }

    /// Returns true when cancelled.
    async fn sleep_or_cancel(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            () = cancel.cancelled() => true,
            () = tokio::time::sleep(duration) => false,
        }
    }

    async fn cycle(&self) -> anyhow::Result<()> {
        self.store.cleanup_older_than(self.options.retention_days)?;

        // Pick up a freshly re-analyzed profile without a restart.
        let profile = self.store.load_profile()?.unwrap_or_else(Profile::neutral);

        self.process_feed(FeedSource::Timeline, self.options.timeline_batch, &profile)
            .await;
        self.process_feed(FeedSource::Mentions, self.options.mentions_batch, &profile)
            .await;

        Ok(())
    }

    async fn process_feed(&self, source: FeedSource, limit: u32, profile: &Profile) {
        let fetched = match source {
            FeedSource::Timeline => self.platform.timeline(limit).await,
            FeedSource::Mentions => self.platform.mentions(limit).await,
        };

        let posts = match fetched {
            Ok(posts) => posts,
            Err(error) => {
                tracing::warn!(?source, "feed fetch failed: {error:#}");
                return;
            }
        };

        tracing::debug!(?source, count = posts.len(), "processing feed batch");
        for post in &posts {
            if let Err(error) = self.executor.process(post, source, profile).await {
                tracing::error!(post_id = %post.id, "item processing failed: {error:#}");
            }
        }
    }
}
