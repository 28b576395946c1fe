use crate::platform::{Author, Platform, Post};
use crate::store::{CorpusEntry, CorpusKind, EngagementStore};
use std::sync::Arc;

/// Gathers the account's own activity into the corpus used for personality
/// analysis: its posts, plus the posts it has liked (at half the volume).
pub struct Collector {
    platform: Arc<dyn Platform>,
    store: Arc<dyn EngagementStore>,
    corpus_posts: u32,
}

impl Collector {
    pub fn new(
        platform: Arc<dyn Platform>,
        store: Arc<dyn EngagementStore>,
        corpus_posts: u32,
    ) -> Self {
        Self {
            platform,
            store,
            corpus_posts,
        }
    }

    /// Fetch and persist the analysis corpus for `account`. Returns the
    /// number of rows saved.
    pub async fn collect(&self, account: &Author) -> anyhow::Result<usize> {
        tracing::info!(username = %account.username, "collecting corpus");

        let posts = self
            .platform
            .user_posts(&account.username, self.corpus_posts)
            .await?;
        let likes = self
            .platform
            .user_likes(&account.id, self.corpus_posts / 2)
            .await?;

        let mut entries: Vec<CorpusEntry> =
            Vec::with_capacity(posts.len() + likes.len());
        entries.extend(posts.iter().map(|post| to_entry(post, CorpusKind::Post)));
        entries.extend(likes.iter().map(|post| to_entry(post, CorpusKind::Like)));

        if entries.is_empty() {
            tracing::warn!(username = %account.username, "no activity found to collect");
            return Ok(0);
        }

        self.store.save_corpus(&entries)?;
        tracing::info!(
            posts = posts.len(),
            likes = likes.len(),
            "corpus collection complete"
        );
        Ok(entries.len())
    }
}

fn to_entry(post: &Post, kind: CorpusKind) -> CorpusEntry {
    let metrics = post.metrics.map(|m| {
        serde_json::json!({
            "like_count": m.like_count,
            "repost_count": m.repost_count,
            "reply_count": m.reply_count,
        })
    });

    CorpusEntry {
        post_id: post.id.clone(),
        content: post.text.clone(),
        kind,
        timestamp: post.created_at,
        metadata: serde_json::json!({
            "author": post.author.username,
            "metrics": metrics,
        }),
    }
}
