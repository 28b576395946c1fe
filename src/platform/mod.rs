use crate::error::PlatformError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod http;

pub use http::HttpPlatform;

// ── Content types ─────────────────────────────────────────────────

/// Author of a fetched post. Follower count and bio are optional; most
/// feed payloads omit them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub followers_count: Option<u64>,
}

/// Engagement counters attached to a post. Absent on some feed payloads;
/// evaluation must tolerate that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub like_count: u64,
    pub repost_count: u64,
    pub reply_count: u64,
}

/// A single post or mention fetched from the platform. Immutable once
/// fetched; never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub metrics: Option<Metrics>,
}

// ── Platform capability ───────────────────────────────────────────

/// Consumed contract of the social platform. Action calls return
/// `Ok(false)` on a rejected request and `Err` on transport failure;
/// the executor treats both as a failed attempt.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn verify_credentials(&self) -> anyhow::Result<bool>;

    async fn timeline(&self, limit: u32) -> anyhow::Result<Vec<Post>>;

    async fn mentions(&self, limit: u32) -> anyhow::Result<Vec<Post>>;

    async fn account(&self, username: &str) -> anyhow::Result<Option<Author>>;

    async fn user_posts(&self, username: &str, limit: u32) -> anyhow::Result<Vec<Post>>;

    async fn user_likes(&self, user_id: &str, limit: u32) -> anyhow::Result<Vec<Post>>;

    async fn like(&self, post_id: &str) -> anyhow::Result<bool>;

    async fn repost(&self, post_id: &str) -> anyhow::Result<bool>;

    async fn reply(&self, post_id: &str, text: &str) -> anyhow::Result<bool>;
}

/// Build the structured error for a non-2xx platform response.
pub(crate) async fn api_error(endpoint: &str, response: reqwest::Response) -> PlatformError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    PlatformError::Request {
        endpoint: endpoint.to_string(),
        message,
    }
}
