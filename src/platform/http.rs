use super::{api_error, Author, Metrics, Platform, Post};
use crate::error::PlatformError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// REST client for the platform API.
pub struct HttpPlatform {
    base_url: String,
    /// Pre-computed `"Bearer <token>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    client: Client,
}

// ── Wire types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PostPayload {
    id: String,
    text: String,
    author: AuthorPayload,
    created_at: DateTime<Utc>,
    #[serde(default)]
    metrics: Option<MetricsPayload>,
}

#[derive(Debug, Deserialize)]
struct AuthorPayload {
    id: String,
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    followers_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MetricsPayload {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    repost_count: u64,
    #[serde(default)]
    reply_count: u64,
}

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    username: String,
}

impl From<PostPayload> for Post {
    fn from(payload: PostPayload) -> Self {
        Post {
            id: payload.id,
            text: payload.text,
            author: payload.author.into(),
            created_at: payload.created_at,
            metrics: payload.metrics.map(|m| Metrics {
                like_count: m.like_count,
                repost_count: m.repost_count,
                reply_count: m.reply_count,
            }),
        }
    }
}

impl From<AuthorPayload> for Author {
    fn from(payload: AuthorPayload) -> Self {
        Author {
            id: payload.id,
            username: payload.username,
            name: payload.name,
            bio: payload.bio,
            followers_count: payload.followers_count,
        }
    }
}

impl HttpPlatform {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cached_auth_header: token.map(|t| format!("Bearer {t}")),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn auth_header(&self) -> Result<&str, PlatformError> {
        self.cached_auth_header
            .as_deref()
            .ok_or(PlatformError::MissingToken)
    }

    async fn fetch_posts(&self, endpoint: &str, limit: u32) -> anyhow::Result<Vec<Post>> {
        let auth_header = self.auth_header()?;
        let url = format!("{}{endpoint}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth_header)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|error| PlatformError::Request {
                endpoint: endpoint.to_string(),
                message: error.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(api_error(endpoint, response).await.into());
        }

        let payloads: Vec<PostPayload> = response
            .json()
            .await
            .map_err(|error| PlatformError::Decode(error.to_string()))?;
        Ok(payloads.into_iter().map(Post::from).collect())
    }

    /// POST an action endpoint. A rejected request (non-2xx) is reported as
    /// `Ok(false)` so a single denied action does not abort the batch.
    async fn post_action(&self, endpoint: &str, body: Option<&ReplyRequest<'_>>) -> anyhow::Result<bool> {
        let auth_header = self.auth_header()?;
        let url = format!("{}{endpoint}", self.base_url);

        let mut request = self.client.post(&url).header("Authorization", auth_header);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|error| PlatformError::Request {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        })?;

        if response.status().is_success() {
            Ok(true)
        } else {
            tracing::warn!(
                endpoint,
                status = %response.status(),
                "platform rejected action"
            );
            Ok(false)
        }
    }
}

#[async_trait]
impl Platform for HttpPlatform {
    async fn verify_credentials(&self) -> anyhow::Result<bool> {
        let auth_header = self.auth_header()?;
        let url = format!("{}/api/v1/accounts/verify", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth_header)
            .send()
            .await
            .map_err(|error| PlatformError::Request {
                endpoint: "/api/v1/accounts/verify".to_string(),
                message: error.to_string(),
            })?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|error| PlatformError::Decode(error.to_string()))?;
        tracing::info!(username = %verified.username, "verified platform credentials");
        Ok(true)
    }

    async fn timeline(&self, limit: u32) -> anyhow::Result<Vec<Post>> {
        self.fetch_posts("/api/v1/timeline", limit).await
    }

    async fn mentions(&self, limit: u32) -> anyhow::Result<Vec<Post>> {
        self.fetch_posts("/api/v1/mentions", limit).await
    }

    async fn account(&self, username: &str) -> anyhow::Result<Option<Author>> {
        let auth_header = self.auth_header()?;
        let url = format!("{}/api/v1/accounts/{username}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth_header)
            .send()
            .await
            .map_err(|error| PlatformError::Request {
                endpoint: "/api/v1/accounts".to_string(),
                message: error.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error("/api/v1/accounts", response).await.into());
        }

        let payload: AuthorPayload = response
            .json()
            .await
            .map_err(|error| PlatformError::Decode(error.to_string()))?;
        Ok(Some(payload.into()))
    }

    async fn user_posts(&self, username: &str, limit: u32) -> anyhow::Result<Vec<Post>> {
        self.fetch_posts(&format!("/api/v1/accounts/{username}/posts"), limit)
            .await
    }

    async fn user_likes(&self, user_id: &str, limit: u32) -> anyhow::Result<Vec<Post>> {
        self.fetch_posts(&format!("/api/v1/accounts/{user_id}/likes"), limit)
            .await
    }

    async fn like(&self, post_id: &str) -> anyhow::Result<bool> {
        self.post_action(&format!("/api/v1/posts/{post_id}/like"), None)
            .await
    }

    async fn repost(&self, post_id: &str) -> anyhow::Result<bool> {
        self.post_action(&format!("/api/v1/posts/{post_id}/repost"), None)
            .await
    }

    async fn reply(&self, post_id: &str, text: &str) -> anyhow::Result<bool> {
        self.post_action(
            &format!("/api/v1/posts/{post_id}/reply"),
            Some(&ReplyRequest { text }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_post_json() -> serde_json::Value {
        serde_json::json!([{
            "id": "101",
            "text": "why does this always break?",
            "author": {
                "id": "u1",
                "username": "alice",
                "name": "Alice",
                "followers_count": 120
            },
            "created_at": "2026-08-01T12:00:00Z",
            "metrics": { "like_count": 50, "repost_count": 10, "reply_count": 3 }
        }])
    }

    #[test]
    fn creates_with_token() {
        let platform = HttpPlatform::new("https://api.example.com/", Some("tok"));
        assert_eq!(platform.base_url, "https://api.example.com");
        assert_eq!(
            platform.cached_auth_header.as_deref(),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn timeline_fails_without_token() {
        let platform = HttpPlatform::new("https://api.example.com", None);
        let error = platform.timeline(10).await.unwrap_err();
        assert!(error.to_string().contains("token not set"));
        assert!(matches!(
            error.downcast_ref::<PlatformError>(),
            Some(PlatformError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn bad_payload_surfaces_as_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/timeline"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("tok"));
        let error = platform.timeline(10).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<PlatformError>(),
            Some(PlatformError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn server_error_surfaces_endpoint_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/timeline"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("tok"));
        let error = platform.timeline(10).await.unwrap_err();
        match error.downcast_ref::<PlatformError>() {
            Some(PlatformError::Request { endpoint, message }) => {
                assert_eq!(endpoint, "/api/v1/timeline");
                assert!(message.contains("503"));
            }
            other => panic!("expected request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeline_parses_posts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/timeline"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_post_json()))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("tok"));
        let posts = platform.timeline(10).await.unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "101");
        assert_eq!(posts[0].author.username, "alice");
        assert_eq!(posts[0].metrics.unwrap().like_count, 50);
    }

    #[tokio::test]
    async fn missing_metrics_parse_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/mentions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": "7",
                "text": "@mimus_bot hi",
                "author": { "id": "u2", "username": "bob" },
                "created_at": "2026-08-01T12:00:00Z"
            }])))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("tok"));
        let posts = platform.mentions(10).await.unwrap();
        assert!(posts[0].metrics.is_none());
    }

    #[tokio::test]
    async fn like_returns_true_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/posts/101/like"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("tok"));
        assert!(platform.like("101").await.unwrap());
    }

    #[tokio::test]
    async fn rejected_action_returns_false_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/posts/101/repost"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("tok"));
        assert!(!platform.repost("101").await.unwrap());
    }

    #[tokio::test]
    async fn verify_credentials_false_on_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/verify"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("bad"));
        assert!(!platform.verify_credentials().await.unwrap());
    }

    #[tokio::test]
    async fn account_lookup_returns_none_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let platform = HttpPlatform::new(&server.uri(), Some("tok"));
        assert!(platform.account("ghost").await.unwrap().is_none());
    }
}
