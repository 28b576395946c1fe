use crate::engine::Decision;
use crate::llm::Completion;
use crate::platform::Post;
use crate::profile::Profile;
use std::sync::Arc;

/// Platform character ceiling for a single post.
const MAX_REPLY_CHARS: usize = 280;
const TRUNCATED_CHARS: usize = 277;
const ELLIPSIS: &str = "...";

const HUMOR_THRESHOLD: f64 = 0.7;
const CASUAL_THRESHOLD: f64 = 0.3;

const SYSTEM_PROMPT: &str =
    "You are a helpful and engaging social media user. Generate natural responses.";

/// Builds reply text in the account's learned voice.
pub struct Composer {
    llm: Arc<dyn Completion>,
    temperature: f64,
    max_tokens: u32,
}

impl Composer {
    pub fn new(llm: Arc<dyn Completion>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            llm,
            temperature,
            max_tokens,
        }
    }

    /// Generate a reply to `post`. Failure is reported to the caller, which
    /// skips the reply for that item; it is never fatal to the pipeline.
    pub async fn generate_reply(
        &self,
        post: &Post,
        decision: &Decision,
        profile: &Profile,
    ) -> anyhow::Result<String> {
        let prompt = build_prompt(post, decision, profile);

        let raw = self
            .llm
            .complete(Some(SYSTEM_PROMPT), &prompt, self.temperature, self.max_tokens)
            .await?;

        let reply = truncate_to_limit(raw.trim());
        tracing::debug!(post_id = %post.id, chars = reply.chars().count(), "generated reply");
        Ok(reply)
    }
}

fn style_directive(profile: &Profile) -> String {
    let mut directive = String::new();
    if profile.humor_level.score > HUMOR_THRESHOLD {
        directive.push_str("Be humorous and witty. ");
    }
    if profile.formality.score < CASUAL_THRESHOLD {
        directive.push_str("Be casual and informal. ");
    } else {
        directive.push_str("Be professional but friendly. ");
    }
    directive
}

fn build_prompt(post: &Post, decision: &Decision, profile: &Profile) -> String {
    let context = if decision.reasoning.is_empty() {
        "General response"
    } else {
        decision.reasoning.trim_end()
    };

    format!(
        "{style}\n\nRespond to this post: \"{text}\"\n\nAuthor: @{author}\nContext: {context}\n\nGenerate a helpful, engaging reply that fits the user's personality. Keep it under {MAX_REPLY_CHARS} characters.",
        style = style_directive(profile).trim_end(),
        text = post.text,
        author = post.author.username,
    )
}

/// Enforce the platform ceiling: anything longer than 280 characters is cut
/// to 277 plus an ellipsis marker.
fn truncate_to_limit(text: &str) -> String {
    if text.chars().count() <= MAX_REPLY_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(TRUNCATED_CHARS).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
