use crate::platform::Post;
use crate::profile::Profile;

// Rule weights and thresholds are product policy, not incidental detail.
// Keep the literals here, in one place.

const REPLY_WEIGHT: f64 = 0.3;
const LIKE_WEIGHT: f64 = 0.2;
const REPOST_WEIGHT: f64 = 0.4;
const MENTION_CONFIDENCE: f64 = 0.9;

const HUMOR_THRESHOLD: f64 = 0.7;
const TECHNICAL_THRESHOLD: f64 = 0.6;

const HUMOR_KEYWORDS: [&str; 4] = ["funny", "lol", "joke", "humor"];
const TECHNICAL_KEYWORDS: [&str; 4] = ["tech", "programming", "code", "software"];
const POSITIVE_KEYWORDS: [&str; 7] = [
    "thank",
    "awesome",
    "great",
    "excellent",
    "amazing",
    "love",
    "brilliant",
];
const VALUABLE_KEYWORDS: [&str; 6] = [
    "tutorial",
    "guide",
    "tip",
    "resource",
    "useful",
    "important",
];

// "Moderately popular, not viral" band: worth amplifying without piling
// onto already-saturated posts.
const LIKE_COUNT_MIN: u64 = 10;
const LIKE_COUNT_MAX: u64 = 1000;
const REPOST_COUNT_MIN: u64 = 5;

const INFLUENCE_FOLLOWERS: u64 = 10_000;

// Reshare-chain markers: never amplify something that is itself a reshare.
const RESHARE_PREFIX: &str = "rt @";
const ATTRIBUTION_MARKER: &str = "via @";

/// Outcome of evaluating one post. The flags are independent; `confidence`
/// is a sum of rule weights, not a probability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decision {
    pub should_like: bool,
    pub should_reply: bool,
    pub should_repost: bool,
    pub reasoning: String,
    pub confidence: f64,
}

impl Decision {
    pub fn is_actionable(&self) -> bool {
        self.should_like || self.should_reply || self.should_repost
    }
}

/// Rule-based eligibility check for a timeline post. Pure and deterministic:
/// no I/O, and missing optional fields read as "rule does not fire".
pub fn evaluate(post: &Post, profile: &Profile) -> Decision {
    let mut decision = Decision::default();
    let text = post.text.to_lowercase();

    if meets_reply_criteria(post, &text, profile) {
        decision.should_reply = true;
        decision.reasoning.push_str("Fits reply criteria. ");
        decision.confidence += REPLY_WEIGHT;
    }

    if meets_like_criteria(post, &text) {
        decision.should_like = true;
        decision.reasoning.push_str("Meets like criteria. ");
        decision.confidence += LIKE_WEIGHT;
    }

    if meets_repost_criteria(post, &text) {
        decision.should_repost = true;
        decision.reasoning.push_str("Meets repost criteria. ");
        decision.confidence += REPOST_WEIGHT;
    }

    tracing::debug!(
        post_id = %post.id,
        reply = decision.should_reply,
        like = decision.should_like,
        repost = decision.should_repost,
        confidence = decision.confidence,
        "evaluated post"
    );
    decision
}

/// Mentions bypass the keyword rules: they are courtesy-answered and liked
/// unconditionally.
pub fn evaluate_mention(post: &Post) -> Decision {
    let decision = Decision {
        should_reply: true,
        should_like: true,
        should_repost: false,
        reasoning: "Responding to mention and liking mention".to_string(),
        confidence: MENTION_CONFIDENCE,
    };
    tracing::debug!(post_id = %post.id, "mention always gets a reply");
    decision
}

fn meets_reply_criteria(post: &Post, text: &str, profile: &Profile) -> bool {
    // Questions always qualify.
    if post.text.contains('?') {
        return true;
    }

    if profile.humor_level.score > HUMOR_THRESHOLD
        && HUMOR_KEYWORDS.iter().any(|word| text.contains(word))
    {
        return true;
    }

    if profile.technical_depth.score > TECHNICAL_THRESHOLD
        && TECHNICAL_KEYWORDS.iter().any(|word| text.contains(word))
    {
        return true;
    }

    false
}

fn meets_like_criteria(post: &Post, text: &str) -> bool {
    if POSITIVE_KEYWORDS.iter().any(|word| text.contains(word)) {
        return true;
    }

    if let Some(metrics) = post.metrics {
        if (LIKE_COUNT_MIN..=LIKE_COUNT_MAX).contains(&metrics.like_count)
            && metrics.repost_count > REPOST_COUNT_MIN
        {
            return true;
        }
    }

    false
}

fn meets_repost_criteria(post: &Post, text: &str) -> bool {
    if text.starts_with(RESHARE_PREFIX) || text.contains(ATTRIBUTION_MARKER) {
        return false;
    }

    if VALUABLE_KEYWORDS.iter().any(|word| text.contains(word)) {
        return true;
    }

    post.author.followers_count.unwrap_or(0) > INFLUENCE_FOLLOWERS
}
