use super::Profile;
use crate::llm::Completion;
use crate::store::{CorpusKind, EngagementStore};
use std::sync::Arc;

/// Scoring runs cool: we want consistent ratings, not creative prose.
const ANALYSIS_TEMPERATURE: f64 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 1024;

const BIO_SAMPLE_CHARS: usize = 500;
const CORPUS_SAMPLE_CHARS: usize = 2000;
const CORPUS_SAMPLE_ROWS: u32 = 200;

const SYSTEM_PROMPT: &str =
    "You are a personality analyst. Analyze the user's social media data and provide insights.";

/// Builds the personality profile from the collected corpus by asking the
/// completion capability to score each dimension.
pub struct Analyzer {
    store: Arc<dyn EngagementStore>,
    llm: Arc<dyn Completion>,
}

impl Analyzer {
    pub fn new(store: Arc<dyn EngagementStore>, llm: Arc<dyn Completion>) -> Self {
        Self { store, llm }
    }

    pub fn has_profile(&self) -> anyhow::Result<bool> {
        Ok(self.store.load_profile()?.is_some())
    }

    /// Score the corpus and persist the resulting profile wholesale. An
    /// unparseable response degrades to the fixed neutral profile rather
    /// than leaving no profile at all.
    pub async fn analyze(&self, bio: &str) -> anyhow::Result<Profile> {
        let posts = self.store.corpus_texts(CorpusKind::Post, CORPUS_SAMPLE_ROWS)?;
        let likes = self.store.corpus_texts(CorpusKind::Like, CORPUS_SAMPLE_ROWS)?;
        tracing::info!(
            posts = posts.len(),
            likes = likes.len(),
            "starting personality analysis"
        );

        let prompt = build_analysis_prompt(bio, &posts, &likes);
        let response = self
            .llm
            .complete(
                Some(SYSTEM_PROMPT),
                &prompt,
                ANALYSIS_TEMPERATURE,
                ANALYSIS_MAX_TOKENS,
            )
            .await?;

        let profile = parse_analysis(&response);
        self.store.save_profile(&profile)?;
        tracing::info!("personality analysis complete and saved");
        Ok(profile)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn build_analysis_prompt(bio: &str, posts: &[String], likes: &[String]) -> String {
    let posts_sample = posts.join("\n");
    let likes_sample = likes.join("\n");

    format!(
        "Analyze this user's personality based on their social media activity:\n\n\
         BIO: {bio}\n\n\
         RECENT POSTS (sample):\n{posts}\n\n\
         RECENT LIKES (sample):\n{likes}\n\n\
         Please analyze and rate the following personality dimensions on a scale of 0.0 to 1.0:\n\n\
         1. humor_level - How humorous/funny they are\n\
         2. formality - How formal vs casual their communication is\n\
         3. enthusiasm - How enthusiastic/energetic they are\n\
         4. technical_depth - How technical/detailed their content is\n\
         5. controversy_tolerance - How willing they are to engage with controversial topics\n\
         6. emoji_usage - How frequently they use emojis\n\
         7. hashtag_usage - How frequently they use hashtags\n\n\
         Respond in JSON format:\n\
         {{\n    \"humor_level\": {{\"score\": 0.7, \"confidence\": 0.8}},\n    \"formality\": {{\"score\": 0.3, \"confidence\": 0.9}},\n    ...\n}}",
        bio = truncate_chars(bio, BIO_SAMPLE_CHARS),
        posts = truncate_chars(&posts_sample, CORPUS_SAMPLE_CHARS),
        likes = truncate_chars(&likes_sample, CORPUS_SAMPLE_CHARS),
    )
}

/// Pull the JSON object out of a response that may wrap it in prose: take
/// everything between the first `{` and the last `}`.
fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

fn parse_analysis(response: &str) -> Profile {
    let Some(json) = extract_json(response) else {
        tracing::warn!("no JSON object in analysis response, using neutral fallback profile");
        return Profile::neutral();
    };

    match serde_json::from_str::<Profile>(json) {
        Ok(profile) => profile,
        Err(error) => {
            tracing::warn!("analysis JSON did not parse ({error}), using neutral fallback profile");
            Profile::neutral()
        }
    }
}
