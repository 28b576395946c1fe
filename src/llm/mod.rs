use async_trait::async_trait;

pub mod openai;

pub use openai::OpenAiCompletion;

/// Text-generation capability consumed by the analyzer and the composer.
/// Treated as a black box with a timeout and a parse contract.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> anyhow::Result<String>;
}
