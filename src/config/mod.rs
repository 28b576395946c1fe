use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub retention: RetentionConfig,
}

// ── Bot identity & modes ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Account the bot operates as (its own handle, used for mention detection
    /// and corpus collection).
    #[serde(default)]
    pub username: String,
    /// Decide and log actions without sending them.
    #[serde(default = "default_true")]
    pub dry_run: bool,
    /// Reduced polling frequency to conserve external call budget.
    #[serde(default)]
    pub lite_mode: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            dry_run: true,
            lite_mode: false,
        }
    }
}

// ── Platform API ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_platform_base_url")]
    pub base_url: String,
    /// Bearer token. Overridable via MIMUS_PLATFORM_TOKEN.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_platform_base_url() -> String {
    "https://api.xsocial.example".into()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_platform_base_url(),
            token: None,
        }
    }
}

// ── LLM completion API ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// API key. Overridable via MIMUS_LLM_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com".into()
}

fn default_llm_model() -> String {
    "gpt-4o".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    280
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

// ── Hourly action ceilings ────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_likes_per_hour")]
    pub likes_per_hour: u32,
    #[serde(default = "default_replies_per_hour")]
    pub replies_per_hour: u32,
    #[serde(default = "default_reposts_per_hour")]
    pub reposts_per_hour: u32,
}

fn default_likes_per_hour() -> u32 {
    50
}

fn default_replies_per_hour() -> u32 {
    10
}

fn default_reposts_per_hour() -> u32 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            likes_per_hour: default_likes_per_hour(),
            replies_per_hour: default_replies_per_hour(),
            reposts_per_hour: default_reposts_per_hour(),
        }
    }
}

// ── Polling schedule ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes between polling cycles.
    #[serde(default = "default_cycle_interval_minutes")]
    pub cycle_interval_minutes: u64,
    #[serde(default = "default_timeline_batch")]
    pub timeline_batch: u32,
    #[serde(default = "default_mentions_batch")]
    pub mentions_batch: u32,
}

fn default_cycle_interval_minutes() -> u64 {
    15
}

fn default_timeline_batch() -> u32 {
    50
}

fn default_mentions_batch() -> u32 {
    20
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cycle_interval_minutes: default_cycle_interval_minutes(),
            timeline_batch: default_timeline_batch(),
            mentions_batch: default_mentions_batch(),
        }
    }
}

// ── Personality analysis ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How many of the account's own posts to collect for analysis.
    /// Likes are collected at half this count.
    #[serde(default = "default_corpus_posts")]
    pub corpus_posts: u32,
}

fn default_corpus_posts() -> u32 {
    1000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            corpus_posts: default_corpus_posts(),
        }
    }
}

// ── Storage retention ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Processed markers and log rows older than this are pruned.
    #[serde(default = "default_retention_days")]
    pub days: u32,
}

fn default_retention_days() -> u32 {
    90
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_retention_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config.toml from the workspace, creating a default one on first
    /// run. Secrets can be supplied via environment variables.
    pub fn load_or_init() -> Result<Self> {
        let user_dirs = UserDirs::new().context("could not resolve home directory")?;
        let workspace_dir = user_dirs.home_dir().join(".mimus");
        fs::create_dir_all(&workspace_dir)?;
        let config_path = workspace_dir.join("config.toml");

        let mut config: Config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?
        } else {
            let config = Config::default();
            let rendered = toml::to_string_pretty(&config)?;
            fs::write(&config_path, rendered)?;
            config
        };

        config.workspace_dir = workspace_dir;
        config.config_path = config_path;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("MIMUS_PLATFORM_TOKEN") {
            if !token.is_empty() {
                self.platform.token = Some(token);
            }
        }
        if let Ok(key) = std::env::var("MIMUS_LLM_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(username) = std::env::var("MIMUS_BOT_USERNAME") {
            if !username.is_empty() {
                self.bot.username = username;
            }
        }
    }

    /// Startup validation. Failures here abort the process.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.bot.username.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bot.username is not set (or MIMUS_BOT_USERNAME)".into(),
            ));
        }
        if self.platform.token.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::Validation(
                "platform.token is not set (or MIMUS_PLATFORM_TOKEN)".into(),
            ));
        }
        if self.llm.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key is not set (or MIMUS_LLM_API_KEY)".into(),
            ));
        }
        if self.schedule.cycle_interval_minutes == 0 {
            return Err(ConfigError::Validation(
                "schedule.cycle_interval_minutes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.bot.username = "mimus_bot".into();
        config.platform.token = Some("token".into());
        config.llm.api_key = Some("key".into());
        config
    }

    #[test]
    fn defaults_match_product_policy() {
        let config = Config::default();
        assert_eq!(config.rate_limits.likes_per_hour, 50);
        assert_eq!(config.rate_limits.replies_per_hour, 10);
        assert_eq!(config.rate_limits.reposts_per_hour, 5);
        assert_eq!(config.schedule.cycle_interval_minutes, 15);
        assert_eq!(config.retention.days, 90);
        assert!(config.bot.dry_run, "dry-run is the safe default");
    }

    #[test]
    fn validate_accepts_configured_bot() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_username() {
        let mut config = configured();
        config.bot.username.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_platform_token() {
        let mut config = configured();
        config.platform.token = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_llm_key() {
        let mut config = configured();
        config.llm.api_key = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = configured();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.bot.username, "mimus_bot");
        assert_eq!(parsed.llm.max_tokens, 280);
    }
}
