use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Mimus`.
///
/// Subsystems construct their own variants and thread them through `anyhow`
/// context chains; callers that need to branch on the failure class downcast
/// to the subsystem enum.
#[derive(Debug, Error)]
pub enum MimusError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Platform client ──────────────────────────────────────────────────
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    // ── LLM / completion ─────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Store ────────────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Platform client errors ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{endpoint} request failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("platform token not set. Set MIMUS_PLATFORM_TOKEN or edit config.toml")]
    MissingToken,

    #[error("credential verification failed")]
    Credentials,

    #[error("response decode failed: {0}")]
    Decode(String),
}

// ─── LLM / completion errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Request(String),

    #[error("completion response decode failed: {0}")]
    Decode(String),

    #[error("empty completion response")]
    EmptyResponse,

    #[error("LLM api key not set. Set MIMUS_LLM_API_KEY or edit config.toml")]
    MissingKey,
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned: {0}")]
    Lock(String),
}
