//! Error types for vidbrief.

use thiserror::Error;

/// Library-level error type for vidbrief operations.
#[derive(Error, Debug)]
pub enum VidbriefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    TranscriptUnavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for vidbrief operations.
pub type Result<T> = std::result::Result<T, VidbriefError>;

/// How a failed generation call is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider quota or rate limit exhausted.
    QuotaExceeded,
    /// API key rejected by the provider.
    InvalidCredentials,
    /// Anything else.
    Generic,
}

const QUOTA_MARKERS: &[&str] = &[
    "insufficient_quota",
    "error code: 429",
    "status code: 429",
    "status 429",
    "429 too many requests",
    "too many requests",
    "rate limit",
    "rate_limit",
    "exceeded your current quota",
];

const CREDENTIAL_MARKERS: &[&str] = &[
    "invalid_api_key",
    "incorrect api key provided",
    "invalid api key",
    "error code: 401",
    "status code: 401",
    "status 401",
    "401 unauthorized",
];

impl FailureKind {
    /// Classify an error by inspecting its string form.
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if QUOTA_MARKERS.iter().any(|m| lowered.contains(m)) {
            FailureKind::QuotaExceeded
        } else if CREDENTIAL_MARKERS.iter().any(|m| lowered.contains(m)) {
            FailureKind::InvalidCredentials
        } else {
            FailureKind::Generic
        }
    }
}

impl VidbriefError {
    /// Failure class used to pick a user-facing message.
    pub fn failure_kind(&self) -> FailureKind {
        FailureKind::classify(&self.to_string())
    }
}
