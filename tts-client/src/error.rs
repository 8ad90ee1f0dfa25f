use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TtsError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("No speakable text in request")]
    EmptyText,

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TtsError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::Request(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;
