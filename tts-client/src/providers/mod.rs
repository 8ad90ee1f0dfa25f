//! Speech provider implementations

mod google;
pub mod mock;

pub use google::{GoogleTranslateProvider, MAX_CHARS, split_text};
pub use mock::MockProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, TtsError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" | "google-translate" | "gtts" => Ok(Self::Google),
            _ => Err(TtsError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }
}

/// Create a provider instance from configuration
pub fn get_provider(config: &ProviderConfig) -> Result<Box<dyn SpeechProvider>> {
    match ProviderKind::from_str(&config.provider)? {
        ProviderKind::Google => Ok(Box::new(GoogleTranslateProvider::new(config)?)),
    }
}
