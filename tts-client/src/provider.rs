use async_trait::async_trait;

use crate::error::Result;

/// Request to synthesize one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    /// Language code, e.g. "en" or "en-us"
    pub lang: String,
    /// Ask the provider for slower speech
    pub slow: bool,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: lang.into(),
            slow: false,
        }
    }

    pub fn slow(mut self, slow: bool) -> Self {
        self.slow = slow;
        self
    }
}

/// Trait for speech synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize the request, returning the encoded audio payload
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// File extension of the payloads this provider returns
    fn audio_extension(&self) -> &'static str {
        "mp3"
    }
}
