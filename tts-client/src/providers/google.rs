//! Google Translate TTS provider
//!
//! Uses the public `translate_tts` endpoint, which answers with MP3 audio.
//! The endpoint rejects long inputs, so text is sent in parts of at most
//! [`MAX_CHARS`] characters and the returned MP3 frames are concatenated.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{Result, TtsError};
use crate::lang;
use crate::provider::{SpeechProvider, SpeechRequest};

/// Longest text the endpoint accepts in a single request.
pub const MAX_CHARS: usize = 100;

const DEFAULT_ENDPOINT: &str = "https://translate.google.com/translate_tts";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) medium-speech";

/// Provider backed by Google Translate's speech endpoint
pub struct GoogleTranslateProvider {
    endpoint: String,
    client: Client,
}

impl GoogleTranslateProvider {
    /// Create a new provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TtsError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_ENDPOINT)
                .to_string(),
            client,
        })
    }

    async fn fetch_part(
        &self,
        part: &str,
        idx: usize,
        total: usize,
        lang: &str,
        slow: bool,
    ) -> Result<Vec<u8>> {
        let speed = if slow { "0.24" } else { "1" };
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = part.chars().count().to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("q", part),
                ("ttsspeed", speed),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TtsError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(TtsError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(200).collect();
            if status.is_server_error() {
                return Err(TtsError::ServerError {
                    status: status.as_u16(),
                    message,
                });
            }
            return Err(TtsError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::Request(format!("Failed to read audio payload: {}", e)))?;

        if audio.is_empty() {
            return Err(TtsError::ApiError {
                message: "empty audio payload".to_string(),
                status_code: Some(status.as_u16()),
            });
        }

        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechProvider for GoogleTranslateProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let lang = lang::resolve(&request.lang)?;
        let parts = split_text(&request.text, MAX_CHARS);
        if parts.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let mut audio = Vec::new();
        for (idx, part) in parts.iter().enumerate() {
            debug!("Requesting part {}/{} ({} chars)", idx + 1, parts.len(), part.chars().count());
            audio.extend(self.fetch_part(part, idx, parts.len(), lang, request.slow).await?);
        }

        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "Google Translate"
    }
}

/// Split text into request-sized parts on word boundaries.
///
/// Words longer than `max_chars` are hard split. Parts without any
/// alphanumeric character are dropped because the endpoint cannot voice them.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            parts.extend(hard_split(word, max_chars));
        } else if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            parts.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts.retain(|p| is_speakable(p));
    parts
}

/// Split at exact character positions (last resort).
fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

fn is_speakable(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}
