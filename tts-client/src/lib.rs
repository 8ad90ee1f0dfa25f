//! Text-to-speech client library for the medium-speech workspace
//!
//! Provides a unified interface for speech synthesis providers:
//! - Google Translate TTS (HTTP)
//! - Mock provider for tests

pub mod config;
pub mod error;
pub mod lang;
pub mod provider;
pub mod providers;

pub use config::ProviderConfig;
pub use error::{Result, TtsError};
pub use provider::{SpeechProvider, SpeechRequest};
pub use providers::{GoogleTranslateProvider, MockProvider, ProviderKind, get_provider};
