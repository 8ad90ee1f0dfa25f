//! Mock speech provider for testing
//!
//! Simulates failures for selected texts, transient failures that clear up
//! after a number of calls, and records every request it receives.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, SpeechRequest};

/// A mock provider for testing skip and retry behavior
pub struct MockProvider {
    /// Number of leading calls that fail with `fail_with`
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error returned for failing calls
    fail_with: Option<TtsError>,
    /// Requests whose text contains this marker always fail
    fail_marker: Option<String>,
    /// Payload returned on success
    payload: Vec<u8>,
    /// Every request received, in call order
    requests: Mutex<Vec<SpeechRequest>>,
}

impl MockProvider {
    /// Create a provider that always succeeds with the given payload
    pub fn always_succeeds(payload: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: None,
            fail_marker: None,
            payload: payload.to_vec(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: TtsError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            fail_with: Some(error),
            ..Self::always_succeeds(b"")
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: TtsError, payload: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            fail_with: Some(error),
            ..Self::always_succeeds(payload)
        }
    }

    /// Create a provider that rejects any text containing `marker`
    pub fn fails_on(marker: &str, payload: &[u8]) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::always_succeeds(payload)
        }
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts of every request received, in call order
    pub fn requested_texts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(marker) = &self.fail_marker {
            if request.text.contains(marker.as_str()) {
                return Err(TtsError::ApiError {
                    message: format!("rejected text containing '{}'", marker),
                    status_code: Some(400),
                });
            }
        }

        if call_num < self.fail_count.load(Ordering::SeqCst) {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
        }

        Ok(self.payload.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest::new(text, "en")
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds(b"ID3");
        let result = provider.synthesize(&request("hello")).await;
        assert_eq!(result.unwrap(), b"ID3".to_vec());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(TtsError::EmptyText);
        for _ in 0..3 {
            assert_eq!(
                provider.synthesize(&request("x")).await,
                Err(TtsError::EmptyText)
            );
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let provider =
            MockProvider::fails_then_succeeds(2, TtsError::RateLimited { retry_after: None }, b"ok");

        assert!(provider.synthesize(&request("a")).await.is_err());
        assert!(provider.synthesize(&request("a")).await.is_err());
        assert_eq!(provider.synthesize(&request("a")).await.unwrap(), b"ok".to_vec());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_on_marker() {
        let provider = MockProvider::fails_on("bad", b"ok");
        assert!(provider.synthesize(&request("good line")).await.is_ok());
        assert!(provider.synthesize(&request("a bad line")).await.is_err());
        assert_eq!(provider.requested_texts(), vec!["good line", "a bad line"]);
    }
}
