//! Downstream transcription boundary.

use crate::error::{Result, SpeechgateError};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for the external speech-to-text collaborator.
///
/// The real collaborator is a slow remote service; calls are async and may
/// fail. This trait allows swapping implementations (real backend vs mock).
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one utterance of raw 16-bit PCM bytes to text.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Implement Transcriber for Arc<T> to allow sharing across sessions.
#[async_trait]
impl<T: Transcriber> Transcriber for Arc<T> {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        (**self).transcribe(audio).await
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    response: String,
    should_fail: bool,
    delay_ms: u64,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new() -> Self {
        Self {
            response: "mock transcription".to_string(),
            should_fail: false,
            delay_ms: 0,
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to sleep before responding, to simulate a slow
    /// backend
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }

        if self.should_fail {
            Err(SpeechgateError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(format!("{} ({} bytes)", self.response, audio.len()))
        }
    }
}
