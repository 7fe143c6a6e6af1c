//! Speech-to-text boundary.
//!
//! The cloud speech API is long-running-operation shaped: it reads audio
//! from a blob-store location and may take substantial wall-clock time per
//! call. The core treats it as a single async call per segment and expects
//! the implementation to enforce its own per-call timeout.

use crate::error::{FieldscribeError, Result};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Duration;

/// Audio encoding hint passed to the speech API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    /// Uncompressed 16-bit signed little-endian PCM.
    Linear16,
}

/// Trait for cloud speech-to-text transcription.
///
/// This trait allows swapping implementations (real speech API vs mock).
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Transcribe the audio stored at `location` to text.
    ///
    /// # Arguments
    /// * `location` - Opaque blob location returned by [`crate::storage::BlobStore::put`]
    /// * `language_code` - BCP-47 language hint, e.g. `"hi-IN"`
    /// * `encoding` - Payload encoding hint
    /// * `sample_rate` - Payload sample rate in Hz
    ///
    /// # Returns
    /// Transcribed text (possibly empty for silence) or error.
    async fn transcribe(
        &self,
        location: &str,
        language_code: &str,
        encoding: AudioEncoding,
        sample_rate: u32,
    ) -> Result<String>;
}

/// Mock speech transcriber for testing.
///
/// Responses and failures are keyed by location substring, so behavior stays
/// deterministic no matter how concurrent calls interleave. Optional
/// location-hashed jitter lets ordering tests scramble completion order.
#[derive(Debug, Default)]
pub struct MockSpeechTranscriber {
    default_response: Option<String>,
    responses: Vec<(String, String)>,
    failures: Vec<String>,
    jitter_max_ms: u64,
    calls: Mutex<Vec<String>>,
}

impl MockSpeechTranscriber {
    /// Creates a mock that returns `"mock transcription"` for every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the response for every location without a specific match.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Configure the response for locations containing `substring`.
    ///
    /// First matching substring wins.
    pub fn with_response_for(mut self, substring: &str, response: &str) -> Self {
        self.responses
            .push((substring.to_string(), response.to_string()));
        self
    }

    /// Configure failure for locations containing `substring`.
    pub fn with_failure_for(mut self, substring: &str) -> Self {
        self.failures.push(substring.to_string());
        self
    }

    /// Configure a location-hashed sleep of up to `max_ms` per call, so
    /// concurrent calls complete in scrambled order deterministically.
    pub fn with_jitter_ms(mut self, max_ms: u64) -> Self {
        self.jitter_max_ms = max_ms;
        self
    }

    /// Number of transcribe calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// `"location language"` pairs recorded per call, in completion order.
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechTranscriber for MockSpeechTranscriber {
    async fn transcribe(
        &self,
        location: &str,
        language_code: &str,
        _encoding: AudioEncoding,
        _sample_rate: u32,
    ) -> Result<String> {
        if self.jitter_max_ms > 0 {
            let mut hasher = DefaultHasher::new();
            location.hash(&mut hasher);
            let ms = hasher.finish() % (self.jitter_max_ms + 1);
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{} {}", location, language_code));
        }

        if self.failures.iter().any(|s| location.contains(s)) {
            return Err(FieldscribeError::Transcription {
                message: format!("injected failure for {}", location),
            });
        }

        let text = self
            .responses
            .iter()
            .find(|(substring, _)| location.contains(substring))
            .map(|(_, response)| response.clone())
            .or_else(|| self.default_response.clone())
            .unwrap_or_else(|| "mock transcription".to_string());
        Ok(text)
    }
}
