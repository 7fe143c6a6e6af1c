//! Structured survey extraction boundary.
//!
//! After transcription, an LLM turns the free-text transcript into a
//! structured record matching a caller-supplied survey schema. The core
//! treats extraction as a single opaque async call; prompt construction and
//! schema semantics live entirely in the implementation.

use crate::error::{FieldscribeError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Trait for schema-guided survey extraction from a transcript.
///
/// This trait allows swapping implementations (real LLM API vs mock).
#[async_trait]
pub trait SurveyExtractor: Send + Sync {
    /// Extract a structured record from `transcript` shaped by `schema`.
    ///
    /// # Arguments
    /// * `schema` - JSON description of the survey fields to fill
    /// * `transcript` - Free-text transcript to extract from
    ///
    /// # Returns
    /// A JSON record matching the schema, or error.
    async fn extract(
        &self,
        schema: &serde_json::Value,
        transcript: &str,
    ) -> Result<serde_json::Value>;
}

/// Mock survey extractor for testing.
#[derive(Debug, Default)]
pub struct MockSurveyExtractor {
    record: Option<serde_json::Value>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MockSurveyExtractor {
    /// Creates a mock that returns an empty JSON object for every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the record returned for every call.
    pub fn with_record(mut self, record: serde_json::Value) -> Self {
        self.record = Some(record);
        self
    }

    /// Configure every call to fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of extract calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Transcripts recorded per call, in call order.
    pub fn recorded_transcripts(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SurveyExtractor for MockSurveyExtractor {
    async fn extract(
        &self,
        _schema: &serde_json::Value,
        transcript: &str,
    ) -> Result<serde_json::Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(transcript.to_string());
        }

        if self.fail {
            return Err(FieldscribeError::Extraction {
                message: "injected extraction failure".to_string(),
            });
        }

        Ok(self
            .record
            .clone()
            .unwrap_or_else(|| serde_json::json!({})))
    }
}
