//! Joins ordered segment outcomes into the final transcript.
//!
//! Assembly never fails: a job where every segment failed still yields a
//! report reflecting zero successes, and the caller decides what to do with
//! it. Failed segments appear as inline markers at their position so the
//! reader can see which time ranges are missing.

use crate::defaults;
use crate::transcription::job::{JobStats, SegmentOutcome};

/// Configuration for the assembler.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Emit `[segment N failed to transcribe]` markers inline (default: true).
    pub include_failure_markers: bool,
    /// Transcripts shorter than this raise `short_transcript` (default: 50).
    pub min_transcript_chars: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            include_failure_markers: true,
            min_transcript_chars: defaults::MIN_TRANSCRIPT_CHARS,
        }
    }
}

/// Quality signals for an assembled transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    /// Whitespace-separated word count of the assembled text.
    pub word_count: usize,
    /// Character count of the assembled text.
    pub char_count: usize,
    /// True when the transcript is suspiciously short for a full interview.
    pub short_transcript: bool,
    /// The coordinator's completion and coverage statistics.
    pub stats: JobStats,
}

/// Assembler that combines segment outcomes.
#[derive(Debug, Clone, Default)]
pub struct TranscriptAssembler {
    config: AssemblerConfig,
}

impl TranscriptAssembler {
    /// Creates an assembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(AssemblerConfig::default())
    }

    /// Creates an assembler with custom configuration.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Joins outcomes in order into the final text plus quality report.
    ///
    /// Successful text is joined with single spaces; empty successes are
    /// skipped; failures contribute their inline marker (or nothing, when
    /// markers are disabled).
    pub fn assemble(&self, outcomes: &[SegmentOutcome], stats: JobStats) -> (String, QualityReport) {
        let parts: Vec<String> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                SegmentOutcome::Ok { text, .. } => {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                }
                SegmentOutcome::Failed { .. } => self
                    .config
                    .include_failure_markers
                    .then(|| outcome.marker()),
            })
            .collect();

        let full_text = parts.join(" ");

        let char_count = full_text.chars().count();
        let report = QualityReport {
            word_count: full_text.split_whitespace().count(),
            char_count,
            short_transcript: char_count < self.config.min_transcript_chars,
            stats,
        };

        (full_text, report)
    }
}
