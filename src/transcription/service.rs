//! The full large-file pipeline: decode, condition, segment, coordinate,
//! assemble.

use crate::audio::decode::decode_wav_with_limits;
use crate::audio::segmenter::{AudioSegmenter, SegmentMode, SegmenterConfig};
use crate::config::Config;
use crate::error::Result;
use crate::speech::SpeechTranscriber;
use crate::storage::BlobStore;
use crate::transcription::assembler::{AssemblerConfig, QualityReport, TranscriptAssembler};
use crate::transcription::coordinator::{
    CancelFlag, CoordinatorConfig, TranscriptionCoordinator,
};
use crate::transcription::job::TranscriptionJob;
use std::sync::Arc;
use tracing::info;

/// Assembled transcript plus its quality signals.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// The assembled text, with inline markers for failed segments.
    pub text: String,
    /// Word/character counts, short-transcript flag, coverage stats.
    pub quality: QualityReport,
    /// Whether the source was transcribed as one segment or many.
    pub mode: SegmentMode,
}

/// Service turning one audio upload into one assembled transcript.
///
/// Holds the collaborator handles and configuration; every call builds a
/// fresh [`TranscriptionJob`], so concurrent uploads never share state.
pub struct TranscriptionService {
    config: Config,
    segmenter: AudioSegmenter,
    coordinator: TranscriptionCoordinator,
    assembler: TranscriptAssembler,
}

impl TranscriptionService {
    /// Creates a service with default configuration.
    pub fn new(store: Arc<dyn BlobStore>, transcriber: Arc<dyn SpeechTranscriber>) -> Self {
        Self::with_config(Config::default(), store, transcriber)
    }

    /// Creates a service with custom configuration.
    pub fn with_config(
        config: Config,
        store: Arc<dyn BlobStore>,
        transcriber: Arc<dyn SpeechTranscriber>,
    ) -> Self {
        let segmenter = AudioSegmenter::with_config(SegmenterConfig {
            chunk_duration_secs: config.chunking.chunk_duration_secs,
            long_file_threshold_secs: config.chunking.long_file_threshold_secs,
        });
        let coordinator = TranscriptionCoordinator::with_config(
            CoordinatorConfig {
                max_concurrency: config.transcription.max_concurrency,
                key_prefix: config.storage.key_prefix.clone(),
                coverage_tolerance_secs: config.chunking.coverage_tolerance_secs,
            },
            store,
            transcriber,
        );
        let assembler = TranscriptAssembler::with_config(AssemblerConfig {
            include_failure_markers: true,
            min_transcript_chars: config.transcription.min_transcript_chars,
        });

        Self {
            config,
            segmenter,
            coordinator,
            assembler,
        }
    }

    /// Transcribes an uploaded audio file using the configured language.
    pub async fn transcribe_file(&self, audio_bytes: &[u8]) -> Result<Transcript> {
        let language = self.config.transcription.language.clone();
        self.transcribe_file_with(audio_bytes, &language, &CancelFlag::new())
            .await
    }

    /// Transcribes an uploaded audio file with an explicit language and
    /// cancel flag.
    ///
    /// Only an unreadable or empty upload fails; per-segment problems are
    /// contained in the returned transcript's quality report.
    pub async fn transcribe_file_with(
        &self,
        audio_bytes: &[u8],
        language_code: &str,
        cancel: &CancelFlag,
    ) -> Result<Transcript> {
        let mut audio = decode_wav_with_limits(
            audio_bytes,
            self.config.audio.resample_threshold_hz,
            self.config.audio.resample_target_hz,
        )?;

        audio.normalize(self.config.audio.normalize_peak);
        audio.noise_gate(self.config.audio.noise_floor_ratio);

        let duration = audio.duration_secs();
        let (mode, segments) = self.segmenter.segment(&audio)?;
        info!(
            duration_secs = duration,
            segments = segments.len(),
            ?mode,
            "audio conditioned and segmented"
        );

        let mut job = TranscriptionJob::new(mode, segments, duration);
        let stats = self
            .coordinator
            .transcribe_with_cancel(&mut job, language_code, cancel)
            .await;

        let (text, quality) = self.assembler.assemble(&job.outcomes(), stats);
        Ok(Transcript {
            text,
            quality,
            mode,
        })
    }
}
