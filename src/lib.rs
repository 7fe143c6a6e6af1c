//! fieldscribe - Farmer-interview transcription backend
//!
//! Chunked large-file transcription with bounded parallelism, ordered
//! reassembly, and structured survey extraction.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod config;
pub mod defaults;
pub mod error;
pub mod extract;
pub mod live;
pub mod speech;
pub mod storage;
pub mod transcription;

// Core traits (store → transcribe → extract)
pub use extract::{MockSurveyExtractor, SurveyExtractor};
pub use speech::{AudioEncoding, MockSpeechTranscriber, SpeechTranscriber};
pub use storage::{BlobStore, MemoryBlobStore};

// Pipeline
pub use audio::{AudioBuffer, AudioSegmenter, Segment, SegmentMode, decode_wav};
pub use transcription::{
    CancelFlag, JobStats, QualityReport, SegmentOutcome, Transcript, TranscriptionCoordinator,
    TranscriptionJob, TranscriptionService,
};

// Live streaming
pub use live::{LiveSession, TranscriptEvent};

// Error handling
pub use error::{FieldscribeError, Result};

// Config
pub use config::Config;
