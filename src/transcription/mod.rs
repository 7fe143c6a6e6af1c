//! The large-file transcription pipeline: job bookkeeping, the bounded
//! parallel coordinator, transcript assembly, and the service tying them
//! together.

pub mod assembler;
pub mod coordinator;
pub mod job;
pub mod service;

pub use assembler::{AssemblerConfig, QualityReport, TranscriptAssembler};
pub use coordinator::{CancelFlag, CoordinatorConfig, TranscriptionCoordinator};
pub use job::{JobStats, SegmentOutcome, TranscriptionJob};
pub use service::{Transcript, TranscriptionService};
