//! Default configuration constants for fieldscribe.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication. The audio-processing
//! values are empirical: they came from field testing against real interview
//! recordings, so they are exposed as configuration rather than baked into the
//! algorithms.

/// Duration of one transcription chunk in seconds.
///
/// 3-minute chunks balance transcription quality against turnaround time:
/// long enough to give the speech API sentence context, short enough that a
/// failed chunk loses only a bounded slice of the interview.
pub const CHUNK_DURATION_SECS: u32 = 180;

/// Duration above which a file is split into chunks, in seconds.
///
/// Files at or below this go through the same segment machinery as a single
/// segment, so short and long uploads share one code path.
pub const LONG_FILE_THRESHOLD_SECS: u32 = 180;

/// Maximum number of segments transcribed concurrently.
///
/// Bounds load on the downstream speech API and blob-store bandwidth, not CPU
/// parallelism; each worker spends nearly all its time blocked on network I/O.
pub const MAX_CONCURRENCY: usize = 3;

/// Tolerance for the coverage check, in seconds.
///
/// If the summed segment durations fall short of the source duration by more
/// than this, the quality report flags likely silent audio loss upstream.
pub const COVERAGE_TOLERANCE_SECS: f64 = 30.0;

/// Peak amplitude after normalization.
///
/// 0.8 leaves headroom so re-encoding the conditioned audio cannot clip.
pub const NORMALIZE_PEAK: f32 = 0.8;

/// Noise-gate floor as a fraction of peak amplitude.
///
/// Samples quieter than this fraction of the peak are zeroed. A coarse
/// denoise for handheld-recorder hiss, not a spectral filter.
pub const NOISE_FLOOR_RATIO: f32 = 0.02;

/// Sample rate above which input audio is resampled down, in Hz.
///
/// Speech APIs gain nothing from rates above 48kHz; anything higher is
/// resampled to [`RESAMPLE_TARGET_HZ`]. At or below this the original rate is
/// kept, so no data is lost for normal recordings.
pub const RESAMPLE_THRESHOLD_HZ: u32 = 48_000;

/// Target sample rate when resampling triggers, in Hz.
pub const RESAMPLE_TARGET_HZ: u32 = 16_000;

/// Minimum assembled transcript length in characters.
///
/// Below this the quality report raises `short_transcript`; a full interview
/// that transcribes to under 50 characters almost always means bad audio.
pub const MIN_TRANSCRIPT_CHARS: usize = 50;

/// Default language code for transcription.
///
/// Interviews are conducted in Hindi/English mixed speech common in rural
/// India; callers override per request.
pub const DEFAULT_LANGUAGE: &str = "hi-IN";

/// Prefix for intermediate blob keys.
pub const BLOB_KEY_PREFIX: &str = "chunk-";

/// Upload attempts per segment before its blob put counts as failed.
///
/// Blob uploads hit transient timeouts far more often than transcription
/// calls, so each segment gets one retry before it is marked failed.
pub const UPLOAD_ATTEMPTS: usize = 2;
