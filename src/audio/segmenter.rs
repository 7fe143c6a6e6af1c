//! Splits conditioned audio into fixed-duration transcription segments.
//!
//! Segments are consecutive, non-overlapping windows tagged with a dense
//! zero-based index and start/end times derived from sample offsets. The
//! final window is truncated to whatever samples remain, never padded and
//! never dropped, so segment durations always sum to the source duration.
//!
//! Short files still produce one ordinary segment through the same code
//! path; the coordinator never has to special-case "unchunked" audio.

use crate::audio::buffer::AudioBuffer;
use crate::defaults;
use crate::error::{FieldscribeError, Result};
use std::io::Cursor;

/// Configuration for the segmenter.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Duration of one segment in seconds (default: 180).
    pub chunk_duration_secs: u32,
    /// Files longer than this are split into multiple segments (default: 180).
    pub long_file_threshold_secs: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: defaults::CHUNK_DURATION_SECS,
            long_file_threshold_secs: defaults::LONG_FILE_THRESHOLD_SECS,
        }
    }
}

/// How the source audio was partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// Whole file fit in one segment.
    Single,
    /// File was split into multiple fixed-duration segments.
    Chunked,
}

/// A contiguous, independently transcribable slice of the source audio.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Zero-based position in the original ordering. Dense, unique.
    pub index: usize,
    /// Start offset in seconds.
    pub start_time: f64,
    /// End offset in seconds.
    pub end_time: f64,
    /// Self-contained 16-bit PCM mono WAV for just this slice.
    pub payload: Vec<u8>,
}

impl Segment {
    /// Duration of this segment in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Human-readable time range, e.g. `"180.0s - 360.0s"`.
    pub fn time_label(&self) -> String {
        format!("{:.1}s - {:.1}s", self.start_time, self.end_time)
    }
}

/// Segmenter that partitions a buffer into ordered segments.
#[derive(Debug, Clone, Default)]
pub struct AudioSegmenter {
    config: SegmenterConfig,
}

impl AudioSegmenter {
    /// Creates a segmenter with default configuration.
    pub fn new() -> Self {
        Self::with_config(SegmenterConfig::default())
    }

    /// Creates a segmenter with custom configuration.
    pub fn with_config(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Partitions the buffer into time-ordered segments.
    ///
    /// Returns the mode plus segments covering the entire buffer with no
    /// gaps and no overlaps. Fails only on an empty buffer.
    pub fn segment(&self, audio: &AudioBuffer) -> Result<(SegmentMode, Vec<Segment>)> {
        if audio.samples.is_empty() {
            return Err(FieldscribeError::Decode {
                message: "cannot segment empty audio".to_string(),
            });
        }

        let duration = audio.duration_secs();
        let chunk_samples = self.config.chunk_duration_secs as usize * audio.sample_rate as usize;

        // Short files take the chunked path too, yielding exactly one
        // segment, so both modes produce bit-identical payloads.
        let window = if duration <= self.config.long_file_threshold_secs as f64 {
            audio.samples.len()
        } else {
            chunk_samples
        };

        // A zero window would never advance the emit loop below
        if window == 0 {
            return Err(FieldscribeError::ConfigInvalidValue {
                key: "chunking.chunk_duration_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }

        let mut segments = Vec::new();
        let mut offset = 0;
        while offset < audio.samples.len() {
            let end = (offset + window).min(audio.samples.len());
            let slice = &audio.samples[offset..end];

            segments.push(Segment {
                index: segments.len(),
                start_time: offset as f64 / audio.sample_rate as f64,
                end_time: end as f64 / audio.sample_rate as f64,
                payload: encode_wav(slice, audio.sample_rate)?,
            });

            offset = end;
        }

        let mode = if segments.len() == 1 {
            SegmentMode::Single
        } else {
            SegmentMode::Chunked
        };
        Ok((mode, segments))
    }
}

/// Encodes samples as a standalone 16-bit PCM mono WAV.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let encode_err = |e: hound::Error| FieldscribeError::Decode {
        message: format!("Failed to encode segment WAV: {}", e),
    };

    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(encode_err)?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).map_err(encode_err)?;
    }
    writer.finalize().map_err(encode_err)?;

    Ok(cursor.into_inner())
}
