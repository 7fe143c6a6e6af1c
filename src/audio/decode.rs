//! WAV decoding into an [`AudioBuffer`].
//!
//! Accepts integer and float WAV payloads at any channel count. Multi-channel
//! audio is downmixed to mono by averaging channels. Rates above the
//! configured threshold are resampled down by linear interpolation; the
//! resample is logged so rate-dependent behavior is never silent.

use crate::audio::buffer::AudioBuffer;
use crate::defaults;
use crate::error::{FieldscribeError, Result};
use std::io::Cursor;
use tracing::debug;

/// Decodes WAV bytes into a mono [`AudioBuffer`] using the default
/// resampling policy (above 48kHz → 16kHz).
pub fn decode_wav(audio_bytes: &[u8]) -> Result<AudioBuffer> {
    decode_wav_with_limits(
        audio_bytes,
        defaults::RESAMPLE_THRESHOLD_HZ,
        defaults::RESAMPLE_TARGET_HZ,
    )
}

/// Decodes WAV bytes with an explicit resampling threshold and target.
pub fn decode_wav_with_limits(
    audio_bytes: &[u8],
    resample_threshold_hz: u32,
    resample_target_hz: u32,
) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(audio_bytes)).map_err(|e| {
        FieldscribeError::Decode {
            message: format!("Failed to parse WAV container: {}", e),
        }
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(FieldscribeError::Decode {
            message: "WAV header declares zero channels".to_string(),
        });
    }

    let interleaved = read_samples_as_f32(&mut reader, &spec)?;
    if interleaved.is_empty() {
        return Err(FieldscribeError::Decode {
            message: "audio contains zero samples".to_string(),
        });
    }

    // Downmix by averaging channels; trailing partial frames are dropped
    let mono: Vec<f32> = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if mono.is_empty() {
        return Err(FieldscribeError::Decode {
            message: "audio shorter than one frame".to_string(),
        });
    }

    let source_rate = spec.sample_rate;
    if source_rate > resample_threshold_hz {
        debug!(
            source_rate,
            target_rate = resample_target_hz,
            "resampling high-rate input"
        );
        let resampled = resample(&mono, source_rate, resample_target_hz);
        Ok(AudioBuffer::new(resampled, resample_target_hz))
    } else {
        Ok(AudioBuffer::new(mono, source_rate))
    }
}

/// Reads all samples as f32 in [-1.0, 1.0] regardless of on-disk format.
fn read_samples_as_f32(
    reader: &mut hound::WavReader<Cursor<&[u8]>>,
    spec: &hound::WavSpec,
) -> Result<Vec<f32>> {
    let decode_err = |e: hound::Error| FieldscribeError::Decode {
        message: format!("Failed to read WAV samples: {}", e),
    };

    match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_err),
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(decode_err)
        }
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[source_idx.min(samples.len() - 1)]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}
