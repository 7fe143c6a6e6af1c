//! Decoded audio held as mono floating-point samples.

/// Mono audio samples at a known sample rate.
///
/// Samples are amplitudes in [-1.0, 1.0]. Created once by decoding an upload;
/// conditioning passes (normalize, noise gate) mutate it in place before
/// segmentation, after which it is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Time-ordered mono samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Creates a buffer from mono samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Total duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Maximum absolute amplitude, 0.0 for an empty buffer.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |max, s| max.max(s.abs()))
    }

    /// Scales samples so the peak maps to `target_peak`.
    ///
    /// A silent buffer (peak 0) is left untouched, so no divide by zero.
    pub fn normalize(&mut self, target_peak: f32) {
        let peak = self.peak();
        if peak == 0.0 {
            return;
        }
        let gain = target_peak / peak;
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }

    /// Zeroes samples quieter than `floor_ratio` of the peak.
    ///
    /// Coarse denoise for recorder hiss between words; anything at or above
    /// the floor passes through unchanged.
    pub fn noise_gate(&mut self, floor_ratio: f32) {
        let threshold = self.peak() * floor_ratio;
        for sample in &mut self.samples {
            if sample.abs() < threshold {
                *sample = 0.0;
            }
        }
    }
}
