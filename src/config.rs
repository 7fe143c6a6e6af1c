use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub chunking: ChunkingConfig,
    pub transcription: TranscriptionConfig,
    pub storage: StorageConfig,
}

/// Audio conditioning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Peak amplitude after normalization.
    pub normalize_peak: f32,
    /// Noise-gate floor as a fraction of peak amplitude.
    pub noise_floor_ratio: f32,
    /// Sample rate above which input is resampled down.
    pub resample_threshold_hz: u32,
    /// Target rate when resampling triggers.
    pub resample_target_hz: u32,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Duration of one segment in seconds.
    pub chunk_duration_secs: u32,
    /// Files longer than this are split into segments.
    pub long_file_threshold_secs: u32,
    /// Shortfall in covered duration that triggers the coverage warning.
    pub coverage_tolerance_secs: f64,
}

/// Transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Default language code (per-request override wins).
    pub language: String,
    /// Maximum segments in flight at once.
    pub max_concurrency: usize,
    /// Minimum assembled transcript length before `short_transcript` fires.
    pub min_transcript_chars: usize,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket holding intermediate segment blobs.
    pub bucket: String,
    /// Key prefix for intermediate segment blobs.
    pub key_prefix: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            normalize_peak: defaults::NORMALIZE_PEAK,
            noise_floor_ratio: defaults::NOISE_FLOOR_RATIO,
            resample_threshold_hz: defaults::RESAMPLE_THRESHOLD_HZ,
            resample_target_hz: defaults::RESAMPLE_TARGET_HZ,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: defaults::CHUNK_DURATION_SECS,
            long_file_threshold_secs: defaults::LONG_FILE_THRESHOLD_SECS,
            coverage_tolerance_secs: defaults::COVERAGE_TOLERANCE_SECS,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            max_concurrency: defaults::MAX_CONCURRENCY,
            min_transcript_chars: defaults::MIN_TRANSCRIPT_CHARS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "fieldscribe-interviews".to_string(),
            key_prefix: defaults::BLOB_KEY_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only falls back to defaults when the file is missing.
    /// Invalid TOML or invalid values are errors.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Reject values the pipeline cannot work with.
    fn validate(&self) -> anyhow::Result<()> {
        if self.chunking.chunk_duration_secs == 0 {
            anyhow::bail!("chunking.chunk_duration_secs must be positive");
        }
        if self.transcription.max_concurrency == 0 {
            anyhow::bail!("transcription.max_concurrency must be positive");
        }
        if !(0.0..=1.0).contains(&self.audio.noise_floor_ratio) {
            anyhow::bail!("audio.noise_floor_ratio must be within [0, 1]");
        }
        if self.audio.normalize_peak <= 0.0 || self.audio.normalize_peak > 1.0 {
            anyhow::bail!("audio.normalize_peak must be within (0, 1]");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - FIELDSCRIBE_LANGUAGE → transcription.language
    /// - FIELDSCRIBE_BUCKET → storage.bucket
    /// - FIELDSCRIBE_MAX_CONCURRENCY → transcription.max_concurrency
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("FIELDSCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.transcription.language = language;
        }

        if let Ok(bucket) = std::env::var("FIELDSCRIBE_BUCKET")
            && !bucket.is_empty()
        {
            self.storage.bucket = bucket;
        }

        if let Ok(concurrency) = std::env::var("FIELDSCRIBE_MAX_CONCURRENCY")
            && let Ok(value) = concurrency.parse::<usize>()
            && value > 0
        {
            self.transcription.max_concurrency = value;
        }

        self
    }
}
