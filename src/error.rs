//! Error types for fieldscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldscribeError {
    // Audio decode errors, fatal to the whole job
    #[error("Failed to decode audio: {message}")]
    Decode { message: String },

    // Blob store errors, recovered per segment
    #[error("Blob upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    #[error("Blob delete failed for {key}: {message}")]
    Delete { key: String, message: String },

    // Speech API errors, recovered per segment
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // LLM extraction errors
    #[error("Survey extraction failed: {message}")]
    Extraction { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, FieldscribeError>;
