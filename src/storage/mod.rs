//! Blob storage boundary for intermediate segment audio.
//!
//! The speech API reads audio from a storage location rather than taking
//! bytes inline, so each segment is parked in a blob store for the duration
//! of its transcription call. This trait allows swapping implementations
//! (real cloud bucket vs in-memory store).

use crate::error::{FieldscribeError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Trait for byte-blob storage keyed by string.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, returning an opaque location usable by the
    /// speech transcriber.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;

    /// Delete the blob under `key`.
    ///
    /// Callers treat failure as ignorable: a leaked intermediate blob is a
    /// cost issue, not a correctness issue.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory blob store for tests and local development.
///
/// Locations are `mem://<key>` URIs. Upload failure can be injected for
/// specific keys or for every call.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_all_puts: bool,
    fail_put_substring: Option<String>,
    transient_put_failures: Mutex<usize>,
    fail_deletes: bool,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure every put to fail.
    pub fn with_put_failures(mut self) -> Self {
        self.fail_all_puts = true;
        self
    }

    /// Configure puts to fail when the key contains `substring`.
    pub fn with_put_failure_for(mut self, substring: &str) -> Self {
        self.fail_put_substring = Some(substring.to_string());
        self
    }

    /// Configure the next `count` puts to fail, after which puts succeed.
    ///
    /// Models transient upload timeouts that clear on retry.
    pub fn with_transient_put_failures(self, count: usize) -> Self {
        if let Ok(mut remaining) = self.transient_put_failures.lock() {
            *remaining = count;
        }
        self
    }

    /// Configure every delete to fail.
    pub fn with_delete_failures(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// True when no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a stored blob's bytes, if present.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(FieldscribeError::Upload {
                key: key.to_string(),
                message: "refusing to upload empty blob".to_string(),
            });
        }
        if self.fail_all_puts
            || self
                .fail_put_substring
                .as_deref()
                .is_some_and(|s| key.contains(s))
        {
            return Err(FieldscribeError::Upload {
                key: key.to_string(),
                message: "injected upload failure".to_string(),
            });
        }
        if let Ok(mut remaining) = self.transient_put_failures.lock()
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(FieldscribeError::Upload {
                key: key.to_string(),
                message: "injected transient upload failure".to_string(),
            });
        }

        let mut blobs = self.blobs.lock().map_err(|_| FieldscribeError::Upload {
            key: key.to_string(),
            message: "store lock poisoned".to_string(),
        })?;
        blobs.insert(key.to_string(), bytes);
        Ok(format!("mem://{}", key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes {
            return Err(FieldscribeError::Delete {
                key: key.to_string(),
                message: "injected delete failure".to_string(),
            });
        }

        let mut blobs = self.blobs.lock().map_err(|_| FieldscribeError::Delete {
            key: key.to_string(),
            message: "store lock poisoned".to_string(),
        })?;
        blobs.remove(key);
        Ok(())
    }
}
