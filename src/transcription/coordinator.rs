//! Bounded parallel transcription of a job's segments.
//!
//! Fans segments out over a semaphore-bounded set of workers, fans results
//! back in over a channel, and writes each outcome into the job slot keyed
//! by the segment's index. Workers completing in any interleaving never
//! corrupt ordering, and one failed segment never silences the rest of an
//! interview: upload and speech-API errors become `Failed` outcomes while
//! the siblings proceed.

use crate::defaults;
use crate::error::FieldscribeError;
use crate::speech::{AudioEncoding, SpeechTranscriber};
use crate::storage::BlobStore;
use crate::transcription::job::{JobStats, SegmentOutcome, TranscriptionJob};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum segments in flight at once (default: 3).
    ///
    /// Bounds load on the speech API and blob-store bandwidth.
    pub max_concurrency: usize,
    /// Prefix for intermediate blob keys.
    pub key_prefix: String,
    /// Coverage-check tolerance in seconds (default: 30).
    pub coverage_tolerance_secs: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::MAX_CONCURRENCY,
            key_prefix: defaults::BLOB_KEY_PREFIX.to_string(),
            coverage_tolerance_secs: defaults::COVERAGE_TOLERANCE_SECS,
        }
    }
}

/// Shared flag that stops a job from dispatching further segments.
///
/// In-flight uploads and transcriptions run to completion, but no new
/// segment is dispatched once the flag is set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of new dispatches.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Coordinator that transcribes a job's segments in parallel.
pub struct TranscriptionCoordinator {
    config: CoordinatorConfig,
    store: Arc<dyn BlobStore>,
    transcriber: Arc<dyn SpeechTranscriber>,
}

impl TranscriptionCoordinator {
    /// Creates a coordinator with default configuration.
    pub fn new(store: Arc<dyn BlobStore>, transcriber: Arc<dyn SpeechTranscriber>) -> Self {
        Self::with_config(CoordinatorConfig::default(), store, transcriber)
    }

    /// Creates a coordinator with custom configuration.
    pub fn with_config(
        config: CoordinatorConfig,
        store: Arc<dyn BlobStore>,
        transcriber: Arc<dyn SpeechTranscriber>,
    ) -> Self {
        Self {
            config,
            store,
            transcriber,
        }
    }

    /// Transcribes every segment of the job, honoring the concurrency bound.
    ///
    /// Always returns stats; per-segment failures are recorded as `Failed`
    /// outcomes in the job, never propagated.
    pub async fn transcribe(&self, job: &mut TranscriptionJob, language_code: &str) -> JobStats {
        self.transcribe_with_cancel(job, language_code, &CancelFlag::new())
            .await
    }

    /// Like [`transcribe`](Self::transcribe), but stops dispatching new
    /// segments once `cancel` fires. Undispatched segments surface as
    /// `Failed` outcomes so ordering still holds.
    pub async fn transcribe_with_cancel(
        &self,
        job: &mut TranscriptionJob,
        language_code: &str,
        cancel: &CancelFlag,
    ) -> JobStats {
        let total = job.len();
        info!(
            job_id = %job.id(),
            segments = total,
            concurrency = self.config.max_concurrency,
            language = language_code,
            "starting parallel transcription"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let (results_tx, mut results_rx) = mpsc::channel::<SegmentOutcome>(total.max(1));

        let mut dispatched = 0;
        let mut skipped = Vec::new();
        for segment in job.segments() {
            if cancel.is_cancelled() {
                skipped.push(segment.index);
                continue;
            }

            // Acquiring here (not inside the task) caps how far dispatch can
            // run ahead, so a cancel takes effect between segments.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break, // semaphore closed, shutting down
            };

            let store = self.store.clone();
            let transcriber = self.transcriber.clone();
            let results_tx = results_tx.clone();
            let language = language_code.to_string();
            let key = format!(
                "{}{}-{}.wav",
                self.config.key_prefix,
                segment.index,
                Uuid::new_v4()
            );
            let index = segment.index;
            let payload = segment.payload.clone();
            let sample_rate = sample_rate_of(&payload);
            let label = segment.time_label();

            dispatched += 1;
            tokio::spawn(async move {
                let _permit = permit; // hold until the segment is done

                let outcome = transcribe_segment(
                    store,
                    transcriber,
                    &key,
                    payload,
                    &language,
                    sample_rate,
                    index,
                )
                .await;

                debug!(index, label, ok = outcome.is_ok(), "segment finished");
                let _ = results_tx.send(outcome).await;
            });
        }
        drop(results_tx);

        let mut completed = 0;
        while let Some(outcome) = results_rx.recv().await {
            job.record(outcome);
            completed += 1;
            debug!(completed, dispatched, "progress");
        }

        // Undispatched segments get explicit Failed outcomes so the result
        // sequence stays dense and ordered.
        if !skipped.is_empty() {
            debug!(job_id = %job.id(), ?skipped, "job cancelled with segments undispatched");
            for index in skipped {
                job.record(SegmentOutcome::Failed {
                    index,
                    reason: "job cancelled before segment was dispatched".to_string(),
                });
            }
        }

        let stats = job.stats(self.config.coverage_tolerance_secs);
        if stats.coverage_warning {
            warn!(
                expected = stats.expected_duration,
                covered = stats.covered_duration,
                "segment coverage falls short of source duration"
            );
        }
        info!(
            job_id = %job.id(),
            succeeded = stats.succeeded,
            failed = stats.failed,
            "transcription complete"
        );
        stats
    }
}

/// Uploads one segment (with one retry on transient put failure),
/// transcribes it, and best-effort deletes the blob.
async fn transcribe_segment(
    store: Arc<dyn BlobStore>,
    transcriber: Arc<dyn SpeechTranscriber>,
    key: &str,
    payload: Vec<u8>,
    language_code: &str,
    sample_rate: u32,
    index: usize,
) -> SegmentOutcome {
    let location = match put_with_retry(store.as_ref(), key, payload, index).await {
        Ok(location) => location,
        Err(e) => {
            return SegmentOutcome::Failed {
                index,
                reason: format!("upload failed: {}", e),
            };
        }
    };

    let result = transcriber
        .transcribe(&location, language_code, AudioEncoding::Linear16, sample_rate)
        .await;

    // Fire-and-forget cleanup: a leaked blob is logged, never an error
    if let Err(e) = store.delete(key).await {
        warn!(index, key, error = %e, "failed to delete intermediate blob");
    }

    match result {
        Ok(text) => SegmentOutcome::Ok { index, text },
        Err(e) => {
            warn!(index, error = %e, "segment transcription failed");
            SegmentOutcome::Failed {
                index,
                reason: e.to_string(),
            }
        }
    }
}

/// Uploads a blob, retrying up to [`defaults::UPLOAD_ATTEMPTS`] times.
async fn put_with_retry(
    store: &dyn BlobStore,
    key: &str,
    payload: Vec<u8>,
    index: usize,
) -> crate::error::Result<String> {
    let mut last_err = None;
    for attempt in 1..=defaults::UPLOAD_ATTEMPTS {
        match store.put(key, payload.clone()).await {
            Ok(location) => return Ok(location),
            Err(e) => {
                warn!(index, key, attempt, error = %e, "segment upload failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| FieldscribeError::Upload {
        key: key.to_string(),
        message: "no upload attempts were made".to_string(),
    }))
}

/// Reads the sample rate from a WAV payload header, defaulting to 16kHz for
/// anything unreadable (the transcriber will reject it anyway).
fn sample_rate_of(payload: &[u8]) -> u32 {
    hound::WavReader::new(std::io::Cursor::new(payload))
        .map(|r| r.spec().sample_rate)
        .unwrap_or(defaults::RESAMPLE_TARGET_HZ)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::segmenter::{Segment, SegmentMode};
    use crate::speech::MockSpeechTranscriber;
    use crate::storage::MemoryBlobStore;

    fn make_segment(index: usize, start: f64, end: f64) -> Segment {
        // Minimal real WAV payload so sample_rate_of can parse it
        let mut cursor = std::io::Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(1000i16).unwrap();
        writer.finalize().unwrap();

        Segment {
            index,
            start_time: start,
            end_time: end,
            payload: cursor.into_inner(),
        }
    }

    fn make_job(n: usize) -> TranscriptionJob {
        let segments: Vec<Segment> = (0..n)
            .map(|i| make_segment(i, i as f64 * 180.0, (i + 1) as f64 * 180.0))
            .collect();
        TranscriptionJob::new(SegmentMode::Chunked, segments, n as f64 * 180.0)
    }

    fn coordinator(
        store: Arc<MemoryBlobStore>,
        transcriber: Arc<MockSpeechTranscriber>,
        concurrency: usize,
    ) -> TranscriptionCoordinator {
        TranscriptionCoordinator::with_config(
            CoordinatorConfig {
                max_concurrency: concurrency,
                key_prefix: "chunk-".to_string(),
                coverage_tolerance_secs: 30.0,
            },
            store,
            transcriber,
        )
    }

    #[tokio::test]
    async fn test_results_ordered_under_scrambled_completion() {
        let store = Arc::new(MemoryBlobStore::new());
        let transcriber = Arc::new(
            MockSpeechTranscriber::new()
                .with_response_for("chunk-0-", "alpha")
                .with_response_for("chunk-1-", "bravo")
                .with_response_for("chunk-2-", "charlie")
                .with_response_for("chunk-3-", "delta")
                .with_jitter_ms(25),
        );

        for concurrency in 1..=4 {
            let mut job = make_job(4);
            let stats = coordinator(store.clone(), transcriber.clone(), concurrency)
                .transcribe(&mut job, "hi-IN")
                .await;

            let texts: Vec<String> = job.outcomes().iter().map(|o| o.marker()).collect();
            assert_eq!(
                texts,
                vec!["alpha", "bravo", "charlie", "delta"],
                "order broke at concurrency {}",
                concurrency
            );
            assert_eq!(stats.succeeded, 4);
            assert_eq!(stats.failed, 0);
        }
    }

    #[tokio::test]
    async fn test_failure_isolation_middle_segment() {
        // 3 segments, concurrency 2, segment 1 fails: neighbors still land
        // at their correct positions.
        let store = Arc::new(MemoryBlobStore::new());
        let transcriber = Arc::new(
            MockSpeechTranscriber::new()
                .with_response_for("chunk-0-", "first part")
                .with_response_for("chunk-2-", "last part")
                .with_failure_for("chunk-1-"),
        );

        let mut job = make_job(3);
        let stats = coordinator(store.clone(), transcriber, 2)
            .transcribe(&mut job, "hi-IN")
            .await;

        let outcomes = job.outcomes();
        assert_eq!(outcomes[0].marker(), "first part");
        assert_eq!(outcomes[1].marker(), "[segment 1 failed to transcribe]");
        assert_eq!(outcomes[2].marker(), "last part");
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.succeeded, 2);
    }

    #[tokio::test]
    async fn test_every_single_failing_index_is_isolated() {
        for failing in 0..3 {
            let store = Arc::new(MemoryBlobStore::new());
            let transcriber = Arc::new(
                MockSpeechTranscriber::new()
                    .with_default_response("ok")
                    .with_failure_for(&format!("chunk-{}-", failing)),
            );

            let mut job = make_job(3);
            let stats = coordinator(store, transcriber, 3)
                .transcribe(&mut job, "hi-IN")
                .await;

            assert_eq!(stats.failed, 1, "failing index {}", failing);
            for (i, outcome) in job.outcomes().iter().enumerate() {
                assert_eq!(outcome.is_ok(), i != failing, "index {}", i);
            }
        }
    }

    #[tokio::test]
    async fn test_upload_failure_becomes_failed_outcome() {
        let store = Arc::new(MemoryBlobStore::new().with_put_failure_for("chunk-1-"));
        let transcriber = Arc::new(MockSpeechTranscriber::new().with_default_response("ok"));

        let mut job = make_job(2);
        let stats = coordinator(store, transcriber.clone(), 2)
            .transcribe(&mut job, "hi-IN")
            .await;

        assert_eq!(stats.failed, 1);
        assert!(job.outcomes()[0].is_ok());
        assert!(!job.outcomes()[1].is_ok());
        // The failed upload never reached the speech API
        assert_eq!(transcriber.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_upload_failure_is_retried() {
        // One timeout-style failure per segment clears on the retry, so
        // the job still succeeds in full.
        let store = Arc::new(MemoryBlobStore::new().with_transient_put_failures(1));
        let transcriber = Arc::new(MockSpeechTranscriber::new().with_default_response("ok"));

        let mut job = make_job(2);
        let stats = coordinator(store, transcriber.clone(), 1)
            .transcribe(&mut job, "hi-IN")
            .await;

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(transcriber.call_count(), 2);
    }

    #[tokio::test]
    async fn test_persistent_upload_failure_exhausts_retries() {
        let store = Arc::new(MemoryBlobStore::new().with_put_failures());
        let transcriber = Arc::new(MockSpeechTranscriber::new().with_default_response("ok"));

        let mut job = make_job(1);
        let stats = coordinator(store, transcriber.clone(), 1)
            .transcribe(&mut job, "hi-IN")
            .await;

        assert_eq!(stats.failed, 1);
        assert_eq!(transcriber.call_count(), 0);
    }

    #[tokio::test]
    async fn test_intermediate_blobs_deleted_after_job() {
        let store = Arc::new(MemoryBlobStore::new());
        let transcriber = Arc::new(MockSpeechTranscriber::new());

        let mut job = make_job(3);
        coordinator(store.clone(), transcriber, 2)
            .transcribe(&mut job, "hi-IN")
            .await;

        assert!(store.is_empty(), "intermediate blobs leaked");
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_fail_segment() {
        let store = Arc::new(MemoryBlobStore::new().with_delete_failures());
        let transcriber = Arc::new(MockSpeechTranscriber::new().with_default_response("text"));

        let mut job = make_job(2);
        let stats = coordinator(store.clone(), transcriber, 2)
            .transcribe(&mut job, "hi-IN")
            .await;

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 0);
        // Blobs leaked, logged, ignored
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_before_start_dispatches_nothing() {
        let store = Arc::new(MemoryBlobStore::new());
        let transcriber = Arc::new(MockSpeechTranscriber::new());
        let cancel = CancelFlag::new();
        cancel.cancel();

        let mut job = make_job(3);
        let stats = coordinator(store, transcriber.clone(), 2)
            .transcribe_with_cancel(&mut job, "hi-IN", &cancel)
            .await;

        assert_eq!(transcriber.call_count(), 0);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.failed, 3);
        // All slots still present, in order, as failures
        assert_eq!(job.outcomes().len(), 3);
    }

    #[tokio::test]
    async fn test_language_code_reaches_transcriber() {
        let store = Arc::new(MemoryBlobStore::new());
        let transcriber = Arc::new(MockSpeechTranscriber::new());

        let mut job = make_job(1);
        coordinator(store, transcriber.clone(), 1)
            .transcribe(&mut job, "en-IN")
            .await;

        let calls = transcriber.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].ends_with(" en-IN"));
    }

    #[tokio::test]
    async fn test_single_segment_job_uses_same_path() {
        let store = Arc::new(MemoryBlobStore::new());
        let transcriber =
            Arc::new(MockSpeechTranscriber::new().with_default_response("whole interview"));

        let mut job = TranscriptionJob::new(
            SegmentMode::Single,
            vec![make_segment(0, 0.0, 60.0)],
            60.0,
        );
        let stats = coordinator(store, transcriber, 3)
            .transcribe(&mut job, "hi-IN")
            .await;

        assert_eq!(stats.attempted, 1);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(job.outcomes()[0].marker(), "whole interview");
    }

    #[test]
    fn test_cancel_flag_roundtrip() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());

        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
