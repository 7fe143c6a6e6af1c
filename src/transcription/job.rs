//! Per-upload transcription job state.
//!
//! A job owns its ordered segments and a pre-sized results array. Workers
//! completing in any order write only to the slot matching their segment's
//! index; reading the slots 0..N-1 afterwards is what decouples output order
//! from completion order. Each job is an ordinary value, not an entry in a
//! process-global session table.

use crate::audio::segmenter::{Segment, SegmentMode};
use uuid::Uuid;

/// Result of attempting to transcribe one segment.
///
/// Carries the originating segment index so results can be reordered after
/// concurrent completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Transcription succeeded, possibly with empty text for silence.
    Ok { index: usize, text: String },
    /// Upload or transcription failed; the job continues without this slice.
    Failed { index: usize, reason: String },
}

impl SegmentOutcome {
    /// Originating segment index.
    pub fn index(&self) -> usize {
        match self {
            SegmentOutcome::Ok { index, .. } => *index,
            SegmentOutcome::Failed { index, .. } => *index,
        }
    }

    /// True for a successful outcome.
    pub fn is_ok(&self) -> bool {
        matches!(self, SegmentOutcome::Ok { .. })
    }

    /// Human-readable inline placeholder for a failed segment.
    pub fn marker(&self) -> String {
        match self {
            SegmentOutcome::Ok { text, .. } => text.clone(),
            SegmentOutcome::Failed { index, .. } => {
                format!("[segment {} failed to transcribe]", index)
            }
        }
    }
}

/// Completion statistics for a job, including the coverage check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobStats {
    /// Segments the job set out to transcribe.
    pub attempted: usize,
    /// Segments that produced text.
    pub succeeded: usize,
    /// Segments that ended as `Failed` outcomes.
    pub failed: usize,
    /// Source audio duration in seconds.
    pub expected_duration: f64,
    /// Sum of segment durations actually produced, in seconds.
    pub covered_duration: f64,
    /// True when covered falls short of expected by more than the tolerance,
    /// indicating silent audio loss upstream.
    pub coverage_warning: bool,
}

/// One audio upload on its way to one assembled transcript.
///
/// Owns the segments and the mutable results array for its lifetime;
/// segment payloads are released when the job is dropped.
#[derive(Debug)]
pub struct TranscriptionJob {
    id: Uuid,
    mode: SegmentMode,
    segments: Vec<Segment>,
    results: Vec<Option<SegmentOutcome>>,
    expected_duration: f64,
}

impl TranscriptionJob {
    /// Creates a job over ordered segments of a source with the given total
    /// duration in seconds.
    pub fn new(mode: SegmentMode, segments: Vec<Segment>, expected_duration: f64) -> Self {
        let results = vec![None; segments.len()];
        Self {
            id: Uuid::new_v4(),
            mode,
            segments,
            results,
            expected_duration,
        }
    }

    /// Unique job identifier, used in blob keys and logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// How the source was partitioned.
    pub fn mode(&self) -> SegmentMode {
        self.mode
    }

    /// Ordered segments owned by this job.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for a job with no segments (never produced by the segmenter).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Records an outcome in the slot matching its index.
    ///
    /// Out-of-range indices are ignored; a slot is only ever written by the
    /// worker that owned that segment, so overwrites do not occur in
    /// practice.
    pub fn record(&mut self, outcome: SegmentOutcome) {
        let index = outcome.index();
        if let Some(slot) = self.results.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    /// Number of slots still awaiting an outcome.
    pub fn pending(&self) -> usize {
        self.results.iter().filter(|r| r.is_none()).count()
    }

    /// Outcomes in segment order, regardless of completion order.
    ///
    /// Slots never written (e.g. cancelled before dispatch) surface as
    /// `Failed` outcomes so the sequence stays dense and ordered.
    pub fn outcomes(&self) -> Vec<SegmentOutcome> {
        self.results
            .iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some(outcome) => outcome.clone(),
                None => SegmentOutcome::Failed {
                    index,
                    reason: "segment was never dispatched".to_string(),
                },
            })
            .collect()
    }

    /// Completion statistics with the coverage check applied.
    pub fn stats(&self, coverage_tolerance_secs: f64) -> JobStats {
        let covered_duration: f64 = self.segments.iter().map(|s| s.duration_secs()).sum();
        let succeeded = self
            .results
            .iter()
            .filter(|r| matches!(r, Some(SegmentOutcome::Ok { .. })))
            .count();

        JobStats {
            attempted: self.segments.len(),
            succeeded,
            failed: self.segments.len() - succeeded,
            expected_duration: self.expected_duration,
            covered_duration,
            coverage_warning: covered_duration < self.expected_duration - coverage_tolerance_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_segment(index: usize, start: f64, end: f64) -> Segment {
        Segment {
            index,
            start_time: start,
            end_time: end,
            payload: vec![0u8; 8],
        }
    }

    fn three_segment_job() -> TranscriptionJob {
        TranscriptionJob::new(
            SegmentMode::Chunked,
            vec![
                make_segment(0, 0.0, 180.0),
                make_segment(1, 180.0, 360.0),
                make_segment(2, 360.0, 400.0),
            ],
            400.0,
        )
    }

    #[test]
    fn test_outcomes_read_in_index_order() {
        let mut job = three_segment_job();

        // Completion order 2, 0, 1
        job.record(SegmentOutcome::Ok {
            index: 2,
            text: "third".to_string(),
        });
        job.record(SegmentOutcome::Ok {
            index: 0,
            text: "first".to_string(),
        });
        job.record(SegmentOutcome::Ok {
            index: 1,
            text: "second".to_string(),
        });

        let texts: Vec<String> = job.outcomes().iter().map(|o| o.marker()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(job.pending(), 0);
    }

    #[test]
    fn test_failed_outcome_keeps_position() {
        let mut job = three_segment_job();

        job.record(SegmentOutcome::Ok {
            index: 0,
            text: "before".to_string(),
        });
        job.record(SegmentOutcome::Failed {
            index: 1,
            reason: "quota".to_string(),
        });
        job.record(SegmentOutcome::Ok {
            index: 2,
            text: "after".to_string(),
        });

        let outcomes = job.outcomes();
        assert!(outcomes[0].is_ok());
        assert!(!outcomes[1].is_ok());
        assert!(outcomes[2].is_ok());
        assert_eq!(outcomes[1].marker(), "[segment 1 failed to transcribe]");
    }

    #[test]
    fn test_unwritten_slot_becomes_failed_outcome() {
        let mut job = three_segment_job();
        job.record(SegmentOutcome::Ok {
            index: 0,
            text: "only".to_string(),
        });

        let outcomes = job.outcomes();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(!outcomes[1].is_ok());
        assert!(!outcomes[2].is_ok());
        assert_eq!(job.pending(), 2);
    }

    #[test]
    fn test_out_of_range_record_is_ignored() {
        let mut job = three_segment_job();
        job.record(SegmentOutcome::Ok {
            index: 99,
            text: "ghost".to_string(),
        });
        assert_eq!(job.pending(), 3);
    }

    #[test]
    fn test_stats_counts_and_coverage() {
        let mut job = three_segment_job();
        job.record(SegmentOutcome::Ok {
            index: 0,
            text: "a".to_string(),
        });
        job.record(SegmentOutcome::Failed {
            index: 1,
            reason: "x".to_string(),
        });
        job.record(SegmentOutcome::Ok {
            index: 2,
            text: "b".to_string(),
        });

        let stats = job.stats(30.0);
        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.expected_duration, 400.0);
        assert!((stats.covered_duration - 400.0).abs() < 1e-9);
        assert!(!stats.coverage_warning);
    }

    #[test]
    fn test_coverage_warning_when_segments_fall_short() {
        // Segments cover 360s of a 400s source: 40s short, over the 30s
        // tolerance.
        let job = TranscriptionJob::new(
            SegmentMode::Chunked,
            vec![
                make_segment(0, 0.0, 180.0),
                make_segment(1, 180.0, 360.0),
            ],
            400.0,
        );

        assert!(job.stats(30.0).coverage_warning);
        assert!(!job.stats(50.0).coverage_warning);
    }

    #[test]
    fn test_jobs_are_independent() {
        let mut a = three_segment_job();
        let b = three_segment_job();

        a.record(SegmentOutcome::Ok {
            index: 0,
            text: "a".to_string(),
        });

        assert_ne!(a.id(), b.id());
        assert_eq!(a.pending(), 2);
        assert_eq!(b.pending(), 3);
    }
}
