//! State of a single conversion job.

use crate::error::FailureStage;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

/// Unique identifier for a job (UUIDv4, also used as the on-disk file stem).
pub type JobId = Uuid;

/// Status shown while the job waits for its task to start.
pub const STATUS_STARTING: &str = "Starting...";
pub const STATUS_RASTERISING: &str = "Converting PDF to images...";
pub const STATUS_RECOGNISING: &str = "Performing OCR...";
pub const STATUS_DONE: &str = "Conversion done.";

/// Everything the registry knows about one job.
///
/// Progression is `not started → in progress → completed`. A completed job
/// may or may not have succeeded; check [`JobState::output_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    /// Pages recognised so far.
    pub current: usize,
    /// Page count, known once rasterisation finished.
    pub total: usize,
    /// Set exactly once, never reset.
    pub completed: bool,
    pub status: String,
    /// Saved document, only set on success.
    pub output_path: Option<PathBuf>,
    pub failure_stage: Option<FailureStage>,
    pub finished_at: Option<Instant>,
}

impl JobState {
    pub fn new() -> Self {
        Self {
            current: 0,
            total: 0,
            completed: false,
            status: STATUS_STARTING.to_string(),
            output_path: None,
            failure_stage: None,
            finished_at: None,
        }
    }

    /// `floor(current / total * 100)`, or 0 while the page count is unknown.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.current.saturating_mul(100) / self.total;
        pct.min(100) as u32
    }

    pub fn succeeded(&self) -> bool {
        self.completed && self.output_path.is_some()
    }

    /// Read projection served to polling clients.
    pub fn progress(&self) -> JobProgress {
        JobProgress {
            current: self.current,
            total: self.total,
            percentage: self.percentage(),
            completed: self.completed,
            status: self.status.clone(),
            failure_stage: self.failure_stage,
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobProgress {
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
    pub completed: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_stage: Option<FailureStage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_counts(current: usize, total: usize) -> JobState {
        JobState {
            current,
            total,
            ..JobState::new()
        }
    }

    #[test]
    fn test_new_job_is_zeroed() {
        let state = JobState::new();
        assert_eq!(state.current, 0);
        assert_eq!(state.total, 0);
        assert!(!state.completed);
        assert_eq!(state.status, "Starting...");
        assert!(state.output_path.is_none());
    }

    #[test]
    fn test_percentage() {
        assert_eq!(with_counts(0, 0).percentage(), 0);
        assert_eq!(with_counts(5, 0).percentage(), 0);
        assert_eq!(with_counts(0, 3).percentage(), 0);
        assert_eq!(with_counts(1, 3).percentage(), 33);
        assert_eq!(with_counts(2, 3).percentage(), 66);
        assert_eq!(with_counts(3, 3).percentage(), 100);
        assert_eq!(with_counts(7, 8).percentage(), 87);
    }

    #[test]
    fn test_percentage_never_exceeds_100() {
        assert_eq!(with_counts(9, 3).percentage(), 100);
    }

    #[test]
    fn test_progress_json_omits_missing_stage() {
        let json = serde_json::to_value(with_counts(1, 2).progress()).unwrap();
        assert_eq!(json["percentage"], 50);
        assert_eq!(json["status"], "Starting...");
        assert!(json.get("failure_stage").is_none());
    }

    #[test]
    fn test_progress_json_includes_stage() {
        let state = JobState {
            completed: true,
            failure_stage: Some(FailureStage::Recognise),
            ..JobState::new()
        };
        let json = serde_json::to_value(state.progress()).unwrap();
        assert_eq!(json["failure_stage"], "recognise");
        assert_eq!(json["completed"], true);
        assert!(!state.succeeded());
    }
}
