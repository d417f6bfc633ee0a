//! In-memory job registry shared between the HTTP handlers and job tasks.
//!
//! Each entry is a [`watch`] channel holding the job's [`JobState`]: writers
//! mutate it in place, readers take a snapshot, and anyone can await
//! completion through a receiver. Once a job is completed every further
//! mutation is ignored, so `completed` can never flip back.

use super::state::{JobId, JobState, STATUS_DONE};
use crate::error::Pdf2DocxError;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Cheap to clone; all clones share the same map.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<DashMap<JobId, watch::Sender<JobState>>>,
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry")
            .field("jobs", &self.jobs.len())
            .finish()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh job with zeroed counters and return its id.
    pub fn create(&self) -> JobId {
        let id = Uuid::new_v4();
        self.register(id);
        id
    }

    /// Register `id` with zeroed counters, replacing any existing entry.
    pub fn register(&self, id: JobId) {
        let (tx, _) = watch::channel(JobState::new());
        self.jobs.insert(id, tx);
        debug!("Registered job {}", id);
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.jobs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Point-in-time copy of a job's state.
    pub fn snapshot(&self, id: &JobId) -> Option<JobState> {
        self.jobs.get(id).map(|tx| tx.borrow().clone())
    }

    /// Apply `f` to a job that has not completed yet.
    ///
    /// Returns false when the job is unknown or already completed.
    fn update(&self, id: &JobId, f: impl FnOnce(&mut JobState)) -> bool {
        let Some(tx) = self.jobs.get(id) else {
            return false;
        };
        tx.send_if_modified(|state| {
            if state.completed {
                return false;
            }
            f(state);
            true
        })
    }

    pub fn set_status(&self, id: &JobId, status: impl Into<String>) -> bool {
        let status = status.into();
        self.update(id, |s| s.status = status)
    }

    pub fn set_total(&self, id: &JobId, total: usize) -> bool {
        self.update(id, |s| s.total = total)
    }

    /// Record that `page_num` (1-indexed) of `total` has been recognised.
    pub fn page_done(&self, id: &JobId, page_num: usize, total: usize) -> bool {
        self.update(id, |s| {
            // current only grows and stays within total
            s.current = s.current.max(page_num).min(total.max(s.total));
            s.status = format!("Processing page {} of {}", page_num, total);
        })
    }

    /// Mark the job as completed with a saved document.
    pub fn succeed(&self, id: &JobId, output_path: PathBuf) -> bool {
        self.update(id, |s| {
            s.output_path = Some(output_path);
            s.status = STATUS_DONE.to_string();
            s.completed = true;
            s.finished_at = Some(Instant::now());
        })
    }

    /// Mark the job as completed without output.
    pub fn fail(&self, id: &JobId, err: &Pdf2DocxError) -> bool {
        let status = format!("Error: {}", err);
        let stage = err.stage();
        self.update(id, |s| {
            s.output_path = None;
            s.status = status;
            s.failure_stage = Some(stage);
            s.completed = true;
            s.finished_at = Some(Instant::now());
        })
    }

    /// Resolve once the job has completed, with its final state.
    ///
    /// Returns `None` for unknown jobs, or if the job is removed before it
    /// completes.
    pub async fn wait_until_complete(&self, id: &JobId) -> Option<JobState> {
        // The map guard must not be held across the await.
        let mut rx = self.jobs.get(id)?.subscribe();
        let state = rx.wait_for(|s| s.completed).await.ok()?;
        Some(state.clone())
    }

    /// Remove completed jobs that finished at least `retention` ago.
    ///
    /// In-flight jobs are never removed. Returns the removed states so the
    /// caller can delete their files.
    pub fn sweep(&self, retention: Duration) -> Vec<JobState> {
        let expired = |state: &JobState| {
            state.completed
                && state
                    .finished_at
                    .is_some_and(|t| t.elapsed() >= retention)
        };

        let ids: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|entry| expired(&entry.value().borrow()))
            .map(|entry| *entry.key())
            .collect();

        ids.into_iter()
            .filter_map(|id| {
                self.jobs
                    .remove_if(&id, |_, tx| expired(&tx.borrow()))
                    .map(|(_, tx)| tx.borrow().clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureStage;

    #[test]
    fn test_create_and_snapshot() {
        let registry = JobRegistry::new();
        let id = registry.create();
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);

        let state = registry.snapshot(&id).unwrap();
        assert_eq!(state.status, "Starting...");
        assert_eq!(state.percentage(), 0);
    }

    #[test]
    fn test_unknown_job_has_no_snapshot() {
        let registry = JobRegistry::new();
        registry.create();
        assert!(registry.snapshot(&Uuid::new_v4()).is_none());
        assert!(!registry.set_status(&Uuid::new_v4(), "x"));
    }

    #[test]
    fn test_page_progress() {
        let registry = JobRegistry::new();
        let id = registry.create();
        registry.set_total(&id, 3);
        registry.page_done(&id, 1, 3);
        registry.page_done(&id, 2, 3);

        let state = registry.snapshot(&id).unwrap();
        assert_eq!(state.current, 2);
        assert_eq!(state.total, 3);
        assert_eq!(state.status, "Processing page 2 of 3");
        assert_eq!(state.percentage(), 66);
    }

    #[test]
    fn test_current_never_exceeds_total() {
        let registry = JobRegistry::new();
        let id = registry.create();
        registry.set_total(&id, 2);
        registry.page_done(&id, 5, 2);
        assert_eq!(registry.snapshot(&id).unwrap().current, 2);
    }

    #[test]
    fn test_succeed() {
        let registry = JobRegistry::new();
        let id = registry.create();
        assert!(registry.succeed(&id, PathBuf::from("converts/x.docx")));

        let state = registry.snapshot(&id).unwrap();
        assert!(state.completed);
        assert!(state.succeeded());
        assert_eq!(state.status, "Conversion done.");
        assert!(state.finished_at.is_some());
    }

    #[test]
    fn test_fail_records_stage_and_message() {
        let registry = JobRegistry::new();
        let id = registry.create();
        let err = Pdf2DocxError::RecognitionFailed {
            page: 2,
            detail: "boom".into(),
        };
        registry.fail(&id, &err);

        let state = registry.snapshot(&id).unwrap();
        assert!(state.completed);
        assert!(state.output_path.is_none());
        assert!(state.status.starts_with("Error: "));
        assert!(state.status.contains("boom"));
        assert_eq!(state.failure_stage, Some(FailureStage::Recognise));
    }

    #[test]
    fn test_completed_is_final() {
        let registry = JobRegistry::new();
        let id = registry.create();
        registry.succeed(&id, PathBuf::from("a.docx"));

        assert!(!registry.set_status(&id, "Performing OCR..."));
        assert!(!registry.fail(&id, &Pdf2DocxError::Internal("late".into())));
        assert!(!registry.page_done(&id, 1, 1));

        let state = registry.snapshot(&id).unwrap();
        assert!(state.completed);
        assert_eq!(state.status, "Conversion done.");
        assert_eq!(state.output_path, Some(PathBuf::from("a.docx")));
    }

    #[tokio::test]
    async fn test_wait_until_complete() {
        let registry = JobRegistry::new();
        let id = registry.create();

        let writer = registry.clone();
        tokio::spawn(async move {
            writer.set_total(&id, 1);
            writer.page_done(&id, 1, 1);
            writer.succeed(&id, PathBuf::from("done.docx"));
        });

        let state = registry.wait_until_complete(&id).await.unwrap();
        assert!(state.completed);
        assert_eq!(state.current, 1);
    }

    #[tokio::test]
    async fn test_wait_for_unknown_job() {
        let registry = JobRegistry::new();
        assert!(registry.wait_until_complete(&Uuid::new_v4()).await.is_none());
    }

    #[test]
    fn test_sweep_keeps_in_flight_jobs() {
        let registry = JobRegistry::new();
        let running = registry.create();
        let done = registry.create();
        registry.succeed(&done, PathBuf::from("d.docx"));

        let removed = registry.sweep(Duration::ZERO);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].output_path, Some(PathBuf::from("d.docx")));
        assert!(registry.contains(&running));
        assert!(!registry.contains(&done));
    }

    #[test]
    fn test_sweep_respects_retention() {
        let registry = JobRegistry::new();
        let id = registry.create();
        registry.succeed(&id, PathBuf::from("d.docx"));

        assert!(registry.sweep(Duration::from_secs(3600)).is_empty());
        assert!(registry.contains(&id));
    }
}
