//! Background conversion jobs.
//!
//! - [`JobRegistry`] — shared, in-memory map from job id to [`JobState`]
//! - [`spawn_job`] — runs one conversion on its own task, returns a [`JobHandle`]
//! - [`RegistryProgress`] — feeds pipeline events into the registry
//! - [`spawn_sweeper`] — drops finished jobs after the retention period
//!
//! Nothing is persisted: the registry lives as long as the process. There is
//! no admission control, so every upload starts its own task immediately and
//! holds its rendered pages in memory until it finishes.

pub mod registry;
pub mod retention;
pub mod runner;
pub mod state;

pub use registry::JobRegistry;
pub use retention::{spawn_sweeper, sweep_expired};
pub use runner::{spawn_job, JobFiles, JobHandle, RegistryProgress};
pub use state::{JobId, JobProgress, JobState};
