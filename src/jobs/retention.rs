//! Periodic removal of finished jobs and their documents.

use super::registry::JobRegistry;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sweep once: drop jobs finished at least `retention` ago and delete their
/// output files. Returns how many jobs were removed.
pub async fn sweep_expired(registry: &JobRegistry, retention: Duration) -> usize {
    let removed = registry.sweep(retention);
    for state in &removed {
        let Some(path) = state.output_path.as_deref() else {
            continue;
        };
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed expired output {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove expired output {}: {}", path.display(), e),
        }
    }
    if !removed.is_empty() {
        info!("Swept {} expired jobs", removed.len());
    }
    removed.len()
}

/// Run [`sweep_expired`] every `interval` until the task is aborted.
pub fn spawn_sweeper(
    registry: JobRegistry,
    retention: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_expired(&registry, retention).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_deletes_output() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JobRegistry::new();
        let id = registry.create();
        let output = dir.path().join(format!("{id}.docx"));
        std::fs::write(&output, b"PK").unwrap();
        registry.succeed(&id, output.clone());

        assert_eq!(sweep_expired(&registry, Duration::ZERO).await, 1);
        assert!(!output.exists());
        assert!(registry.snapshot(&id).is_none());
    }

    #[tokio::test]
    async fn test_sweep_tolerates_missing_output() {
        let registry = JobRegistry::new();
        let id = registry.create();
        registry.succeed(&id, "/nonexistent/out.docx".into());
        assert_eq!(sweep_expired(&registry, Duration::ZERO).await, 1);
    }
}
