//! Background task that runs one job's conversion and records the outcome.

use super::registry::JobRegistry;
use super::state::{JobId, STATUS_RASTERISING, STATUS_RECOGNISING};
use crate::convert::Converter;
use crate::error::Pdf2DocxError;
use crate::progress::ConversionProgressCallback;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Forwards pipeline events into the registry entry of one job.
#[derive(Debug, Clone)]
pub struct RegistryProgress {
    registry: JobRegistry,
    id: JobId,
}

impl RegistryProgress {
    pub fn new(registry: JobRegistry, id: JobId) -> Self {
        Self { registry, id }
    }
}

impl ConversionProgressCallback for RegistryProgress {
    fn on_rasterise_start(&self) {
        self.registry.set_status(&self.id, STATUS_RASTERISING);
    }

    fn on_conversion_start(&self, total_pages: usize) {
        self.registry.set_total(&self.id, total_pages);
        self.registry.set_status(&self.id, STATUS_RECOGNISING);
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, _text_len: usize) {
        self.registry.page_done(&self.id, page_num, total_pages);
    }
}

/// Handle to a spawned job.
///
/// Dropping the handle detaches the task; the job keeps running and its
/// outcome is still recorded in the registry.
#[derive(Debug)]
pub struct JobHandle {
    pub id: JobId,
    task: JoinHandle<Result<PathBuf, Pdf2DocxError>>,
}

impl JobHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task and return the saved document path or the error
    /// that ended the job.
    pub async fn wait(self) -> Result<PathBuf, Pdf2DocxError> {
        self.task
            .await
            .map_err(|e| Pdf2DocxError::Internal(format!("Job task failed: {}", e)))?
    }
}

/// Paths for one job.
#[derive(Debug, Clone)]
pub struct JobFiles {
    /// Uploaded PDF; deleted when the job ends.
    pub upload: PathBuf,
    /// Where the document is saved on success.
    pub output: PathBuf,
}

/// Spawn the conversion task for a registered job.
///
/// The upload is deleted whatever the outcome, before the outcome is
/// published, so an observer that sees `completed` also sees the upload gone.
pub fn spawn_job(
    registry: &JobRegistry,
    converter: &Converter,
    id: JobId,
    files: JobFiles,
) -> JobHandle {
    let registry = registry.clone();
    let converter = converter.clone();

    let task = tokio::spawn(async move {
        // The conversion runs in its own task so a panicking engine still
        // ends the job with an error and the upload removed.
        let progress = RegistryProgress::new(registry.clone(), id);
        let (upload, output) = (files.upload.clone(), files.output.clone());
        let result = tokio::spawn(async move {
            converter.convert_to_file(&upload, &output, &progress).await
        })
        .await
        .unwrap_or_else(|e| {
            Err(Pdf2DocxError::Internal(format!(
                "Conversion task aborted: {}",
                e
            )))
        });

        if let Err(e) = tokio::fs::remove_file(&files.upload).await {
            warn!("Job {}: could not remove upload {}: {}", id, files.upload.display(), e);
        }

        match result {
            Ok(output) => {
                info!(
                    "Job {} done: {} pages in {}ms",
                    id, output.stats.total_pages, output.stats.total_duration_ms
                );
                registry.succeed(&id, files.output.clone());
                Ok(files.output)
            }
            Err(e) => {
                error!("Job {} failed ({}): {}", id, e.stage(), e);
                registry.fail(&id, &e);
                Err(e)
            }
        }
    });

    JobHandle { id, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use crate::error::FailureStage;
    use crate::pipeline::ocr::TextRecogniser;
    use crate::pipeline::render::PageRasteriser;
    use async_trait::async_trait;
    use image::DynamicImage;
    use std::path::Path;
    use std::sync::Arc;

    struct Pages(usize);

    #[async_trait]
    impl PageRasteriser for Pages {
        async fn rasterise(&self, pdf: &Path) -> Result<Vec<DynamicImage>, Pdf2DocxError> {
            if !pdf.exists() {
                return Err(Pdf2DocxError::FileNotFound {
                    path: pdf.to_path_buf(),
                });
            }
            Ok((0..self.0).map(|_| DynamicImage::new_luma8(4, 4)).collect())
        }
    }

    struct Echo;

    #[async_trait]
    impl TextRecogniser for Echo {
        async fn recognise(&self, page: usize, _img: &DynamicImage) -> Result<String, Pdf2DocxError> {
            Ok(format!("පිටුව {page}"))
        }
    }

    fn converter(pages: usize) -> Converter {
        let config = ConversionConfig::builder()
            .rasteriser(Arc::new(Pages(pages)))
            .recogniser(Arc::new(Echo))
            .build()
            .unwrap();
        Converter::new(&config)
    }

    fn files(dir: &Path, id: JobId) -> JobFiles {
        let upload = dir.join(format!("{id}.pdf"));
        std::fs::write(&upload, b"%PDF-1.4").unwrap();
        JobFiles {
            upload,
            output: dir.join(format!("{id}.docx")),
        }
    }

    #[tokio::test]
    async fn test_job_success() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JobRegistry::new();
        let id = registry.create();
        let files = files(dir.path(), id);
        let upload = files.upload.clone();

        let handle = spawn_job(&registry, &converter(3), id, files);
        let output = handle.wait().await.unwrap();

        let state = registry.snapshot(&id).unwrap();
        assert!(state.completed);
        assert_eq!(state.current, 3);
        assert_eq!(state.total, 3);
        assert_eq!(state.percentage(), 100);
        assert_eq!(state.status, "Conversion done.");
        assert_eq!(state.output_path.as_deref(), Some(output.as_path()));
        assert!(output.exists());
        assert!(!upload.exists());
    }

    #[tokio::test]
    async fn test_job_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JobRegistry::new();
        let id = registry.create();
        let files = JobFiles {
            upload: dir.path().join("missing.pdf"),
            output: dir.path().join("missing.docx"),
        };
        let output = files.output.clone();

        let err = spawn_job(&registry, &converter(1), id, files)
            .wait()
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::FileNotFound { .. }));

        let state = registry.wait_until_complete(&id).await.unwrap();
        assert!(state.completed);
        assert!(state.output_path.is_none());
        assert!(state.status.starts_with("Error: "));
        assert_eq!(state.failure_stage, Some(FailureStage::Other));
        assert!(!output.exists());
    }

    struct Panics;

    #[async_trait]
    impl TextRecogniser for Panics {
        async fn recognise(&self, _page: usize, _img: &DynamicImage) -> Result<String, Pdf2DocxError> {
            panic!("recogniser crashed");
        }
    }

    #[tokio::test]
    async fn test_panicking_engine_still_completes_job() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JobRegistry::new();
        let id = registry.create();
        let files = files(dir.path(), id);
        let (upload, output) = (files.upload.clone(), files.output.clone());

        let config = ConversionConfig::builder()
            .rasteriser(Arc::new(Pages(1)))
            .recogniser(Arc::new(Panics))
            .build()
            .unwrap();
        let err = spawn_job(&registry, &Converter::new(&config), id, files)
            .wait()
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2DocxError::Internal(_)));

        let state = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            registry.wait_until_complete(&id),
        )
        .await
        .expect("job completes")
        .unwrap();
        assert!(state.completed);
        assert!(state.status.starts_with("Error: "));
        assert_eq!(state.failure_stage, Some(FailureStage::Other));
        assert!(state.output_path.is_none());
        assert!(!upload.exists());
        assert!(!output.exists());

        assert_eq!(registry.sweep(std::time::Duration::ZERO).len(), 1);
    }

    #[tokio::test]
    async fn test_registry_progress_statuses() {
        let registry = JobRegistry::new();
        let id = registry.create();
        let progress = RegistryProgress::new(registry.clone(), id);

        progress.on_rasterise_start();
        assert_eq!(
            registry.snapshot(&id).unwrap().status,
            "Converting PDF to images..."
        );

        progress.on_conversion_start(4);
        let state = registry.snapshot(&id).unwrap();
        assert_eq!(state.status, "Performing OCR...");
        assert_eq!(state.total, 4);

        progress.on_page_complete(1, 4, 10);
        let state = registry.snapshot(&id).unwrap();
        assert_eq!(state.status, "Processing page 1 of 4");
        assert_eq!(state.percentage(), 25);
    }
}
