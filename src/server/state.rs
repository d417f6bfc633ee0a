//! Shared handler state.

use crate::config::ServerConfig;
use crate::convert::Converter;
use crate::jobs::{JobFiles, JobId, JobRegistry};
use std::path::PathBuf;

/// Injected into every handler via axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: JobRegistry,
    pub converter: Converter,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(converter: Converter, config: &ServerConfig) -> Self {
        Self {
            registry: JobRegistry::new(),
            converter,
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// `<upload_dir>/<id>.pdf` and `<output_dir>/<id>.docx`.
    pub fn job_files(&self, id: &JobId) -> JobFiles {
        JobFiles {
            upload: self.upload_dir.join(format!("{id}.pdf")),
            output: self.output_dir.join(format!("{id}.docx")),
        }
    }
}
