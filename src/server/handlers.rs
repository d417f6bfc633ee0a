//! Route handlers.

use super::error::ApiError;
use super::state::AppState;
use crate::jobs::{spawn_job, JobId, JobProgress};
use crate::pipeline::docx::DOCX_MIME_TYPE;
use crate::pipeline::input;
use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, Response};
use axum::Json;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

/// Multipart field the upload form sends the PDF in.
pub const UPLOAD_FIELD: &str = "pdf_file";

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    #[serde(flatten)]
    pub progress: JobProgress,
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// POST /upload
///
/// The file name is checked before anything is read into memory or written,
/// so a rejected upload leaves no job and no file behind.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // A plain form field under the upload name is not a file part.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            return Err(ApiError::EmptyFilename);
        }
        if !input::is_pdf_filename(&file_name) {
            return Err(ApiError::NotAPdf);
        }

        data = Some(
            field
                .bytes()
                .await
                .map_err(|e| ApiError::Multipart(e.to_string()))?,
        );
        break;
    }

    let data = data.ok_or(ApiError::NoFile)?;

    let id = Uuid::new_v4();
    let files = state.job_files(&id);
    if let Err(e) = tokio::fs::write(&files.upload, &data).await {
        if let Err(rm) = tokio::fs::remove_file(&files.upload).await {
            if rm.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Job {}: could not remove partial upload {}: {}",
                    id,
                    files.upload.display(),
                    rm
                );
            }
        }
        return Err(ApiError::Internal(format!(
            "Could not store upload {}: {}",
            files.upload.display(),
            e
        )));
    }

    state.registry.register(id);
    info!("Job {}: accepted {} bytes", id, data.len());
    // Detached: the outcome is read back through the registry.
    spawn_job(&state.registry, &state.converter, id, files);

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully.".to_string(),
        job_id: id,
    }))
}

/// GET /progress/{job_id}
pub async fn progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let job = Uuid::parse_str(&job_id)
        .ok()
        .and_then(|id| state.registry.snapshot(&id))
        .ok_or(ApiError::UnknownJob)?;

    Ok(Json(ProgressResponse {
        success: true,
        progress: job.progress(),
    }))
}

/// GET /download/{job_id}
pub async fn download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = Uuid::parse_str(&job_id).map_err(|_| ApiError::UnknownDownload)?;
    let job = state
        .registry
        .snapshot(&id)
        .ok_or(ApiError::UnknownDownload)?;
    let path = job.output_path.ok_or(ApiError::OutputNotFound)?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Job {}: output {} is gone", id, path.display());
            return Err(ApiError::OutputNotFound);
        }
        Err(e) => return Err(ApiError::Internal(format!("Open {}: {}", path.display(), e))),
    };
    let len = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Stat {}: {}", path.display(), e)))?
        .len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, DOCX_MIME_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.docx\"", id),
        )
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(format!("Response build failed: {e}")))
}
