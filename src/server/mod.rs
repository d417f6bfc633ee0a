//! HTTP service: upload page, upload endpoint, progress polling, download.
//!
//! ```text
//! GET  /                    upload page
//! POST /upload              multipart field `pdf_file` → {success, message, job_id}
//! GET  /progress/{job_id}   {success, current, total, percentage, completed, status}
//! GET  /download/{job_id}   the .docx as an attachment
//! ```
//!
//! Uploads only start a job; the conversion runs on its own task and the
//! page polls `/progress` until the job reports `completed`.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::config::{ConversionConfig, ServerConfig};
use crate::convert::Converter;
use crate::jobs::spawn_sweeper;
use crate::pipeline::ocr::TesseractRecogniser;
use crate::pipeline::render::PdfiumRasteriser;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/progress/{job_id}", get(handlers::progress))
        .route("/download/{job_id}", get(handlers::download))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Outcome of the startup engine checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineReport {
    pub pdfium: bool,
    pub tesseract: bool,
}

impl EngineReport {
    pub fn ready(&self) -> bool {
        self.pdfium && self.tesseract
    }
}

/// Probe pdfium and tesseract and log what was found.
///
/// Never fails: a missing engine is logged and jobs fail at that stage.
pub async fn probe_engines(conversion: &ConversionConfig) -> EngineReport {
    let pdfium = match PdfiumRasteriser::from_config(conversion).probe().await {
        Ok(()) => {
            info!("pdfium: ready");
            true
        }
        Err(e) => {
            warn!("pdfium unavailable, every job will fail: {}", e);
            false
        }
    };

    let tesseract = match TesseractRecogniser::from_config(conversion).probe().await {
        Ok(probe) if probe.language_available => {
            info!("{}: '{}' model installed", probe.version, conversion.language);
            true
        }
        Ok(probe) => {
            warn!(
                "{} has no '{}' model, every job will fail",
                probe.version, conversion.language
            );
            false
        }
        Err(e) => {
            warn!("tesseract unavailable, every job will fail: {}", e);
            false
        }
    };

    EngineReport { pdfium, tesseract }
}

/// Run the service until Ctrl-C.
///
/// Probes the engines, creates the working directories, starts the
/// retention sweeper (unless retention is disabled) and serves on
/// `server.bind`.
pub async fn serve(conversion: &ConversionConfig, server: ServerConfig) -> std::io::Result<()> {
    probe_engines(conversion).await;

    tokio::fs::create_dir_all(&server.upload_dir).await?;
    tokio::fs::create_dir_all(&server.output_dir).await?;

    let state = AppState::new(Converter::new(conversion), &server);

    let sweeper = server.retention.map(|retention| {
        info!(
            "Finished jobs are kept for {}s (sweep every {}s)",
            retention.as_secs(),
            server.sweep_interval.as_secs()
        );
        spawn_sweeper(state.registry.clone(), retention, server.sweep_interval)
    });

    let listener = tokio::net::TcpListener::bind(server.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(task) = sweeper {
        task.abort();
    }
    info!("Server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = ConversionConfig::default();
        build_router(AppState::new(Converter::new(&config), &ServerConfig::default()))
    }

    async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_index_serves_upload_form() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("name=\"pdf_file\""));
        assert!(html.contains("/progress/"));
    }

    #[tokio::test]
    async fn test_progress_unknown_job() {
        let (status, body) = get(&format!("/progress/{}", uuid::Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid job ID.");
        assert!(json.get("current").is_none());
    }

    #[tokio::test]
    async fn test_progress_malformed_id() {
        let (_, body) = get("/progress/not-a-uuid").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_probe_reports_missing_tesseract() {
        let config = ConversionConfig::builder()
            .tesseract_path("/nonexistent/bin/tesseract")
            .build()
            .unwrap();
        let report = probe_engines(&config).await;
        assert!(!report.tesseract);
        assert!(!report.ready());
    }

    #[tokio::test]
    async fn test_download_unknown_job() {
        let (status, body) = get(&format!("/download/{}", uuid::Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Invalid job ID");
    }
}
