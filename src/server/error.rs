//! Error responses for the HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Everything a handler can answer with other than success.
///
/// Validation problems on upload and unknown ids on progress are reported
/// with status 200 and `success: false`, because the upload page reads the
/// JSON body instead of the status code. Download failures use real status
/// codes since that route is followed by the browser directly.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No PDF file provided.")]
    NoFile,

    #[error("No selected file.")]
    EmptyFilename,

    #[error("File is not a PDF.")]
    NotAPdf,

    #[error("Invalid job ID.")]
    UnknownJob,

    /// Unknown id on the download route.
    #[error("Invalid job ID")]
    UnknownDownload,

    #[error("File not found")]
    OutputNotFound,

    #[error("Malformed upload: {0}")]
    Multipart(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub(crate) struct FailureBody {
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::EmptyFilename | ApiError::NotAPdf | ApiError::UnknownJob => {
                StatusCode::OK
            }
            ApiError::UnknownDownload | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::OutputNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::UnknownDownload | ApiError::OutputNotFound => {
                (status, self.to_string()).into_response()
            }
            _ => {
                if status.is_server_error() {
                    tracing::error!("{}", self);
                }
                let body = Json(FailureBody {
                    success: false,
                    message: self.to_string(),
                });
                (status, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_200() {
        assert_eq!(ApiError::NoFile.status_code(), StatusCode::OK);
        assert_eq!(ApiError::EmptyFilename.status_code(), StatusCode::OK);
        assert_eq!(ApiError::NotAPdf.status_code(), StatusCode::OK);
        assert_eq!(ApiError::UnknownJob.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_download_errors_use_status_codes() {
        assert_eq!(ApiError::UnknownDownload.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::OutputNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NoFile.to_string(), "No PDF file provided.");
        assert_eq!(ApiError::EmptyFilename.to_string(), "No selected file.");
        assert_eq!(ApiError::NotAPdf.to_string(), "File is not a PDF.");
        assert_eq!(ApiError::UnknownJob.to_string(), "Invalid job ID.");
        assert_eq!(ApiError::UnknownDownload.to_string(), "Invalid job ID");
        assert_eq!(ApiError::OutputNotFound.to_string(), "File not found");
    }
}
