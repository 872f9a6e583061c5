use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Everything that can go wrong between job submission and byte delivery.
/// Each variant keeps its own HTTP mapping; none is collapsed into a
/// generic failure on the way out.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("job submission failed: {0}")]
    SubmissionFailed(String),
    #[error("synthesis job failed: {0}")]
    JobFailed(String),
    #[error("synthesis deadline of {0:?} exceeded")]
    Timeout(Duration),
    #[error("result is not video: {0}")]
    UnexpectedContentType(String),
    #[error("no audio stream in {}", .0.display())]
    MissingAudioTrack(PathBuf),
    #[error("result download failed: {0}")]
    Download(String),
    #[error("media inspection failed: {0}")]
    Inspection(String),
    #[error("media not found: {0}")]
    NotFound(String),
    #[error("unsatisfiable range {spec:?} for {size} bytes")]
    InvalidRange { spec: String, size: u64 },
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind carried in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::SubmissionFailed(_) => "submission_failed",
            AppError::JobFailed(_) => "job_failed",
            AppError::Timeout(_) => "timeout",
            AppError::UnexpectedContentType(_) => "unexpected_content_type",
            AppError::MissingAudioTrack(_) => "missing_audio_track",
            AppError::Download(_) => "download_failed",
            AppError::Inspection(_) => "inspection_failed",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidRange { .. } => "invalid_range",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRange { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::SubmissionFailed(_)
            | AppError::JobFailed(_)
            | AppError::UnexpectedContentType(_)
            | AppError::MissingAudioTrack(_)
            | AppError::Download(_) => StatusCode::BAD_GATEWAY,
            AppError::Inspection(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.kind(),
            message: self.to_string(),
        });
        if let AppError::InvalidRange { size, .. } = &self {
            // RFC 9110: 416 carries the actual resource size
            return (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{}", size))],
                body,
            )
                .into_response();
        }
        (status, body).into_response()
    }
}
