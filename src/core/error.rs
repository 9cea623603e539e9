use thiserror::Error;

use crate::download::error::DownloadError;

/// Centralized error types for the application
///
/// Job-phase failures never surface here: the orchestrator converts them into a
/// terminal `failed` notification. `AppError` covers what is reported
/// synchronously to a caller (request validation, metadata queries, startup).
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid request fields, aggregated
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Metadata query failed (process failure or unreadable tool output)
    #[error("Metadata fetch failed: {0}")]
    Metadata(String),

    /// Download/yt-dlp errors
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Field names reported by a validation failure; empty for other kinds.
    pub fn invalid_fields(&self) -> &[String] {
        match self {
            AppError::Validation(fields) => fields,
            _ => &[],
        }
    }
}
