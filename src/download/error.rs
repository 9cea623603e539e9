use std::time::Duration;
use thiserror::Error;

use crate::core::process::RunFailure;
use crate::download::ytdlp_errors::{analyze_ytdlp_error, get_error_message, last_diagnostic_line};

/// Structured error type for job execution.
///
/// Every variant ends the job in the `failed` state; none of them is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// yt-dlp was killed after exceeding the configured duration
    #[error("yt-dlp timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// yt-dlp exited with a nonzero code
    #[error("yt-dlp failed: {stderr}")]
    Execution { code: Option<i32>, stderr: String },
    /// yt-dlp could not be started
    #[error("failed to start yt-dlp: {0}")]
    Spawn(String),
    /// Started, but its output could not be read
    #[error("lost track of yt-dlp: {0}")]
    Io(String),

    /// Exit code 0, but the expected artifact is not on disk.
    /// `notice` is yt-dlp's own stdout explanation, when it printed one.
    #[error("expected output file not found: {path}")]
    ArtifactMissing { path: String, notice: Option<String> },
}

impl DownloadError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Execution { .. } => "execution",
            DownloadError::Spawn(_) => "spawn",
            DownloadError::Io(_) => "io",
            DownloadError::ArtifactMissing { .. } => "artifact_missing",
        }
    }

    /// Short, specific message for the `failed` notification.
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::Timeout(limit) => {
                format!("Download timed out after {} seconds", limit.as_secs())
            }
            DownloadError::Execution { stderr, .. } => {
                let summary = get_error_message(analyze_ytdlp_error(stderr));
                match last_diagnostic_line(stderr) {
                    Some(detail) => format!("{}: {}", summary, detail),
                    None => summary.to_string(),
                }
            }
            DownloadError::Spawn(_) => "Download tool could not be started".to_string(),
            DownloadError::Io(_) => "Lost contact with the download tool".to_string(),
            DownloadError::ArtifactMissing { notice: Some(notice), .. } => {
                format!("{}: {}", get_error_message(analyze_ytdlp_error(notice)), notice)
            }
            DownloadError::ArtifactMissing { notice: None, .. } => {
                "Download finished but the output file was not found".to_string()
            }
        }
    }
}

impl From<RunFailure> for DownloadError {
    fn from(failure: RunFailure) -> Self {
        match failure {
            RunFailure::Timeout(limit) => DownloadError::Timeout(limit),
            RunFailure::NonZeroExit { code, stderr } => DownloadError::Execution { code, stderr },
            RunFailure::Spawn(msg) => DownloadError::Spawn(msg),
            RunFailure::Io(msg) => DownloadError::Io(msg),
        }
    }
}
