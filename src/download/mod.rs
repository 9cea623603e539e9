//! Download engine: everything between a validated job and a file on disk

pub mod cleanup;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod options;
pub mod progress;
pub mod ytdlp;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use error::DownloadError;
pub use metadata::{fetch_formats, FormatDescriptor, MediaInfo};
pub use options::JobOptions;
