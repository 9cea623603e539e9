//! mediarelay - media extraction server built around yt-dlp
//!
//! Clients open a WebSocket notification channel, query the available encodings
//! of a URL, then submit a download job and follow its progress on the channel.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, process execution, HTTP surface
//! - `download`: yt-dlp arguments, progress parsing, naming, metadata, cleanup
//! - `session`: session registry and notification payloads
//! - `jobs`: job validation and orchestration

pub mod cli;
pub mod core;
pub mod download;
pub mod jobs;
pub mod session;

// Re-export commonly used types for convenience
pub use crate::core::{AppError, AppResult, Config};
pub use jobs::{JobOrchestrator, JobSettings};
pub use session::{Notification, SessionRegistry};
