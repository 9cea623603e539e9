//! Mock implementations for integration testing
//!
//! Stand-ins for the external process so job flows can be exercised without
//! yt-dlp or network access.

pub mod mock_runner;

pub use mock_runner::{MockRunner, MockRunnerConfig};
