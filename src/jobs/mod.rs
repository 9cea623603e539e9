//! Job submission and execution.

pub mod orchestrator;
pub mod request;

pub use orchestrator::{Artifact, JobOrchestrator, JobSettings, JobState};
pub use request::{JobRequest, SubmitJobPayload};
