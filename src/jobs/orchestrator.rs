//! Job orchestration
//!
//! One job is one linear run: `received → preparing → running → completed | failed`.
//! Validation happens synchronously in [`JobOrchestrator::submit`]; everything after
//! that runs on its own task and ends in exactly one terminal notification.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::config::{self, Config};
use crate::core::error::AppResult;
use crate::core::process::CommandRunner;
use crate::download::cleanup::ArtifactReaper;
use crate::download::error::DownloadError;
use crate::download::naming::{sanitize_title, unique_name};
use crate::download::options::build_download_args;
use crate::download::progress::parse_progress;
use crate::download::ytdlp_errors::stdout_skip_notice;
use crate::jobs::request::{JobRequest, SubmitJobPayload};
use crate::session::{CompletedData, Notification, SessionRegistry};

/// Job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Received,
    Preparing,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Received => "received",
            JobState::Preparing => "preparing",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A produced output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Values the orchestrator needs from the configuration.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub ytdl_bin: String,
    pub download_dir: PathBuf,
    pub max_filesize: String,
    pub retention: Duration,
    /// URL prefix the artifact directory is served under
    pub download_route: String,
}

impl JobSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ytdl_bin: config.ytdl_bin.clone(),
            download_dir: config.download_folder.clone(),
            max_filesize: config.max_filesize.clone(),
            retention: config.file_retention,
            download_route: config::server::DOWNLOAD_ROUTE.to_string(),
        }
    }

    fn download_url(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.download_route.trim_end_matches('/'),
            urlencoding::encode(filename)
        )
    }
}

/// Drives jobs from validation to their terminal notification.
pub struct JobOrchestrator {
    sessions: Arc<SessionRegistry>,
    runner: Arc<dyn CommandRunner>,
    settings: JobSettings,
    reaper: ArtifactReaper,
}

impl JobOrchestrator {
    pub fn new(sessions: Arc<SessionRegistry>, runner: Arc<dyn CommandRunner>, settings: JobSettings) -> Self {
        Self {
            sessions,
            runner,
            settings,
            reaper: ArtifactReaper::new(),
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn reaper(&self) -> &ArtifactReaper {
        &self.reaper
    }

    /// Keep `filename` past its retention window. Returns `false` if no removal was pending.
    pub fn cancel_removal(&self, filename: &str) -> bool {
        self.reaper.cancel(&self.settings.download_dir.join(filename))
    }

    /// Validate `payload` and start the job in the background.
    ///
    /// Nothing is spawned when validation fails. The returned handle resolves to
    /// the job's final result; dropping it does not cancel the job.
    pub fn submit(self: &Arc<Self>, payload: SubmitJobPayload) -> AppResult<JoinHandle<Result<Artifact, DownloadError>>> {
        let job = payload.validate(&self.sessions)?;
        log::info!(
            "Job accepted for session {}: {} ({:?})",
            job.session_id,
            job.url,
            job.options
        );
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move { this.execute(job).await }))
    }

    /// Run an already validated job to completion on the current task.
    pub async fn execute(&self, job: JobRequest) -> Result<Artifact, DownloadError> {
        let session_id = job.session_id.as_str();
        self.transition(session_id, JobState::Received, JobState::Preparing);
        self.sessions.send(
            session_id,
            Notification::Status {
                message: format!("Preparing download of \"{}\"", job.title),
            },
        );

        let safe_title = sanitize_title(&job.title);
        let filename = unique_name(&self.settings.download_dir, &safe_title, job.options.output_extension());
        let output_path = self.settings.download_dir.join(&filename);
        let args = build_download_args(&job.options, &job.url, &output_path, &self.settings.max_filesize);
        log::debug!("yt-dlp command: {} {}", self.settings.ytdl_bin, args.join(" "));

        self.transition(session_id, JobState::Preparing, JobState::Running);
        let sessions = &self.sessions;
        let mut relay = |line: &str| {
            if let Some(progress) = parse_progress(line) {
                sessions.send(session_id, Notification::Progress { progress });
            }
        };
        let outcome = self.runner.run(&self.settings.ytdl_bin, &args, Some(&mut relay)).await;

        let result = match outcome {
            Ok(stdout) => match tokio::fs::try_exists(&output_path).await {
                Ok(true) => Ok(Artifact {
                    filename,
                    path: output_path,
                    created_at: Utc::now(),
                }),
                _ => Err(DownloadError::ArtifactMissing {
                    path: output_path.display().to_string(),
                    notice: stdout_skip_notice(&stdout).map(str::to_string),
                }),
            },
            Err(failure) => Err(DownloadError::from(failure)),
        };

        match &result {
            Ok(artifact) => {
                self.transition(session_id, JobState::Running, JobState::Completed);
                log::info!("Job for session {} produced {}", session_id, artifact.path.display());
                self.sessions.send(
                    session_id,
                    Notification::Completed {
                        data: CompletedData {
                            download_url: self.settings.download_url(&artifact.filename),
                            filename: artifact.filename.clone(),
                        },
                    },
                );
                self.reaper.schedule(artifact.path.clone(), self.settings.retention);
            }
            Err(e) => {
                self.transition(session_id, JobState::Running, JobState::Failed);
                log::warn!("Job for session {} failed ({}): {}", session_id, e.subcategory(), e);
                self.sessions.send(
                    session_id,
                    Notification::Failed {
                        message: e.user_message(),
                    },
                );
            }
        }

        result
    }

    fn transition(&self, session_id: &str, from: JobState, to: JobState) {
        log::debug!("Job [{}]: {} -> {}", session_id, from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_display() {
        assert_eq!(JobState::Received.to_string(), "received");
        assert_eq!(JobState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_download_url_is_percent_encoded() {
        let settings = JobSettings::from_config(&Config::default());
        assert_eq!(settings.download_url("My Clip (1).mp4"), "/downloads/My%20Clip%20%281%29.mp4");
    }
}
