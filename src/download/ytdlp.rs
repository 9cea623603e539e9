use crate::core::process::CommandRunner;

/// Query the installed yt-dlp version.
///
/// Returns `None` when the binary cannot be run; the server still starts, jobs
/// will then fail with a spawn error.
pub async fn ytdlp_version(runner: &dyn CommandRunner, ytdl_bin: &str) -> Option<String> {
    match runner.run(ytdl_bin, &["--version".to_string()], None).await {
        Ok(stdout) => {
            let version = stdout.trim().to_string();
            (!version.is_empty()).then_some(version)
        }
        Err(e) => {
            log::debug!("yt-dlp --version failed: {}", e);
            None
        }
    }
}

/// Log the yt-dlp version at startup.
pub async fn log_ytdlp_version(runner: &dyn CommandRunner, ytdl_bin: &str) {
    match ytdlp_version(runner, ytdl_bin).await {
        Some(version) => log::info!("Using {} version {}", ytdl_bin, version),
        None => log::warn!("Could not run '{}'; downloads will fail until it is installed", ytdl_bin),
    }
}
