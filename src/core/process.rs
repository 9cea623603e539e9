//! Process execution with timeout support
//!
//! Runs one external command (yt-dlp) per call with a wall-clock limit. Standard
//! output is read line by line so callers can observe progress while the process
//! is still running; standard error is accumulated for diagnostics.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Why a process run did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    /// Killed after exceeding the configured limit
    #[error("process timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Exited normally with a nonzero code; carries trimmed stderr
    #[error("process exited with {}: {stderr}", code.map_or_else(|| "signal".to_string(), |c| format!("code {}", c)))]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// Could not be started (binary missing, permission denied, ...)
    #[error("failed to start process: {0}")]
    Spawn(String),

    /// Started, but reading its output or waiting on it failed
    #[error("lost track of process: {0}")]
    Io(String),
}

/// Result of one external process invocation: captured stdout on success.
pub type RunOutcome = Result<String, RunFailure>;

/// Per-line stdout observer.
pub type LineCallback<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Executes external commands.
///
/// The job orchestrator and the metadata query depend on this seam rather than on
/// `tokio::process` directly.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with a discrete argument vector (no shell involved).
    async fn run(&self, program: &str, args: &[String], on_line: Option<LineCallback<'_>>) -> RunOutcome;
}

/// Real runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String], on_line: Option<LineCallback<'_>>) -> RunOutcome {
        run_with_timeout(program, args, self.timeout, on_line).await
    }
}

/// Spawn `program`, stream its stdout through `on_line` and wait at most `timeout`.
///
/// On timeout the child is killed and reaped before returning, and no further
/// output is delivered.
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
    mut on_line: Option<LineCallback<'_>>,
) -> RunOutcome {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so the tool's helpers (ffmpeg) can be killed with it
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command
        .spawn()
        .map_err(|e| {
            log::error!("Failed to spawn {}: {}", program, e);
            RunFailure::Spawn(e.to_string())
        })?;

    let stdout = child.stdout.take();
    let mut stderr_task: JoinHandle<String> = match child.stderr.take() {
        Some(stderr) => tokio::spawn(collect_lines(stderr)),
        None => tokio::spawn(async { String::new() }),
    };

    let drive = async {
        let mut captured = String::new();
        if let Some(stdout) = stdout {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            while let Some(line) = next_lossy_line(&mut reader, &mut buf).await? {
                if let Some(callback) = on_line.as_mut() {
                    callback(&line);
                }
                captured.push_str(&line);
                captured.push('\n');
            }
        }
        let status = child.wait().await?;
        let stderr_text = (&mut stderr_task).await.unwrap_or_default();
        Ok::<(ExitStatus, String, String), std::io::Error>((status, captured, stderr_text))
    };

    let result = tokio::time::timeout(timeout, drive).await;
    match result {
        Ok(Ok((status, captured, stderr_text))) => {
            if status.success() {
                Ok(captured)
            } else {
                log::debug!("{} exited with {:?}", program, status.code());
                Err(RunFailure::NonZeroExit {
                    code: status.code(),
                    stderr: stderr_text.trim().to_string(),
                })
            }
        }
        Ok(Err(e)) => {
            log::error!("I/O error while running {}: {}", program, e);
            stderr_task.abort();
            kill_process_group(&child);
            let _ = child.kill().await;
            Err(RunFailure::Io(e.to_string()))
        }
        Err(_) => {
            log::error!("{} timed out after {}s, killing", program, timeout.as_secs());
            stderr_task.abort();
            kill_process_group(&child);
            // kill() also waits, so the child is reaped here
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill timed out {}: {}", program, e);
            }
            Err(RunFailure::Timeout(timeout))
        }
    }
}

/// SIGKILL every process in the child's group.
///
/// Must run before the child is reaped: the group id is the child's pid.
#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_process_group(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; no memory is shared with the callee
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        log::debug!("killpg({}) failed: {}", pgid, std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

/// Read one `\n`-terminated line, decoding invalid UTF-8 lossily.
async fn next_lossy_line<R>(reader: &mut BufReader<R>, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

async fn collect_lines<R>(stream: R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut collected = String::new();
    while let Ok(Some(line)) = next_lossy_line(&mut reader, &mut buf).await {
        log::trace!("stderr: {}", line);
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_failure_display() {
        assert_eq!(
            RunFailure::Timeout(Duration::from_secs(5)).to_string(),
            "process timed out after 5s"
        );
        let exit = RunFailure::NonZeroExit {
            code: Some(2),
            stderr: "ERROR: nope".into(),
        };
        assert_eq!(exit.to_string(), "process exited with code 2: ERROR: nope");
        let killed = RunFailure::NonZeroExit {
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
        assert_eq!(
            RunFailure::Io("broken pipe".into()).to_string(),
            "lost track of process: broken pipe"
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_for_missing_binary() {
        let outcome = run_with_timeout(
            "definitely-not-a-real-binary-4821",
            &[],
            Duration::from_secs(5),
            None,
        )
        .await;
        assert!(matches!(outcome, Err(RunFailure::Spawn(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lossy_decoding_of_invalid_utf8() {
        let args = vec!["-c".to_string(), r"printf 'ok\377\n'".to_string()];
        let outcome = run_with_timeout("sh", &args, Duration::from_secs(5), None).await;
        let stdout = outcome.unwrap();
        assert!(stdout.starts_with("ok"));
    }
}
