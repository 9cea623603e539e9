//! Scripted command runner
//!
//! Replays a fixed set of stdout lines through the progress callback, optionally
//! creates the file named after `-o`, and returns a configured outcome.

#![allow(dead_code)]

use async_trait::async_trait;
use mediarelay::core::process::{CommandRunner, LineCallback, RunFailure, RunOutcome};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for the mock runner
#[derive(Debug, Clone)]
pub struct MockRunnerConfig {
    /// Lines replayed through the callback, in order
    pub lines: Vec<String>,
    /// Write a file at the `-o` path before returning
    pub create_output: bool,
    /// What the run returns
    pub outcome: RunOutcome,
    /// Simulated run duration
    pub delay: Duration,
}

impl Default for MockRunnerConfig {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            create_output: true,
            outcome: Ok(String::new()),
            delay: Duration::ZERO,
        }
    }
}

impl MockRunnerConfig {
    /// Successful download that reports a few progress lines
    pub fn success() -> Self {
        Self {
            lines: vec![
                "[youtube] abc: Downloading webpage".to_string(),
                "[download]  12.5% of 10.00MiB at 1.00MiB/s ETA 00:09".to_string(),
                "[download]  60.0% of 10.00MiB at 1.00MiB/s ETA 00:04".to_string(),
                "[download] 100.0% of 10.00MiB in 00:10".to_string(),
            ],
            ..Self::default()
        }
    }

    /// Exit code 0 without producing the artifact
    pub fn missing_output() -> Self {
        Self {
            create_output: false,
            ..Self::default()
        }
    }

    pub fn failing(failure: RunFailure) -> Self {
        Self {
            create_output: false,
            outcome: Err(failure),
            ..Self::default()
        }
    }

    /// Exit code 0, no artifact, and a size-limit notice on stdout
    pub fn too_large() -> Self {
        Self {
            lines: vec!["[download] File is larger than max-filesize (600000000 bytes > 524288000 bytes). Aborting.".to_string()],
            create_output: false,
            outcome: Ok("[youtube] abc: Downloading webpage\n\
                         [download] File is larger than max-filesize (600000000 bytes > 524288000 bytes). Aborting.\n"
                .to_string()),
            ..Self::default()
        }
    }

    /// Canned metadata JSON on stdout
    pub fn metadata(json: &str) -> Self {
        Self {
            create_output: false,
            outcome: Ok(json.to_string()),
            ..Self::default()
        }
    }
}

/// Records every invocation and replays [`MockRunnerConfig`].
#[derive(Debug, Default)]
pub struct MockRunner {
    config: MockRunnerConfig,
    calls: AtomicUsize,
    last_args: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new(config: MockRunnerConfig) -> Self {
        Self {
            config,
            calls: AtomicUsize::new(0),
            last_args: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_args(&self) -> Vec<String> {
        self.last_args.lock().unwrap().clone()
    }

    /// Resolve `-o` the way yt-dlp does for a template without fields.
    fn output_path(args: &[String]) -> Option<PathBuf> {
        args.iter()
            .position(|arg| arg == "-o")
            .and_then(|i| args.get(i + 1))
            .map(|template| PathBuf::from(template.replace("%%", "%")))
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, _program: &str, args: &[String], mut on_line: Option<LineCallback<'_>>) -> RunOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = args.to_vec();

        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        for line in &self.config.lines {
            if let Some(callback) = on_line.as_mut() {
                callback(line);
            }
        }

        if self.config.create_output {
            if let Some(path) = Self::output_path(args) {
                std::fs::write(path, b"media").unwrap();
            }
        }

        self.config.outcome.clone()
    }
}
