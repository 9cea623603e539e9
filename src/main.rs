use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;

use mediarelay::cli::{Cli, Commands};
use mediarelay::core::process::{CommandRunner, ProcessRunner};
use mediarelay::core::web_server::{start_web_server, AppState};
use mediarelay::core::{init_logger, Config};
use mediarelay::download::metadata::{fetch_formats, MediaInfo};
use mediarelay::download::ytdlp::log_ytdlp_version;
use mediarelay::jobs::{JobOrchestrator, JobSettings};
use mediarelay::session::SessionRegistry;

/// Main entry point
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, artifact directory, bind).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // .env must be loaded before the configuration is read
    let _ = dotenv();
    let config = Config::from_env();

    init_logger(&config)?;
    config.log_warnings();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {}", panic_info);
    }));

    match cli.command {
        Some(Commands::Serve { port }) => {
            let config = match port {
                Some(port) => config.with_port(port),
                None => config,
            };
            run_server(config).await
        }
        Some(Commands::Info { url, json }) => run_info(config, url, json).await,
        None => {
            log::info!("No command specified, running server");
            run_server(config).await
        }
    }
}

/// Compose the registry, runner and orchestrator and serve until Ctrl+C.
async fn run_server(config: Config) -> Result<()> {
    std::fs::create_dir_all(&config.download_folder).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create download folder {}: {}",
            config.download_folder.display(),
            e
        )
    })?;
    log::info!("Artifacts stored in {}", config.download_folder.display());
    log::info!(
        "Process timeout {}s, artifact retention {}s, max file size {}",
        config.process_timeout.as_secs(),
        config.file_retention.as_secs(),
        config.max_filesize
    );

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(config.process_timeout));
    log_ytdlp_version(runner.as_ref(), &config.ytdl_bin).await;

    let sessions = Arc::new(SessionRegistry::new());
    let orchestrator = Arc::new(JobOrchestrator::new(
        Arc::clone(&sessions),
        Arc::clone(&runner),
        JobSettings::from_config(&config),
    ));

    let state = AppState {
        sessions,
        orchestrator,
        runner,
        ytdl_bin: config.ytdl_bin.clone(),
    };

    tokio::select! {
        result = start_web_server(state, &config) => result,
        _ = signal::ctrl_c() => {
            log::info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}

/// Run the metadata query once and print the result.
async fn run_info(config: Config, url: String, json: bool) -> Result<()> {
    let runner = ProcessRunner::new(config.process_timeout);
    let info = fetch_formats(&runner, &config.ytdl_bin, &url).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_formats(&info);
    }
    Ok(())
}

fn print_formats(info: &MediaInfo) {
    println!("Title:     {}", info.title);
    if let Some(thumbnail) = &info.thumbnail {
        println!("Thumbnail: {}", thumbnail);
    }
    println!();
    println!("{:<14} {:<6} {:<12} {:<16} {:<16} {:>10}", "ID", "EXT", "RESOLUTION", "VCODEC", "ACODEC", "SIZE");
    for format in &info.formats {
        let size = format
            .filesize
            .or(format.filesize_approx)
            .map(|bytes| format!("{:.1}MiB", bytes as f64 / (1024.0 * 1024.0)))
            .unwrap_or_default();
        println!(
            "{:<14} {:<6} {:<12} {:<16} {:<16} {:>10}",
            format.format_id,
            format.ext.as_deref().unwrap_or("-"),
            format.resolution.as_deref().unwrap_or("-"),
            format.vcodec.as_deref().unwrap_or("-"),
            format.acodec.as_deref().unwrap_or("-"),
            size
        );
    }
}
