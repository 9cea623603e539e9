//! Logging initialization
//!
//! Console output always; an additional plain file sink when `LOG_FILE_PATH`
//! is configured.

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::Config;

/// Parse a textual level, falling back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize logger for console and (optionally) file output
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Log file could not be created or a logger is already set
pub fn init_logger(config: &Config) -> Result<()> {
    let level = parse_level(&config.log_level);
    let log_config = ConfigBuilder::new()
        .add_filter_allow_str("mediarelay")
        .add_filter_allow_str("tower_http")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = &config.log_file_path {
        let log_file = File::create(path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
        loggers.push(WriteLogger::new(level, log_config, log_file));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}
