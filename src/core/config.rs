use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration defaults
pub mod server {
    /// Default HTTP port
    pub const DEFAULT_PORT: u16 = 3000;

    /// Route prefix under which finished artifacts are served
    pub const DOWNLOAD_ROUTE: &str = "/downloads";
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Delay before a finished artifact is deleted (in seconds)
    pub const FILE_RETENTION_SECS: u64 = 600; // 10 minutes

    /// Timeout for a single yt-dlp invocation (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 600;

    /// Default cap passed to yt-dlp as `--max-filesize`
    pub const MAX_FILESIZE: &str = "500M";

    /// Default artifact directory
    pub const DOWNLOAD_FOLDER: &str = "./downloads";

    /// Artifact retention duration
    pub fn retention() -> Duration {
        Duration::from_secs(FILE_RETENTION_SECS)
    }

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Runtime configuration, read once at startup.
///
/// Every value comes from an environment variable with a fallback default.
/// Malformed numeric values are logged and replaced by the default.
#[derive(Debug, Clone)]
pub struct Config {
    /// yt-dlp binary (`YTDL_BIN`)
    pub ytdl_bin: String,
    /// Artifact directory (`DOWNLOAD_FOLDER`, tilde expanded)
    pub download_folder: PathBuf,
    /// Listen address (`BIND_ADDR` + `PORT`)
    pub bind_addr: SocketAddr,
    /// Allowed CORS origin (`ALLOWED_ORIGIN`); `None` allows any origin
    pub allowed_origin: Option<String>,
    /// Artifact size cap forwarded to yt-dlp (`MAX_FILESIZE`)
    pub max_filesize: String,
    /// Wall-clock limit per process (`YTDLP_TIMEOUT_SECS`)
    pub process_timeout: Duration,
    /// Artifact lifetime after completion (`FILE_RETENTION_SECS`)
    pub file_retention: Duration,
    /// Optional file log sink (`LOG_FILE_PATH`)
    pub log_file_path: Option<String>,
    /// Log level (`LOG_LEVEL`)
    pub log_level: String,
    /// Problems found while reading the values, logged once the logger is up
    pub warnings: Vec<String>,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let download_folder = get("DOWNLOAD_FOLDER").unwrap_or_else(|| download::DOWNLOAD_FOLDER.to_string());
        let download_folder = PathBuf::from(shellexpand::tilde(&download_folder).into_owned());

        let mut warnings = Vec::new();
        let ip = parse_or_default(
            get("BIND_ADDR"),
            "BIND_ADDR",
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            &mut warnings,
        );
        let port = parse_or_default(get("PORT"), "PORT", server::DEFAULT_PORT, &mut warnings);

        let timeout_secs = parse_or_default(
            get("YTDLP_TIMEOUT_SECS"),
            "YTDLP_TIMEOUT_SECS",
            download::YTDLP_TIMEOUT_SECS,
            &mut warnings,
        );
        let retention_secs = parse_or_default(
            get("FILE_RETENTION_SECS"),
            "FILE_RETENTION_SECS",
            download::FILE_RETENTION_SECS,
            &mut warnings,
        );

        Self {
            ytdl_bin: get("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            download_folder,
            bind_addr: SocketAddr::new(ip, port),
            allowed_origin: get("ALLOWED_ORIGIN").filter(|origin| origin != "*"),
            max_filesize: get("MAX_FILESIZE").unwrap_or_else(|| download::MAX_FILESIZE.to_string()),
            process_timeout: Duration::from_secs(timeout_secs),
            file_retention: Duration::from_secs(retention_secs),
            log_file_path: get("LOG_FILE_PATH"),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            warnings,
        }
    }

    /// Emit the warnings collected while reading the configuration.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
    }

    /// Override the listen port (from the CLI).
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or_default<T: FromStr>(raw: Option<String>, key: &str, default: T, warnings: &mut Vec<String>) -> T {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warnings.push(format!("Ignoring invalid {}={:?}, using default", key, value));
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ytdl_bin, "yt-dlp");
        assert_eq!(config.bind_addr.port(), server::DEFAULT_PORT);
        assert_eq!(config.process_timeout, download::ytdlp_timeout());
        assert_eq!(config.file_retention, download::retention());
        assert_eq!(config.max_filesize, "500M");
        assert!(config.allowed_origin.is_none());
        assert!(config.log_file_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("YTDL_BIN", "/usr/local/bin/yt-dlp"),
            ("PORT", "8080"),
            ("YTDLP_TIMEOUT_SECS", "5"),
            ("FILE_RETENTION_SECS", "30"),
            ("ALLOWED_ORIGIN", "https://app.example.com"),
            ("DOWNLOAD_FOLDER", "/srv/media"),
        ]);
        assert_eq!(config.ytdl_bin, "/usr/local/bin/yt-dlp");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.process_timeout, Duration::from_secs(5));
        assert_eq!(config.file_retention, Duration::from_secs(30));
        assert_eq!(config.allowed_origin.as_deref(), Some("https://app.example.com"));
        assert_eq!(config.download_folder, PathBuf::from("/srv/media"));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("YTDLP_TIMEOUT_SECS", "-3")]);
        assert_eq!(config.bind_addr.port(), server::DEFAULT_PORT);
        assert_eq!(config.process_timeout, download::ytdlp_timeout());
        assert_eq!(
            config.warnings,
            vec![
                "Ignoring invalid PORT=\"not-a-port\", using default".to_string(),
                "Ignoring invalid YTDLP_TIMEOUT_SECS=\"-3\", using default".to_string(),
            ]
        );
    }

    #[test]
    fn test_valid_values_produce_no_warnings() {
        assert!(Config::default().warnings.is_empty());
    }

    #[test]
    fn test_wildcard_origin_means_any() {
        let config = config_from(&[("ALLOWED_ORIGIN", "*")]);
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn test_with_port() {
        let config = Config::default().with_port(9999);
        assert_eq!(config.bind_addr.port(), 9999);
    }
}
