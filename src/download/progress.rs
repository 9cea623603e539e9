//! yt-dlp progress line parsing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `[download]  42.5% of 10.00MiB at 1.00MiB/s ETA 00:05`
static PROGRESS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[download\]\s+([0-9]{1,3}\.[0-9]+)%\s+of\b").unwrap());

/// Extracts the completion percentage from a yt-dlp progress line.
///
/// Anything that is not a `[download] NN.N% of ...` line yields `None`; this is
/// the normal outcome for the tool's other chatter. The value is clamped to
/// `0.0..=100.0`.
///
/// # Example
///
/// ```
/// use mediarelay::download::progress::parse_progress;
///
/// assert_eq!(parse_progress("[download]  42.5% of 10.00MiB at 1.00MiB/s"), Some(42.5));
/// assert_eq!(parse_progress("[youtube] abc: Downloading webpage"), None);
/// ```
pub fn parse_progress(line: &str) -> Option<f64> {
    let caps = PROGRESS_REGEX.captures(line.trim_start())?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(percent.clamp(0.0, 100.0))
}
