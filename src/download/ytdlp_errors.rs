//! yt-dlp stderr analysis
//!
//! Classifies raw diagnostic output into a handful of kinds so the failure
//! notification can say something more specific than "it failed".

/// Kinds of yt-dlp failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YtDlpErrorType {
    /// Private, removed or region-blocked media
    VideoUnavailable,
    /// Site refused the request (403, bot check, sign-in wall)
    BotDetection,
    /// Timeouts, DNS, connection resets
    NetworkError,
    /// No extractor for the URL
    UnsupportedUrl,
    /// Larger than the configured `--max-filesize`
    FileTooLarge,
    /// The requested format id does not exist for this media
    FormatUnavailable,
    /// Anything else
    Unknown,
}

/// Determine the error kind from yt-dlp's stderr.
pub fn analyze_ytdlp_error(stderr: &str) -> YtDlpErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("file is larger than max-filesize") || stderr_lower.contains("max-filesize") {
        return YtDlpErrorType::FileTooLarge;
    }

    if stderr_lower.contains("requested format is not available") || stderr_lower.contains("format not available") {
        return YtDlpErrorType::FormatUnavailable;
    }

    if stderr_lower.contains("unsupported url") || stderr_lower.contains("is not a valid url") {
        return YtDlpErrorType::UnsupportedUrl;
    }

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video has been removed")
        || stderr_lower.contains("this video does not exist")
        || stderr_lower.contains("not available in your country")
    {
        return YtDlpErrorType::VideoUnavailable;
    }

    if stderr_lower.contains("sign in to confirm you're not a bot")
        || stderr_lower.contains("http error 403")
        || stderr_lower.contains("please sign in")
    {
        return YtDlpErrorType::BotDetection;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("name or service not known")
        || stderr_lower.contains("temporary failure in name resolution")
    {
        return YtDlpErrorType::NetworkError;
    }

    YtDlpErrorType::Unknown
}

/// Short user-facing message for an error kind.
pub fn get_error_message(error_type: YtDlpErrorType) -> &'static str {
    match error_type {
        YtDlpErrorType::VideoUnavailable => "The media is unavailable (private, removed or region-blocked)",
        YtDlpErrorType::BotDetection => "The site refused the request; try again later",
        YtDlpErrorType::NetworkError => "Network problem while downloading; try again in a minute",
        YtDlpErrorType::UnsupportedUrl => "This URL is not supported",
        YtDlpErrorType::FileTooLarge => "The file exceeds the maximum allowed size",
        YtDlpErrorType::FormatUnavailable => "The requested format is not available for this media",
        YtDlpErrorType::Unknown => "Download failed",
    }
}

/// Last meaningful line of stderr, usually the `ERROR: ...` summary.
pub fn last_diagnostic_line(stderr: &str) -> Option<&str> {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().map(str::trim).find(|line| !line.is_empty()))
}

/// Notice yt-dlp printed to stdout when it exited 0 without writing the file.
///
/// Size-limit and similar skips go to stdout as `[download] ...` lines, not to
/// stderr, so they are looked for among recognized `[download]` lines only.
pub fn stdout_skip_notice(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with("[download]") && analyze_ytdlp_error(line) != YtDlpErrorType::Unknown)
}
