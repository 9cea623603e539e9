//! Metadata query: available encodings for a URL.
//!
//! One non-interactive `yt-dlp --dump-single-json` call, parsed into
//! [`MediaInfo`]. No session is involved; failures go straight back to the caller.

use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, AppResult};
use crate::core::process::CommandRunner;
use crate::download::error::DownloadError;

/// Title, thumbnail and encodings of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub thumbnail: Option<String>,
    pub formats: Vec<FormatDescriptor>,
}

/// Video-only, audio-only or muxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    VideoOnly,
    AudioOnly,
    Combined,
}

/// One encoding as reported by yt-dlp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<u64>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub fps: Option<f64>,
    /// Derived from `vcodec`/`acodec`; `None` for storyboards and other non-media entries
    #[serde(default)]
    pub kind: Option<FormatKind>,
}

impl FormatDescriptor {
    fn classify(&self) -> Option<FormatKind> {
        let has = |codec: &Option<String>| codec.as_deref().is_some_and(|c| !c.is_empty() && c != "none");
        match (has(&self.vcodec), has(&self.acodec)) {
            (true, true) => Some(FormatKind::Combined),
            (true, false) => Some(FormatKind::VideoOnly),
            (false, true) => Some(FormatKind::AudioOnly),
            (false, false) => None,
        }
    }
}

#[derive(Deserialize)]
struct RawInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<FormatDescriptor>,
}

/// Arguments for the metadata invocation.
pub fn build_metadata_args(url: &str) -> Vec<String> {
    ["--dump-single-json", "--no-playlist", "--no-warnings", "--skip-download", "--"]
        .into_iter()
        .map(String::from)
        .chain(std::iter::once(url.to_string()))
        .collect()
}

/// Parse yt-dlp's JSON dump.
pub fn parse_media_info(json: &str) -> AppResult<MediaInfo> {
    let raw: RawInfo = serde_json::from_str(json)?;
    let formats = raw
        .formats
        .into_iter()
        .map(|mut format| {
            format.kind = format.classify();
            format
        })
        .collect();

    Ok(MediaInfo {
        title: raw.title.unwrap_or_else(|| "Untitled".to_string()),
        thumbnail: raw.thumbnail,
        formats,
    })
}

/// Fetch title, thumbnail and format list for `url`.
pub async fn fetch_formats(runner: &dyn CommandRunner, ytdl_bin: &str, url: &str) -> AppResult<MediaInfo> {
    let args = build_metadata_args(url);
    log::debug!("yt-dlp metadata command: {} {}", ytdl_bin, args.join(" "));

    let stdout = runner.run(ytdl_bin, &args, None).await.map_err(|failure| {
        let err = DownloadError::from(failure);
        log::warn!("Metadata query for {} failed ({}): {}", url, err.subcategory(), err);
        AppError::Metadata(err.user_message())
    })?;

    parse_media_info(&stdout).map_err(|e| {
        log::warn!("Unreadable metadata for {}: {}", url, e);
        AppError::Metadata(format!("Unreadable metadata from yt-dlp: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "abc",
        "title": "Sample Clip",
        "thumbnail": "https://i.ytimg.com/vi/abc/hq.jpg",
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none", "format_note": "storyboard"},
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5, "filesize": 3400000},
            {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "resolution": "1920x1080", "fps": 30},
            {"format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "filesize_approx": 9000000}
        ]
    }"#;

    #[test]
    fn test_parse_media_info() {
        let info = parse_media_info(SAMPLE).unwrap();
        assert_eq!(info.title, "Sample Clip");
        assert_eq!(info.thumbnail.as_deref(), Some("https://i.ytimg.com/vi/abc/hq.jpg"));
        assert_eq!(info.formats.len(), 4);

        let kinds: Vec<_> = info.formats.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                None,
                Some(FormatKind::AudioOnly),
                Some(FormatKind::VideoOnly),
                Some(FormatKind::Combined)
            ]
        );
        assert_eq!(info.formats[1].filesize, Some(3_400_000));
        assert_eq!(info.formats[2].resolution.as_deref(), Some("1920x1080"));
    }

    #[test]
    fn test_parse_media_info_minimal() {
        let info = parse_media_info(r#"{"id": "x"}"#).unwrap();
        assert_eq!(info.title, "Untitled");
        assert!(info.formats.is_empty());
    }

    #[test]
    fn test_parse_media_info_rejects_garbage() {
        assert!(parse_media_info("not json").is_err());
    }

    #[test]
    fn test_build_metadata_args() {
        let args = build_metadata_args("https://youtu.be/abc");
        assert_eq!(args.first().map(String::as_str), Some("--dump-single-json"));
        assert!(args.iter().any(|a| a == "--no-playlist"));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }
}
