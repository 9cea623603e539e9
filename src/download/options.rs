//! Encoding options for a job and the yt-dlp argument vector built from them.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Format selector for simple video jobs: best mp4 video+audio, then best mp4, then best overall
pub const SIMPLE_VIDEO_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// yt-dlp `--audio-quality` value for the best VBR tier
pub const BEST_AUDIO_QUALITY: &str = "0";

/// What the client asked to produce.
///
/// Deserialized from `{"type": "simple" | "expert_video" | "expert_audio", ...}`;
/// any other discriminator is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobOptions {
    /// Shorthand: `mp3` extracts audio, anything else fetches best video+audio
    Simple { ext: String },
    /// Exact video and audio format ids, merged into mp4
    ExpertVideo { vcodec_id: String, acodec_id: String },
    /// Exact audio format id, converted to `ext`
    ExpertAudio {
        acodec_id: String,
        ext: String,
        #[serde(default, deserialize_with = "string_or_number")]
        audio_quality: Option<String>,
    },
}

impl JobOptions {
    /// Extension of the produced artifact.
    pub fn output_extension(&self) -> &str {
        match self {
            JobOptions::Simple { ext } | JobOptions::ExpertAudio { ext, .. } => ext,
            JobOptions::ExpertVideo { .. } => "mp4",
        }
    }

    /// Names of fields that are blank or malformed, prefixed with `options.`.
    pub fn invalid_fields(&self) -> Vec<String> {
        let mut invalid = Vec::new();
        match self {
            JobOptions::Simple { ext } => {
                check_extension(ext, &mut invalid);
            }
            JobOptions::ExpertVideo { vcodec_id, acodec_id } => {
                check_format_id("vcodec_id", vcodec_id, &mut invalid);
                check_format_id("acodec_id", acodec_id, &mut invalid);
            }
            JobOptions::ExpertAudio {
                acodec_id,
                ext,
                audio_quality,
            } => {
                check_format_id("acodec_id", acodec_id, &mut invalid);
                check_extension(ext, &mut invalid);
                if audio_quality.as_deref().is_some_and(|q| q.trim().is_empty()) {
                    invalid.push("options.audio_quality".to_string());
                }
            }
        }
        invalid
    }
}

fn check_extension(ext: &str, invalid: &mut Vec<String>) {
    let ok = !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    if !ok {
        invalid.push("options.ext".to_string());
    }
}

fn check_format_id(field: &str, id: &str, invalid: &mut Vec<String>) {
    // yt-dlp format ids look like `137`, `251-drc`, `hls-1080p`, `dash_a1`
    let ok = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !ok {
        invalid.push(format!("options.{}", field));
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

/// `-o` is an output template: `%` starts a field, so literal ones are doubled.
pub fn output_template(output_path: &Path) -> String {
    output_path.to_string_lossy().replace('%', "%%")
}

/// Build the full yt-dlp argument vector for one job.
///
/// Every job targets exactly one resource (`--no-playlist`) and writes to
/// `output_path`. The URL goes after `--` so it can never be read as an option.
pub fn build_download_args(options: &JobOptions, url: &str, output_path: &Path, max_filesize: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--newline".into(),
        "--no-playlist".into(),
        "--max-filesize".into(),
        max_filesize.into(),
        "-o".into(),
        output_template(output_path),
    ];

    match options {
        JobOptions::Simple { ext } if ext == "mp3" => {
            args.extend(
                ["--extract-audio", "--audio-format", "mp3", "--audio-quality", BEST_AUDIO_QUALITY]
                    .map(String::from),
            );
        }
        JobOptions::Simple { .. } => {
            args.extend(["--format", SIMPLE_VIDEO_FORMAT].map(String::from));
        }
        JobOptions::ExpertVideo { vcodec_id, acodec_id } => {
            args.push("--format".into());
            args.push(format!("{}+{}", vcodec_id, acodec_id));
            args.extend(["--merge-output-format", "mp4"].map(String::from));
        }
        JobOptions::ExpertAudio {
            acodec_id,
            ext,
            audio_quality,
        } => {
            args.push("--format".into());
            args.push(acodec_id.clone());
            args.extend(["--extract-audio", "--audio-format"].map(String::from));
            args.push(ext.clone());
            if let Some(quality) = audio_quality {
                args.push("--audio-quality".into());
                args.push(quality.clone());
            }
        }
    }

    args.push("--".into());
    args.push(url.to_string());
    args
}
