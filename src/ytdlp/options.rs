use std::path::PathBuf;

use serde::Serialize;

use super::models::LINE_PREFIX;
use crate::domain::{MediaFormat, RequestConfig};

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
const AUDIO_CODEC: &str = "mp3";
const VIDEO_CONTAINER: &str = "mp4";

/// Option set handed to yt-dlp. Field names follow yt-dlp's own option keys
/// so the JSON form can be compared against its documentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadOptions {
    pub outtmpl: String,
    pub format: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub postprocessors: Vec<PostProcessor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_output_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_location: Option<PathBuf>,
    pub quiet: bool,
    /// Suppresses the human progress bar; the machine template replaces it.
    pub noprogress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostProcessor {
    pub key: String,
    pub preferredcodec: String,
    pub preferredquality: String,
}

impl DownloadOptions {
    /// Maps a request onto yt-dlp options. Pure, never fails.
    pub fn build(request: &RequestConfig) -> Self {
        let outtmpl = request
            .output_dir()
            .join(OUTPUT_TEMPLATE)
            .to_string_lossy()
            .into_owned();

        let (format, postprocessors, merge_output_format) = match request.format() {
            MediaFormat::Audio => (
                "bestaudio/best".to_string(),
                vec![PostProcessor {
                    key: "FFmpegExtractAudio".to_string(),
                    preferredcodec: AUDIO_CODEC.to_string(),
                    preferredquality: request.quality().to_string(),
                }],
                None,
            ),
            MediaFormat::Video => (
                format!("bestvideo[height<={}]+bestaudio/best", request.quality()),
                Vec::new(),
                Some(VIDEO_CONTAINER.to_string()),
            ),
        };

        Self {
            outtmpl,
            format,
            postprocessors,
            merge_output_format,
            ffmpeg_location: request.ffmpeg_location().map(|p| p.to_path_buf()),
            quiet: true,
            noprogress: true,
        }
    }

    /// Command line equivalent of this option set, without the URL
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            self.outtmpl.clone(),
            "-f".to_string(),
            self.format.clone(),
        ];

        for pp in &self.postprocessors {
            if pp.key == "FFmpegExtractAudio" {
                args.extend([
                    "-x".to_string(),
                    "--audio-format".to_string(),
                    pp.preferredcodec.clone(),
                    "--audio-quality".to_string(),
                    format!("{}K", pp.preferredquality),
                ]);
            }
        }

        if let Some(container) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }

        if let Some(location) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(location.to_string_lossy().into_owned());
        }

        if self.quiet {
            args.push("--quiet".to_string());
        }

        // --progress re-enables reporting under --quiet, routed through the templates
        args.extend([
            "--progress".to_string(),
            "--newline".to_string(),
            "--no-colors".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{}|download|%(progress.status)s|%(progress._percent_str)s|%(progress.filename)s",
                LINE_PREFIX
            ),
            "--progress-template".to_string(),
            format!(
                "postprocess:{}|postprocess|%(progress.status)s|%(progress.postprocessor)s|%(info.filepath)s",
                LINE_PREFIX
            ),
            "--print".to_string(),
            format!("after_move:{}|moved|%(filepath)s", LINE_PREFIX),
        ]);

        args
    }
}
