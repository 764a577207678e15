use std::fmt;
use std::path::{Path, PathBuf};

const AUDIO_QUALITIES: [&str; 4] = ["128", "192", "256", "320"];
const VIDEO_QUALITIES: [&str; 5] = ["480", "720", "1080", "1440", "2160"];

/// Target container the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFormat {
    /// MP3 audio, quality is a bitrate in kbps
    #[default]
    Audio,
    /// MP4 video, quality is a maximum height in pixels
    Video,
}

impl MediaFormat {
    pub const ALL: [MediaFormat; 2] = [MediaFormat::Audio, MediaFormat::Video];

    pub fn standard_qualities(self) -> &'static [&'static str] {
        match self {
            MediaFormat::Audio => &AUDIO_QUALITIES,
            MediaFormat::Video => &VIDEO_QUALITIES,
        }
    }

    pub fn default_quality(self) -> &'static str {
        match self {
            MediaFormat::Audio => "192",
            MediaFormat::Video => "1080",
        }
    }

    pub fn quality_label(self) -> &'static str {
        match self {
            MediaFormat::Audio => "Quality (kbps)",
            MediaFormat::Video => "Max resolution (px)",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFormat::Audio => write!(f, "MP3"),
            MediaFormat::Video => write!(f, "MP4"),
        }
    }
}

/// Everything needed to configure one download. Rebuilt on every click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    format: MediaFormat,
    quality: String,
    output_dir: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl RequestConfig {
    pub fn new(
        format: MediaFormat,
        quality: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        ffmpeg_location: Option<PathBuf>,
    ) -> Self {
        Self {
            format,
            quality: quality.into(),
            output_dir: output_dir.into(),
            ffmpeg_location,
        }
    }

    pub fn format(&self) -> MediaFormat {
        self.format
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn ffmpeg_location(&self) -> Option<&Path> {
        self.ffmpeg_location.as_deref()
    }
}

/// Phase reported by the external downloader's hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Downloading,
    PostProcessing,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    /// 0.0 to 100.0
    pub percent: f32,
    /// Only set once the whole download has completed
    pub file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Probing,
    Downloading,
    Converting,
    Completed,
    Failed,
}
