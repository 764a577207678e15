use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::ProgressPhase;

/// Prefix yt-dlp is told to put in front of every machine-readable line
pub const LINE_PREFIX: &str = "ytsd";

/// One progress callback from yt-dlp, still in its raw string form
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressHook {
    pub phase: ProgressPhase,
    /// e.g. `" 42.3%"`, may be `NA` or carry colour escapes
    pub percent: Option<String>,
    pub filename: Option<PathBuf>,
}

impl ProgressHook {
    /// Parses a line emitted through our `--progress-template` / `--print`
    /// arguments. Any other output line yields `None`.
    ///
    /// Layouts:
    /// - `ytsd|download|<status>|<percent>|<filename>`
    /// - `ytsd|postprocess|<status>|<postprocessor>|<filepath>`
    /// - `ytsd|moved|<filepath>`
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.trim_end().strip_prefix(LINE_PREFIX)?.strip_prefix('|')?;
        let (kind, rest) = rest.split_once('|')?;

        match kind {
            "download" => {
                let mut parts = rest.splitn(3, '|');
                let status = parts.next()?;
                let percent = parts.next();
                let filename = parts.next();
                // A merged video finishes one stream at a time; only the final
                // `moved` line ends the whole download.
                let percent = match status {
                    "downloading" => percent.and_then(field),
                    "finished" => Some("100%".to_string()),
                    _ => return None,
                };
                Some(Self {
                    phase: ProgressPhase::Downloading,
                    percent,
                    filename: filename.and_then(field).map(PathBuf::from),
                })
            }
            "postprocess" => {
                let mut parts = rest.splitn(3, '|');
                let _status = parts.next()?;
                let _postprocessor = parts.next();
                let filepath = parts.next();
                Some(Self {
                    phase: ProgressPhase::PostProcessing,
                    percent: None,
                    filename: filepath.and_then(field).map(PathBuf::from),
                })
            }
            "moved" => Some(Self {
                phase: ProgressPhase::Finished,
                percent: None,
                filename: field(rest).map(PathBuf::from),
            }),
            _ => None,
        }
    }
}

/// yt-dlp renders missing template fields as `NA`
fn field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "NA" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Subset of `yt-dlp -J` output used for quality probing
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub vcodec: Option<String>,
}

impl VideoInfo {
    /// Tallest stream that actually carries video
    pub fn max_height(&self) -> Option<u32> {
        self.formats
            .iter()
            .filter(|f| f.vcodec.as_deref() != Some("none"))
            .filter_map(|f| f.height)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_line() {
        let hook =
            ProgressHook::parse_line("ytsd|download|downloading| 42.5%|/tmp/Song.webm").unwrap();
        assert_eq!(hook.phase, ProgressPhase::Downloading);
        assert_eq!(hook.percent.as_deref(), Some("42.5%"));
        assert_eq!(hook.filename, Some(PathBuf::from("/tmp/Song.webm")));
    }

    #[test]
    fn test_stream_finished_is_not_overall_finish() {
        let hook =
            ProgressHook::parse_line("ytsd|download|finished|NA|/v/clip.f137.mp4").unwrap();
        assert_eq!(hook.phase, ProgressPhase::Downloading);
        assert_eq!(hook.percent.as_deref(), Some("100%"));
        assert_eq!(hook.filename, Some(PathBuf::from("/v/clip.f137.mp4")));
    }

    #[test]
    fn test_parse_missing_fields() {
        let hook = ProgressHook::parse_line("ytsd|download|downloading|NA|NA").unwrap();
        assert_eq!(hook.percent, None);
        assert_eq!(hook.filename, None);
    }

    #[test]
    fn test_filename_may_contain_separator() {
        let hook = ProgressHook::parse_line("ytsd|moved|/music/A | B.mp3").unwrap();
        assert_eq!(hook.phase, ProgressPhase::Finished);
        assert_eq!(hook.filename, Some(PathBuf::from("/music/A | B.mp3")));
    }

    #[test]
    fn test_parse_postprocess_line() {
        let hook =
            ProgressHook::parse_line("ytsd|postprocess|started|ExtractAudio|/music/x.webm")
                .unwrap();
        assert_eq!(hook.phase, ProgressPhase::PostProcessing);
        assert_eq!(hook.filename, Some(PathBuf::from("/music/x.webm")));
    }

    #[test]
    fn test_foreign_lines_are_skipped() {
        assert!(ProgressHook::parse_line("[youtube] abc: Downloading webpage").is_none());
        assert!(ProgressHook::parse_line("ytsd|download|error|NA|NA").is_none());
        assert!(ProgressHook::parse_line("").is_none());
    }

    #[test]
    fn test_max_height_ignores_audio_only() {
        let info: VideoInfo = serde_json::from_str(
            r#"{"title":"t","formats":[
                {"format_id":"140","height":null,"vcodec":"none"},
                {"format_id":"137","height":1080,"vcodec":"avc1"},
                {"format_id":"sb0","height":2160,"vcodec":"none"},
                {"format_id":"22","height":720,"vcodec":"avc1"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(info.max_height(), Some(1080));
    }
}
