use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::domain::{ProgressEvent, ProgressPhase};
use crate::utils::latest_file_in;
use crate::ytdlp::ProgressHook;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid regex"));

/// Turns yt-dlp hooks into the state the UI shows.
///
/// Lives on the worker thread for the duration of one download.
#[derive(Debug)]
pub struct ProgressRelay {
    output_dir: PathBuf,
    phase: ProgressPhase,
    percent: f32,
    file_path: Option<PathBuf>,
}

impl ProgressRelay {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            phase: ProgressPhase::Downloading,
            percent: 0.0,
            file_path: None,
        }
    }

    /// Folds one hook into the stored state and returns the new snapshot.
    /// A missing or unreadable percentage keeps the previous value.
    pub fn apply(&mut self, hook: &ProgressHook) -> ProgressEvent {
        self.phase = hook.phase;

        if hook.phase == ProgressPhase::Finished {
            self.percent = 100.0;
        } else if let Some(percent) = hook.percent.as_deref().and_then(parse_percent) {
            self.percent = percent;
        } else if hook.percent.is_some() {
            debug!(raw = ?hook.percent, "ignoring unreadable percentage");
        }

        if let Some(path) = &hook.filename {
            self.file_path = Some(path.clone());
        }

        ProgressEvent {
            phase: self.phase,
            percent: self.percent,
            file_path: None,
        }
    }

    /// Final event after the downloader returned successfully. Falls back to
    /// the newest file in the output directory when no hook named one.
    pub fn finish(self) -> ProgressEvent {
        let file_path = match self.file_path {
            Some(path) => Some(path),
            None => {
                let found = latest_file_in(&self.output_dir);
                info!(dir = %self.output_dir.display(), ?found, "no file reported, scanned output dir");
                found
            }
        };

        ProgressEvent {
            phase: ProgressPhase::Finished,
            percent: 100.0,
            file_path,
        }
    }
}

/// Reads yt-dlp's `_percent_str`, e.g. `" 42.3%"`, clamped to 0..=100
pub fn parse_percent(raw: &str) -> Option<f32> {
    let cleaned = ANSI_ESCAPE.replace_all(raw, "");
    let value: f32 = cleaned.trim().trim_end_matches('%').trim().parse().ok()?;

    if value.is_finite() {
        Some(value.clamp(0.0, 100.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(phase: ProgressPhase, percent: Option<&str>) -> ProgressHook {
        ProgressHook {
            phase,
            percent: percent.map(str::to_string),
            filename: None,
        }
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent(" 42.3%"), Some(42.3));
        assert_eq!(parse_percent("\x1b[0;94m 7.0%\x1b[0m"), Some(7.0));
        assert_eq!(parse_percent("250%"), Some(100.0));
        assert_eq!(parse_percent("NA"), None);
        assert_eq!(parse_percent(""), None);
        assert_eq!(parse_percent("NaN%"), None);
    }

    #[test]
    fn test_unparsable_percent_keeps_previous() {
        let mut relay = ProgressRelay::new("/tmp");
        relay.apply(&hook(ProgressPhase::Downloading, Some("35.0%")));

        let event = relay.apply(&hook(ProgressPhase::Downloading, Some("garbage")));
        assert_eq!(event.percent, 35.0);

        let event = relay.apply(&hook(ProgressPhase::Downloading, None));
        assert_eq!(event.percent, 35.0);
    }

    #[test]
    fn test_finished_sets_full_percent() {
        let mut relay = ProgressRelay::new("/tmp");
        relay.apply(&hook(ProgressPhase::Downloading, Some("12%")));

        let event = relay.apply(&hook(ProgressPhase::Finished, Some("3%")));
        assert_eq!(event.phase, ProgressPhase::Finished);
        assert_eq!(event.percent, 100.0);
    }

    #[test]
    fn test_merged_streams_finish_only_when_moved() {
        let mut relay = ProgressRelay::new("/tmp");
        let lines = [
            "ytsd|download|downloading| 60.0%|/v/clip.f137.mp4",
            "ytsd|download|finished|NA|/v/clip.f137.mp4",
            "ytsd|download|downloading|  0.5%|/v/clip.f140.m4a",
        ];
        let mut last = None;
        for line in lines {
            last = Some(relay.apply(&ProgressHook::parse_line(line).unwrap()));
        }
        let last = last.unwrap();
        assert_eq!(last.phase, ProgressPhase::Downloading);
        assert_eq!(last.percent, 0.5);

        let moved = relay.apply(&ProgressHook::parse_line("ytsd|moved|/v/clip.mp4").unwrap());
        assert_eq!(moved.phase, ProgressPhase::Finished);
        assert_eq!(moved.percent, 100.0);
        assert_eq!(relay.finish().file_path, Some(PathBuf::from("/v/clip.mp4")));
    }

    #[test]
    fn test_path_only_reported_at_finish() {
        let mut relay = ProgressRelay::new("/tmp");
        let event = relay.apply(&ProgressHook {
            phase: ProgressPhase::PostProcessing,
            percent: None,
            filename: Some(PathBuf::from("/music/a.mp3")),
        });
        assert_eq!(event.file_path, None);
        assert_eq!(event.phase, ProgressPhase::PostProcessing);

        let done = relay.finish();
        assert_eq!(done.file_path, Some(PathBuf::from("/music/a.mp3")));
        assert_eq!(done.percent, 100.0);
    }

    #[test]
    fn test_finish_scans_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Song.mp3"), b"x").unwrap();

        let relay = ProgressRelay::new(dir.path());
        assert_eq!(relay.finish().file_path, Some(dir.path().join("Song.mp3")));
    }
}
