use std::path::{Path, PathBuf};

use iced::{
    widget::{button, column, pick_list, progress_bar, row, text, text_input, Space},
    Alignment, Element, Length,
};

use crate::domain::{DownloadPhase, MediaFormat, ProgressEvent, ProgressPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Main view state
pub struct DownloadView {
    pub youtube_url: String,
    pub format: MediaFormat,
    pub quality: String,
    /// Heights offered for MP4, narrowed by probing
    pub video_qualities: Vec<String>,
    pub status_message: String,
    pub status_kind: StatusKind,
    pub phase: DownloadPhase,
    pub is_downloading: bool,
    pub download_progress: f32,
    pub last_file: Option<PathBuf>,
    pub last_dir: Option<PathBuf>,
    pub show_settings: bool,
    pub music_dir: String,
    pub video_dir: String,
    pub dark_theme: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            youtube_url: String::new(),
            format: MediaFormat::default(),
            quality: MediaFormat::default().default_quality().to_string(),
            video_qualities: standard_list(MediaFormat::Video),
            status_message: "Paste a YouTube URL to start".to_string(),
            status_kind: StatusKind::Info,
            phase: DownloadPhase::Idle,
            is_downloading: false,
            download_progress: 0.0,
            last_file: None,
            last_dir: None,
            show_settings: false,
            music_dir: String::new(),
            video_dir: String::new(),
            dark_theme: false,
        }
    }
}

fn standard_list(format: MediaFormat) -> Vec<String> {
    format
        .standard_qualities()
        .iter()
        .map(|q| q.to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    FormatSelected(MediaFormat),
    QualitySelected(String),
    DownloadPressed,
    ProbePressed,
    OpenFilePressed,
    OpenFolderPressed,
    SettingsToggled,
    ChooseMusicDirPressed,
    ChooseVideoDirPressed,
    ThemeToggled,
}

impl DownloadView {
    /// A download or probe is in flight; inputs are read-only meanwhile
    pub fn is_busy(&self) -> bool {
        self.is_downloading || self.phase == DownloadPhase::Probing
    }

    /// Local state changes only; everything with side effects is handled by the app
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(_)
            | DownloadMessage::FormatSelected(_)
            | DownloadMessage::QualitySelected(_)
                if self.is_busy() => {}
            DownloadMessage::UrlChanged(url) => {
                if self.youtube_url.trim() != url.trim() {
                    self.video_qualities = standard_list(MediaFormat::Video);
                    self.ensure_valid_quality();
                }
                self.youtube_url = url;
            }
            DownloadMessage::FormatSelected(format) => {
                self.format = format;
                self.ensure_valid_quality();
            }
            DownloadMessage::QualitySelected(quality) => {
                self.quality = quality;
            }
            DownloadMessage::SettingsToggled => {
                self.show_settings = !self.show_settings;
            }
            _ => {
                // Will be handled by the app
            }
        }
    }

    pub fn qualities(&self) -> Vec<String> {
        match self.format {
            MediaFormat::Audio => standard_list(MediaFormat::Audio),
            MediaFormat::Video => self.video_qualities.clone(),
        }
    }

    pub fn set_video_qualities(&mut self, qualities: Vec<String>) {
        if !qualities.is_empty() {
            self.video_qualities = qualities;
        }
        self.ensure_valid_quality();
    }

    /// Keeps the selection valid for the current format, preferring the
    /// format default and otherwise the best quality on offer
    fn ensure_valid_quality(&mut self) {
        let options = self.qualities();
        if options.contains(&self.quality) {
            return;
        }

        let default = self.format.default_quality();
        self.quality = if options.iter().any(|q| q == default) {
            default.to_string()
        } else {
            options
                .last()
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
    }

    pub fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status_kind = kind;
        self.status_message = message.into();
    }

    pub fn start_download(&mut self, target_dir: &Path) {
        self.is_downloading = true;
        self.phase = DownloadPhase::Downloading;
        self.download_progress = 0.0;
        self.last_file = None;
        self.last_dir = Some(target_dir.to_path_buf());
        self.set_status(StatusKind::Info, "Loading...");
    }

    pub fn apply_progress(&mut self, event: &ProgressEvent) {
        self.download_progress = event.percent;
        match event.phase {
            ProgressPhase::Downloading => {
                self.phase = DownloadPhase::Downloading;
                self.set_status(
                    StatusKind::Info,
                    format!("Downloading: {:.1}%", event.percent),
                );
            }
            ProgressPhase::PostProcessing => {
                self.phase = DownloadPhase::Converting;
                self.set_status(StatusKind::Info, "Converting...");
            }
            ProgressPhase::Finished => {
                self.set_status(StatusKind::Info, "Download complete, finalizing...");
            }
        }
    }

    pub fn finish_download(&mut self, event: &ProgressEvent) {
        self.is_downloading = false;
        self.phase = DownloadPhase::Completed;
        self.download_progress = 100.0;
        self.last_file = event.file_path.clone();

        let saved_in = self
            .last_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        self.set_status(StatusKind::Success, format!("Done! Saved in: {}", saved_in));
    }

    pub fn fail_download(&mut self, reason: &str) {
        self.is_downloading = false;
        self.phase = DownloadPhase::Failed;
        self.download_progress = 0.0;
        self.set_status(StatusKind::Error, format!("Error: {}", reason));
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let busy = self.is_busy();

        let status = match self.status_kind {
            StatusKind::Info => text(&self.status_message).size(14),
            StatusKind::Success => text(&self.status_message).size(14).style(text::success),
            StatusKind::Error => text(&self.status_message).size(14).style(text::danger),
        };

        let url_input = text_input("https://www.youtube.com/watch?v=...", &self.youtube_url)
            .padding(10);
        let url_input = if busy {
            url_input
        } else {
            url_input
                .on_input(DownloadMessage::UrlChanged)
                .on_submit(DownloadMessage::DownloadPressed)
        };

        let probe_button = button("Probe")
            .on_press_maybe(
                (!busy && self.format == MediaFormat::Video).then_some(DownloadMessage::ProbePressed),
            )
            .padding([6, 12]);

        let (format_choice, quality_choice): (Element<'_, DownloadMessage>, Element<'_, DownloadMessage>) =
            if busy {
                (
                    text(self.format.to_string()).size(16).into(),
                    text(&self.quality).size(16).into(),
                )
            } else {
                (
                    pick_list(MediaFormat::ALL, Some(self.format), DownloadMessage::FormatSelected)
                        .into(),
                    pick_list(
                        self.qualities(),
                        Some(self.quality.clone()),
                        DownloadMessage::QualitySelected,
                    )
                    .into(),
                )
            };

        let options = row![
            text("Format").size(16),
            format_choice,
            text(self.format.quality_label()).size(16),
            quality_choice,
            probe_button,
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut content = column![
            text("YouTube Downloader").size(32),
            Space::new().height(Length::Fixed(10.0)),
            text("YouTube URL:").size(16),
            url_input,
            options,
            button("Start download")
                .on_press_maybe((!busy).then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            progress_bar(0.0..=100.0, self.download_progress),
            status,
        ]
        .padding(20)
        .spacing(10);

        if self.phase == DownloadPhase::Completed {
            content = content.push(
                row![
                    button("Open file").on_press_maybe(
                        self.last_file
                            .as_ref()
                            .map(|_| DownloadMessage::OpenFilePressed)
                    ),
                    button("Open folder").on_press(DownloadMessage::OpenFolderPressed),
                ]
                .spacing(10),
            );
        }

        content = content.push(
            button(if self.show_settings {
                "Hide settings"
            } else {
                "Settings"
            })
            .on_press(DownloadMessage::SettingsToggled),
        );

        if self.show_settings {
            content = content.push(self.settings_panel(busy));
        }

        content.into()
    }

    fn settings_panel(&self, busy: bool) -> Element<'_, DownloadMessage> {
        column![
            row![
                text("Music folder:").size(14),
                text(&self.music_dir).size(14).width(Length::Fill),
                button("Change...")
                    .on_press_maybe((!busy).then_some(DownloadMessage::ChooseMusicDirPressed)),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            row![
                text("Video folder:").size(14),
                text(&self.video_dir).size(14).width(Length::Fill),
                button("Change...")
                    .on_press_maybe((!busy).then_some(DownloadMessage::ChooseVideoDirPressed)),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            button(if self.dark_theme {
                "Light theme"
            } else {
                "Dark theme"
            })
            .on_press(DownloadMessage::ThemeToggled),
        ]
        .spacing(8)
        .into()
    }
}
