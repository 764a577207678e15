use std::path::PathBuf;
use std::sync::Arc;

use iced::{Task, Theme};
use tracing::{info, warn};

use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::config::{Settings, SettingsStore, ThemeChoice};
use crate::domain::{AppError, DownloadPhase, MediaFormat};
use crate::ui::{DownloadMessage, DownloadView, StatusKind};
use crate::utils::bundled_ffmpeg_dir;
use crate::ytdlp::{MediaDownloader, YtDlpClient};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    settings: Settings,
    store: SettingsStore,
}

impl Default for DownloadApp {
    fn default() -> Self {
        let store = SettingsStore::default_location();
        let settings = store.load();
        let ffmpeg = bundled_ffmpeg_dir();
        if let Some(dir) = &ffmpeg {
            info!(dir = %dir.display(), "using bundled ffmpeg");
        }

        Self::new(settings, store, Arc::new(YtDlpClient::from_env()), ffmpeg)
    }
}

impl DownloadApp {
    pub fn new(
        settings: Settings,
        store: SettingsStore,
        downloader: Arc<dyn MediaDownloader>,
        ffmpeg_location: Option<PathBuf>,
    ) -> Self {
        let mut app = Self {
            view: DownloadView::default(),
            coordinator: DownloadCoordinator::new(downloader, ffmpeg_location),
            settings,
            store,
        };
        app.sync_settings_view();
        app
    }

    fn sync_settings_view(&mut self) {
        self.view.music_dir = self.settings.music_dir.display().to_string();
        self.view.video_dir = self.settings.video_dir.display().to_string();
        self.view.dark_theme = self.settings.theme == ThemeChoice::Dark;
    }

    fn persist_settings(&mut self) {
        self.sync_settings_view();
        if let Err(e) = self.store.save(&self.settings) {
            warn!("{}", e);
            self.view.set_status(StatusKind::Error, e.to_string());
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Heights available for the probed URL
    QualitiesProbed(Result<Vec<String>, String>),
    DirectoryChosen(MediaFormat, Option<PathBuf>),
    Download(DownloadEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => {
                    if app.view.is_downloading {
                        return Task::none();
                    }

                    match app.coordinator.prepare_request(
                        &app.view.youtube_url,
                        app.view.format,
                        &app.view.quality,
                        &app.settings,
                    ) {
                        Ok((url, request)) => {
                            app.view.start_download(request.output_dir());

                            // The worker thread reports back through this stream
                            return Task::stream(app.coordinator.download_stream(url, request))
                                .map(Message::Download);
                        }
                        Err(e) => {
                            app.view.set_status(StatusKind::Error, e.to_string());
                        }
                    }
                }
                DownloadMessage::ProbePressed => {
                    if app.view.youtube_url.trim().is_empty() {
                        app.view
                            .set_status(StatusKind::Error, AppError::InvalidInput.to_string());
                        return Task::none();
                    }

                    app.view.phase = DownloadPhase::Probing;
                    app.view.set_status(StatusKind::Info, "Checking available qualities...");

                    let coordinator = app.coordinator.clone();
                    let url = app.view.youtube_url.clone();
                    return Task::perform(
                        async move {
                            coordinator
                                .probe_qualities(url)
                                .await
                                .map_err(|e| e.to_string())
                        },
                        Message::QualitiesProbed,
                    );
                }
                DownloadMessage::OpenFilePressed => {
                    if let Some(path) = app.view.last_file.clone() {
                        open_path(app, path);
                    }
                }
                DownloadMessage::OpenFolderPressed => {
                    let folder = app
                        .view
                        .last_file
                        .as_ref()
                        .and_then(|f| f.parent().map(|p| p.to_path_buf()))
                        .or_else(|| app.view.last_dir.clone());
                    if let Some(folder) = folder {
                        open_path(app, folder);
                    }
                }
                DownloadMessage::ChooseMusicDirPressed => {
                    return choose_directory(app, MediaFormat::Audio);
                }
                DownloadMessage::ChooseVideoDirPressed => {
                    return choose_directory(app, MediaFormat::Video);
                }
                DownloadMessage::ThemeToggled => {
                    app.settings.theme = app.settings.theme.toggled();
                    app.persist_settings();
                }
                _ => {}
            }
        }
        Message::QualitiesProbed(result) => {
            app.view.phase = DownloadPhase::Idle;
            match result {
                Ok(qualities) => {
                    app.view.set_video_qualities(qualities);
                    app.view.set_status(
                        StatusKind::Info,
                        format!("Available: {}", app.view.video_qualities.join(", ")),
                    );
                }
                Err(e) => {
                    app.view.set_status(StatusKind::Error, format!("Error: {}", e));
                }
            }
        }
        Message::DirectoryChosen(format, dir) => {
            // None means the dialog was cancelled
            if let Some(dir) = dir {
                app.settings.set_output_dir(format, dir);
                app.persist_settings();
            }
        }
        Message::Download(event) => match event {
            DownloadEvent::Progress(progress) => {
                app.view.apply_progress(&progress);
            }
            DownloadEvent::Completed(done) => {
                app.view.finish_download(&done);
            }
            DownloadEvent::Failed(e) => {
                app.view.fail_download(&e.to_string());
            }
        },
    }
    Task::none()
}

fn choose_directory(app: &DownloadApp, format: MediaFormat) -> Task<Message> {
    let current = app.settings.output_dir(format).to_path_buf();
    Task::perform(DownloadCoordinator::choose_directory(current), move |dir| {
        Message::DirectoryChosen(format, dir)
    })
}

fn open_path(app: &mut DownloadApp, path: PathBuf) {
    if let Err(e) = open::that_detached(&path) {
        warn!(path = %path.display(), "could not open: {}", e);
        app.view.set_status(
            StatusKind::Error,
            format!("Could not open {}: {}", path.display(), e),
        );
    }
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn theme(app: &DownloadApp) -> Theme {
    app.settings.theme.to_theme()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeChoice;
    use crate::domain::{ProgressEvent, ProgressPhase};
    use crate::ytdlp::{DownloadOptions, ProgressHook, VideoInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockDownloader {
        downloads: AtomicUsize,
        probes: AtomicUsize,
    }

    impl MediaDownloader for MockDownloader {
        fn download(
            &self,
            _url: &str,
            _options: &DownloadOptions,
            _on_progress: &mut dyn FnMut(ProgressHook),
        ) -> Result<(), AppError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn probe(&self, _url: &str) -> Result<VideoInfo, AppError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(VideoInfo {
                title: String::new(),
                formats: Vec::new(),
            })
        }
    }

    fn app_with(mock: Arc<MockDownloader>, store: SettingsStore) -> DownloadApp {
        DownloadApp::new(Settings::default(), store, mock, None)
    }

    #[test]
    fn test_empty_url_never_invokes_downloader() {
        let mock = Arc::new(MockDownloader::default());
        let mut app = app_with(mock.clone(), SettingsStore::in_memory());
        app.view.youtube_url = "   ".to_string();

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));

        assert_eq!(mock.downloads.load(Ordering::SeqCst), 0);
        assert!(!app.view.is_downloading);
        assert_eq!(app.view.status_kind, StatusKind::Error);
        assert_eq!(app.view.status_message, AppError::InvalidInput.to_string());
    }

    #[test]
    fn test_empty_url_probe_is_rejected() {
        let mock = Arc::new(MockDownloader::default());
        let mut app = app_with(mock.clone(), SettingsStore::in_memory());

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::ProbePressed));

        assert_eq!(mock.probes.load(Ordering::SeqCst), 0);
        assert_eq!(app.view.phase, DownloadPhase::Idle);
        assert_eq!(app.view.status_kind, StatusKind::Error);
    }

    #[test]
    fn test_download_events_drive_view() {
        let mut app = app_with(
            Arc::new(MockDownloader::default()),
            SettingsStore::in_memory(),
        );
        app.view.is_downloading = true;

        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Progress(ProgressEvent {
                phase: ProgressPhase::Downloading,
                percent: 12.5,
                file_path: None,
            })),
        );
        assert_eq!(app.view.download_progress, 12.5);

        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Failed(AppError::ExternalTool(
                "Video unavailable".to_string(),
            ))),
        );
        assert!(!app.view.is_downloading);
        assert_eq!(app.view.phase, DownloadPhase::Failed);
        assert_eq!(
            app.view.status_message,
            "Error: yt-dlp failed: Video unavailable"
        );
    }

    #[test]
    fn test_settings_changes_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let mut app = app_with(Arc::new(MockDownloader::default()), store.clone());

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::ThemeToggled));
        let _ = update(
            &mut app,
            Message::DirectoryChosen(MediaFormat::Audio, Some(PathBuf::from("/data/music"))),
        );

        let saved = store.try_load().unwrap();
        assert_eq!(saved.theme, ThemeChoice::Dark);
        assert_eq!(saved.music_dir, PathBuf::from("/data/music"));
        assert!(app.view.dark_theme);
        assert_eq!(theme(&app), Theme::Dark);
    }

    #[test]
    fn test_cancelled_directory_dialog_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let mut app = app_with(Arc::new(MockDownloader::default()), store);
        let before = app.settings.clone();

        let _ = update(&mut app, Message::DirectoryChosen(MediaFormat::Video, None));
        assert_eq!(app.settings, before);
        assert!(!dir.path().join("settings.json").exists());
    }
}
