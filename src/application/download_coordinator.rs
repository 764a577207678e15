use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use futures::{channel::mpsc, stream::BoxStream, StreamExt};
use tracing::{debug, error, info};

use super::progress::ProgressRelay;
use crate::{
    config::Settings,
    domain::{AppError, MediaFormat, ProgressEvent, RequestConfig},
    ytdlp::{DownloadOptions, MediaDownloader, VideoInfo},
};

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Progress(ProgressEvent),
    Completed(ProgressEvent),
    Failed(AppError),
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    downloader: Arc<dyn MediaDownloader>,
    ffmpeg_location: Option<PathBuf>,
}

impl DownloadCoordinator {
    pub fn new(downloader: Arc<dyn MediaDownloader>, ffmpeg_location: Option<PathBuf>) -> Self {
        Self {
            downloader,
            ffmpeg_location,
        }
    }

    /// Validates the input and builds the request. Does not touch yt-dlp.
    pub fn prepare_request(
        &self,
        url: &str,
        format: MediaFormat,
        quality: &str,
        settings: &Settings,
    ) -> Result<(String, RequestConfig), AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::InvalidInput);
        }

        let request = RequestConfig::new(
            format,
            quality,
            settings.output_dir(format),
            self.ffmpeg_location.clone(),
        );

        Ok((url.to_string(), request))
    }

    /// Runs the download on its own worker thread. Events arrive over a
    /// channel; the stream ends after `Completed` or `Failed`.
    pub fn download_stream(
        &self,
        url: String,
        request: RequestConfig,
    ) -> BoxStream<'static, DownloadEvent> {
        let (tx, rx) = mpsc::unbounded();
        let downloader = Arc::clone(&self.downloader);

        let spawned = thread::Builder::new()
            .name("download-worker".to_string())
            .spawn(move || {
                let options = DownloadOptions::build(&request);
                info!(%url, format = %request.format(), quality = request.quality(), "download started");
                if let Ok(json) = serde_json::to_string(&options) {
                    debug!(options = %json, "yt-dlp options");
                }

                let mut relay = ProgressRelay::new(request.output_dir());
                let result = std::fs::create_dir_all(request.output_dir())
                    .map_err(AppError::from)
                    .and_then(|_| {
                        downloader.download(&url, &options, &mut |hook| {
                            let event = relay.apply(&hook);
                            let _ = tx.unbounded_send(DownloadEvent::Progress(event));
                        })
                    });

                let last = match result {
                    Ok(()) => {
                        let done = relay.finish();
                        info!(file = ?done.file_path, "download completed");
                        DownloadEvent::Completed(done)
                    }
                    Err(e) => {
                        error!(%url, "download failed: {}", e);
                        DownloadEvent::Failed(e)
                    }
                };
                let _ = tx.unbounded_send(last);
            });

        match spawned {
            Ok(_) => rx.boxed(),
            Err(e) => futures::stream::once(async move {
                DownloadEvent::Failed(AppError::Io(format!(
                    "Failed to start download worker: {}",
                    e
                )))
            })
            .boxed(),
        }
    }

    /// Video heights worth offering for `url`
    pub async fn probe_qualities(&self, url: String) -> Result<Vec<String>, AppError> {
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(AppError::InvalidInput);
        }

        let downloader = Arc::clone(&self.downloader);
        let info = tokio::task::spawn_blocking(move || downloader.probe(&url))
            .await
            .map_err(|e| AppError::ExternalTool(e.to_string()))??;

        debug!(title = %info.title, max_height = ?info.max_height(), "probe finished");
        Ok(available_heights(&info))
    }

    pub async fn choose_directory(current: PathBuf) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_directory(&current)
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }
}

/// Standard heights up to the tallest stream. The smallest standard height
/// is always kept since `height<=` falls back to `best` anyway.
pub fn available_heights(info: &VideoInfo) -> Vec<String> {
    let standard = MediaFormat::Video.standard_qualities();

    let Some(max) = info.max_height() else {
        return standard.iter().map(|q| q.to_string()).collect();
    };

    let mut heights: Vec<String> = standard
        .iter()
        .filter(|q| q.parse::<u32>().is_ok_and(|h| h <= max))
        .map(|q| q.to_string())
        .collect();

    if heights.is_empty() {
        heights.push(standard[0].to_string());
    }
    heights
}
