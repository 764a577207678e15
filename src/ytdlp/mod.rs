pub mod client;
pub mod models;
pub mod options;

pub use client::{MediaDownloader, YtDlpClient};
pub use models::{ProgressHook, VideoInfo};
pub use options::DownloadOptions;
