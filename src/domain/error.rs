use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Please enter a YouTube URL")]
    InvalidInput,

    #[error("yt-dlp failed: {0}")]
    ExternalTool(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
