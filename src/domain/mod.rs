pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{DownloadPhase, MediaFormat, ProgressEvent, ProgressPhase, RequestConfig};
