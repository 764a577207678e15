pub mod download_coordinator;
pub mod progress;

pub use download_coordinator::{DownloadCoordinator, DownloadEvent};
