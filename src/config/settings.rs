use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{AppError, MediaFormat};

const APP_DIR: &str = "simple-yt-downloader";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Light,
    Dark,
}

impl ThemeChoice {
    pub fn toggled(self) -> Self {
        match self {
            ThemeChoice::Light => ThemeChoice::Dark,
            ThemeChoice::Dark => ThemeChoice::Light,
        }
    }

    pub fn to_theme(self) -> iced::Theme {
        match self {
            ThemeChoice::Light => iced::Theme::Light,
            ThemeChoice::Dark => iced::Theme::Dark,
        }
    }
}

/// User preferences persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub music_dir: PathBuf,
    pub video_dir: PathBuf,
    pub theme: ThemeChoice,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_dir: default_music_dir(),
            video_dir: default_video_dir(),
            theme: ThemeChoice::default(),
        }
    }
}

impl Settings {
    pub fn output_dir(&self, format: MediaFormat) -> &Path {
        match format {
            MediaFormat::Audio => &self.music_dir,
            MediaFormat::Video => &self.video_dir,
        }
    }

    pub fn set_output_dir(&mut self, format: MediaFormat, dir: PathBuf) {
        match format {
            MediaFormat::Audio => self.music_dir = dir,
            MediaFormat::Video => self.video_dir = dir,
        }
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_music_dir() -> PathBuf {
    dirs::audio_dir().unwrap_or_else(|| home_dir().join("Music"))
}

pub fn default_video_dir() -> PathBuf {
    dirs::video_dir().unwrap_or_else(|| home_dir().join("Videos"))
}

/// Where [`Settings`] are read from and written to.
/// A store without a path keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// `<config dir>/simple-yt-downloader/settings.json`
    pub fn default_location() -> Self {
        Self {
            path: dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE)),
        }
    }

    pub fn try_load(&self) -> Result<Settings, AppError> {
        let Some(path) = &self.path else {
            return Ok(Settings::default());
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(AppError::Settings(format!("{}: {}", path.display(), e))),
        };

        serde_json::from_str(&raw)
            .map_err(|e| AppError::Settings(format!("{}: {}", path.display(), e)))
    }

    /// Like [`try_load`](Self::try_load) but falls back to defaults
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => {
                info!(path = ?self.path, "settings loaded");
                settings
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Settings(format!("{}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Settings(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Settings(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nope.json"));
        assert_eq!(store.try_load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            music_dir: PathBuf::from("/data/music"),
            video_dir: PathBuf::from("/data/video"),
            theme: ThemeChoice::Dark,
        };

        store.save(&settings).unwrap();
        assert_eq!(store.try_load().unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let settings = SettingsStore::new(&path).try_load().unwrap();
        assert_eq!(settings.theme, ThemeChoice::Dark);
        assert_eq!(settings.music_dir, default_music_dir());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(&path);
        assert!(matches!(store.try_load(), Err(AppError::Settings(_))));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_output_dir_per_format() {
        let mut settings = Settings::default();
        settings.set_output_dir(MediaFormat::Video, PathBuf::from("/v"));
        assert_eq!(settings.output_dir(MediaFormat::Video), Path::new("/v"));
        assert_eq!(settings.output_dir(MediaFormat::Audio), settings.music_dir);
    }
}
