use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "simple_yt_downloader=info".into());

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// ffmpeg shipped next to the executable, if this is a bundled build
pub fn bundled_ffmpeg_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    ffmpeg_dir_in(exe.parent()?)
}

pub fn ffmpeg_dir_in(base: &Path) -> Option<PathBuf> {
    let dir = base.join("ffmpeg");
    dir.is_dir().then_some(dir)
}

/// Most recently modified regular file in `dir`, ignoring yt-dlp's partial
/// downloads and hidden files
pub fn latest_file_in(dir: &Path) -> Option<PathBuf> {
    let mut best: Option<(PathBuf, SystemTime)> = None;

    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(".part") || name.ends_with(".ytdl") || name.starts_with('.') {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };

        match &best {
            Some((_, best_time)) if modified <= *best_time => {}
            _ => best = Some((path, modified)),
        }
    }

    best.map(|(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_ffmpeg_dir_in() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ffmpeg_dir_in(dir.path()), None);

        std::fs::create_dir(dir.path().join("ffmpeg")).unwrap();
        assert_eq!(ffmpeg_dir_in(dir.path()), Some(dir.path().join("ffmpeg")));
    }

    #[test]
    fn test_latest_file_skips_partials() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.mp3");
        let new = dir.path().join("new.mp3");
        std::fs::write(&old, b"a").unwrap();
        std::fs::write(&new, b"b").unwrap();
        std::fs::write(dir.path().join("newest.mp3.part"), b"c").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"d").unwrap();

        let earlier = SystemTime::now() - Duration::from_secs(60);
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(earlier)
            .unwrap();

        assert_eq!(latest_file_in(dir.path()), Some(new));
    }

    #[test]
    fn test_latest_file_missing_dir() {
        assert_eq!(latest_file_in(Path::new("/definitely/not/here")), None);
    }
}
