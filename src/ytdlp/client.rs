use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, info, warn};

use super::models::{ProgressHook, VideoInfo};
use super::options::DownloadOptions;
use crate::domain::AppError;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

const PROGRAM_ENV: &str = "YTDLP_PATH";
const STDERR_TAIL: usize = 50;

pub type Result<T> = std::result::Result<T, AppError>;

/// The external media downloader. Both calls block until the tool exits and
/// are meant to run off the UI thread.
pub trait MediaDownloader: Send + Sync {
    fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        on_progress: &mut dyn FnMut(ProgressHook),
    ) -> Result<()>;

    fn probe(&self, url: &str) -> Result<VideoInfo>;
}

/// Drives the `yt-dlp` executable as a child process
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    program: PathBuf,
}

impl Default for YtDlpClient {
    fn default() -> Self {
        Self::from_env()
    }
}

impl YtDlpClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `$YTDLP_PATH` if set, otherwise `yt-dlp` from the search path
    pub fn from_env() -> Self {
        let program = std::env::var_os(PROGRAM_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));
        Self::new(program)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        command
    }

    fn spawn_error(&self, e: std::io::Error) -> AppError {
        AppError::ExternalTool(format!(
            "could not start {}: {}",
            self.program.display(),
            e
        ))
    }
}

impl MediaDownloader for YtDlpClient {
    fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        on_progress: &mut dyn FnMut(ProgressHook),
    ) -> Result<()> {
        let args = options.to_args();
        debug!(program = %self.program.display(), ?args, "spawning yt-dlp");

        let mut child = self
            .command()
            .args(&args)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AppError::ExternalTool(
                    "no output pipes from yt-dlp".to_string(),
                ));
            }
        };

        // Both pipes are drained on their own threads so neither can fill up and
        // stall the child. Under --quiet the postprocess template goes to stderr.
        let (tx, rx) = mpsc::channel();
        forward_lines(stdout, Pipe::Stdout, tx.clone());
        forward_lines(stderr, Pipe::Stderr, tx);

        let stderr_tail = collect_output(rx, &mut child, on_progress)?;
        let status = child.wait()?;

        if !status.success() {
            warn!(%status, "yt-dlp exited with failure");
            let reason = last_error_line(&stderr_tail.join("\n"))
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            return Err(AppError::ExternalTool(reason));
        }

        info!(url, "yt-dlp finished");
        Ok(())
    }

    fn probe(&self, url: &str) -> Result<VideoInfo> {
        debug!(url, "probing formats");
        let output = self
            .command()
            .args(["-J", "--no-playlist", "--no-warnings", "--"])
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = last_error_line(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(AppError::ExternalTool(reason));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::ExternalTool(format!("unexpected yt-dlp output: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipe {
    Stdout,
    Stderr,
}

#[derive(Debug)]
enum PipeLine {
    Hook(ProgressHook),
    Text(Pipe, String),
    ReadFailed(std::io::Error),
}

fn forward_lines<R>(reader: R, pipe: Pipe, tx: Sender<PipeLine>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        for line in BufReader::new(reader).split(b'\n') {
            let message = match line {
                Ok(bytes) => {
                    let line = String::from_utf8_lossy(&bytes).into_owned();
                    match ProgressHook::parse_line(&line) {
                        Some(hook) => PipeLine::Hook(hook),
                        None => PipeLine::Text(pipe, line),
                    }
                }
                Err(e) => {
                    let _ = tx.send(PipeLine::ReadFailed(e));
                    break;
                }
            };
            if tx.send(message).is_err() {
                break;
            }
        }
    });
}

/// Feeds hooks to `on_progress` on the calling thread until both pipes close.
/// Returns the last non-hook stderr lines. On a read error the child is
/// killed and reaped before the error is returned.
fn collect_output(
    rx: Receiver<PipeLine>,
    child: &mut Child,
    on_progress: &mut dyn FnMut(ProgressHook),
) -> Result<Vec<String>> {
    let mut stderr_tail = VecDeque::with_capacity(STDERR_TAIL);

    for message in rx {
        match message {
            PipeLine::Hook(hook) => on_progress(hook),
            PipeLine::Text(Pipe::Stdout, line) => debug!(line = %line, "yt-dlp"),
            PipeLine::Text(Pipe::Stderr, line) => {
                debug!(line = %line, "yt-dlp stderr");
                if stderr_tail.len() == STDERR_TAIL {
                    stderr_tail.pop_front();
                }
                stderr_tail.push_back(line);
            }
            PipeLine::ReadFailed(e) => {
                warn!("reading yt-dlp output failed: {}", e);
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }
    }

    Ok(stderr_tail.into())
}

/// The most useful line of yt-dlp's stderr: the last `ERROR:` line,
/// otherwise the last non-empty one.
fn last_error_line(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("ERROR:"))
        .map(|l| l.trim().to_string())
        .or_else(|| lines.last().map(|l| l.to_string()))
}
