//! yt-dlp integration
//!
//! Runs the external download tool, reads its JSON metadata and derives the
//! local output file name from the configured template.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{Error, Result};

const YT_DLP_BINARY: &str = "yt-dlp";
const VIDEO_EXTENSION: &str = "mp4";

/// Metadata record printed by yt-dlp
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
}

impl MediaInfo {
    /// Parse the tool's JSON output; unknown fields are ignored
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A single download invocation
#[derive(Debug, Clone)]
pub struct DownloadRequest<'a> {
    pub url: &'a str,
    pub output: &'a Path,
    /// Extract audio in this format instead of downloading video
    pub audio_format: Option<&'a str>,
    /// Show the tool's own output on the terminal
    pub show_output: bool,
}

/// yt-dlp process runner
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    /// Use `dir/yt-dlp` when a directory is configured, otherwise `yt-dlp` from PATH
    pub fn new(dir: Option<&Path>) -> Self {
        let binary = match dir {
            Some(dir) => dir.join(YT_DLP_BINARY),
            None => PathBuf::from(YT_DLP_BINARY),
        };
        Self { binary }
    }

    /// Fetch metadata without downloading
    pub async fn fetch_info(&self, url: &str) -> Result<MediaInfo> {
        tracing::debug!(binary = %self.binary.display(), url, "fetching media metadata");

        let output = Command::new(&self.binary)
            .args(["--print-json", "--simulate", url])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(Error::Download(format!(
                "metadata request exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        MediaInfo::from_json(&output.stdout)
    }

    /// Download the media to `request.output`
    pub async fn download(&self, request: &DownloadRequest<'_>) -> Result<()> {
        let args = download_args(request);
        tracing::debug!(binary = %self.binary.display(), ?args, "starting download");

        let mut command = Command::new(&self.binary);
        command.args(&args).stdin(Stdio::null());

        if request.show_output {
            let status = command
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(|e| self.spawn_error(e))?;

            if !status.success() {
                return Err(Error::Download(format!("yt-dlp exited with {status}")));
            }
            return Ok(());
        }

        // stderr is kept for the error message; stdout is discarded
        let output = command
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?
            .wait_with_output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(Error::Download(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }

    fn spawn_error(&self, e: std::io::Error) -> Error {
        Error::Download(format!("failed to run {}: {e}", self.binary.display()))
    }
}

/// Command-line arguments for a download; the URL is always last
pub fn download_args(request: &DownloadRequest<'_>) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(format) = request.audio_format {
        args.extend(
            ["-f", "bestaudio", "-x", "--audio-format", format]
                .iter()
                .map(|s| s.to_string()),
        );
    }

    args.push("-o".to_string());
    args.push(request.output.to_string_lossy().into_owned());
    args.push(request.url.to_string());
    args
}

/// Expand an output template such as `%(title)s-%(id)s.%(ext)s`
///
/// Characters that are unsafe in file names are replaced with `_` in the
/// title, and spaces in the template itself become `_`.
pub fn build_output_filename(template: &str, info: &MediaInfo, extension: &str) -> String {
    template
        .replace(' ', "_")
        .replace("%(title)s", &sanitize_title(&info.title))
        .replace("%(id)s", &info.id)
        .replace("%(ext)s", extension)
}

/// Extension for the downloaded file
pub fn output_extension(audio_format: Option<&str>) -> &str {
    audio_format.unwrap_or(VIDEO_EXTENSION)
}

fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            ':' | '?' | ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}
