//! get command - Download a video or its audio track
//!
//! Resolves the media metadata first so the output file name is known, then
//! runs the download. With `--dropbox` the file is published afterwards.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use td_core::YtDlp;
use td_core::download::{DownloadRequest, build_output_filename, output_extension};

use super::load_config;
use super::publish::publish_file;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, Spinner};

/// Download a video or audio track
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Video URL
    pub url: String,

    /// Extract the audio track in the configured audio format
    #[arg(long, default_value = "false")]
    pub mp3: bool,

    /// Publish the downloaded file to Dropbox
    #[arg(long, default_value = "false")]
    pub dropbox: bool,

    /// Directory the file is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct DownloadOutput {
    status: &'static str,
    local_file: String,
    id: String,
    title: String,
}

/// Execute the get command
pub async fn execute(args: GetArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let config = match load_config(&formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let downloader = YtDlp::new(config.downloader.yt_dlp_dir.as_deref());
    let audio_format = args.mp3.then_some(config.downloader.audio_format.as_str());

    let spinner = Spinner::new(formatter.config(), "Fetching video info...");
    let info = match downloader.fetch_info(&args.url).await {
        Ok(info) => info,
        Err(e) => {
            spinner.finish_and_clear();
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let file_name = build_output_filename(
        &config.downloader.output_template,
        &info,
        output_extension(audio_format),
    );
    let local_file = args.output_dir.join(&file_name);

    // The tool draws its own progress when no spinner is shown.
    let show_output = !spinner.is_visible() && !formatter.is_quiet() && !formatter.is_json();
    spinner.set_message(&format!("Downloading {}...", info.title));

    let request = DownloadRequest {
        url: &args.url,
        output: &local_file,
        audio_format,
        show_output,
    };
    let result = downloader.download(&request).await;
    spinner.finish_and_clear();

    if let Err(e) = result {
        formatter.error(&e.to_string());
        return ExitCode::from_error(&e);
    }

    if args.dropbox {
        if !formatter.is_json() {
            formatter.success(&format!("Downloaded {}", local_file.display()));
        }
        return publish_file(&formatter, &config.dropbox, &local_file).await;
    }

    if formatter.is_json() {
        formatter.json(&DownloadOutput {
            status: "downloaded",
            local_file: local_file.display().to_string(),
            id: info.id,
            title: info.title,
        });
    } else {
        formatter.success(&format!("Downloaded {}", local_file.display()));
    }

    ExitCode::Success
}
