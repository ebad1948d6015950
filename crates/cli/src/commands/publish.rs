//! publish command - Upload a local file and print its share link
//!
//! Runs the full workflow: obtain an access token, upload, confirm the object
//! exists, then create (or reuse) a shared link.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use td_core::{DropboxSettings, Error, Publication, Publisher, SecretBundle};
use td_dropbox::DropboxClient;

use super::load_config;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, NoticeObserver, OutputConfig};

/// Upload an existing file to Dropbox
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Local file to publish
    pub file: PathBuf,
}

/// JSON result of a successful publish
#[derive(Debug, Serialize)]
pub(crate) struct PublishOutput {
    status: &'static str,
    local_file: String,
    id: String,
    path: String,
    url: String,
}

impl PublishOutput {
    fn new(local_file: &Path, publication: Publication) -> Self {
        Self {
            status: "success",
            local_file: local_file.display().to_string(),
            id: publication.object.id,
            path: publication.object.path,
            url: publication.link.url,
        }
    }
}

/// Execute the publish command
pub async fn execute(args: PublishArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let config = match load_config(&formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    publish_file(&formatter, &config.dropbox, &args.file).await
}

/// Publish `file` and report the result; shared with `get --dropbox`
pub(crate) async fn publish_file(
    formatter: &Formatter,
    settings: &DropboxSettings,
    file: &Path,
) -> ExitCode {
    let size = match tokio::fs::metadata(file).await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => {
            formatter.error(&format!("Not a regular file: {}", file.display()));
            return ExitCode::UsageError;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            formatter.error(&format!("File not found: {}", file.display()));
            return ExitCode::NotFound;
        }
        Err(e) => {
            formatter.error(&format!("Cannot read {}: {e}", file.display()));
            return ExitCode::GeneralError;
        }
    };

    let secrets = match load_secrets() {
        Ok(s) => s,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let client = match DropboxClient::new(settings) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create Dropbox client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    if !formatter.is_json() {
        formatter.println(&format!(
            "Publishing {} ({})",
            file.display(),
            humansize::format_size(size, humansize::BINARY)
        ));
    }

    let observer = NoticeObserver::new(formatter);
    let result = Publisher::new(&client, &client, &client)
        .with_observer(&observer)
        .with_upload_prefix(settings.upload_prefix.clone())
        .publish(&secrets, file)
        .await;

    match result {
        // In human mode the observer has already printed the link.
        Ok(publication) => {
            if formatter.is_json() {
                formatter.json(&PublishOutput::new(file, publication));
            }
            ExitCode::Success
        }
        // The observer has already reported the failure.
        Err(e) => ExitCode::from_error(&e),
    }
}

const ENV_FILE: &str = ".env";

/// Read the secret bundle from the environment, after loading `./.env` if present
///
/// Only the working directory is searched; parent directories are not.
fn load_secrets() -> td_core::Result<SecretBundle> {
    match dotenvy::from_path(ENV_FILE) {
        Ok(()) => tracing::debug!(path = ENV_FILE, "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(Error::Config(format!("Failed to read .env file: {e}"))),
    }

    SecretBundle::from_lookup(|name| std::env::var(name).ok())
}
