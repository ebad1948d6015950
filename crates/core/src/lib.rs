//! td-core: Core library for the tubedrop CLI
//!
//! This crate provides the core functionality for tubedrop, including:
//! - The publish workflow (credential, upload, verify, share)
//! - Traits for the remote components the workflow is built from
//! - Configuration management and the secret bundle
//! - Remote path rules
//! - yt-dlp integration
//!
//! This crate is designed to be independent of any HTTP client or provider SDK,
//! so the workflow can be tested with injected fakes.

pub mod config;
pub mod download;
pub mod error;
pub mod path;
pub mod publish;
pub mod secrets;
pub mod traits;

pub use config::{Config, ConfigManager, DownloaderSettings, DropboxSettings, TimeoutConfig};
pub use download::{MediaInfo, YtDlp};
pub use error::{Error, Result};
pub use path::{file_name_of, header_safe_json, remote_path};
pub use publish::{
    Publication, PublishObserver, PublishStage, Publisher, SilentObserver, Transition,
};
pub use secrets::SecretBundle;
pub use traits::{
    Credential, CredentialProvider, LinkPublisher, ObjectStore, RemoteObject, ShareLink,
    UploadDescriptor, WriteMode,
};
