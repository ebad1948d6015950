//! Error types for td-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.
//! Remote failures keep the HTTP status and the response body verbatim so that
//! provider-side rejections can be diagnosed from the message alone.

use thiserror::Error;

/// Result type alias for td-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status the storage provider uses for path conflicts and "not found" lookups
pub const CONFLICT_STATUS: u16 = 409;

/// Error types for td-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Credential exchange rejected by the provider
    #[error("Token request failed with status {status}: {body}")]
    Auth { status: u16, body: String },

    /// Store rejected the write
    #[error("Upload failed with status {status}: {body}")]
    Upload { status: u16, body: String },

    /// Metadata check returned an unexpected status
    #[error("Metadata lookup failed with status {status}: {body}")]
    Lookup { status: u16, body: String },

    /// Link creation rejected
    #[error("Share link request failed with status {status}: {body}")]
    Share { status: u16, body: String },

    /// Upload reported success but the object is not observable afterwards
    #[error("Uploaded object {0} was not found in the store immediately after upload")]
    Unverified(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport failure before any HTTP status was received
    #[error("Network error: {0}")]
    Network(String),

    /// External download tool failed
    #[error("Download failed: {0}")]
    Download(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::Config(_) => 2, // UsageError
            Error::Network(_) => 3,                        // NetworkError
            Error::Auth { .. } => 4,                       // AuthError
            Error::Upload {
                status: CONFLICT_STATUS,
                ..
            } => 6, // Conflict
            Error::Unverified(_) => 6,                     // Conflict
            _ => 1,                                        // GeneralError
        }
    }
}
