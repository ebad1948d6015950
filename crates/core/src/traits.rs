//! Publish workflow data model and component traits
//!
//! These traits define the remote operations the publish workflow is built
//! from. The Dropbox adapter implements them; tests substitute mocks.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::secrets::SecretBundle;

/// Short-lived bearer credential
///
/// Scoped to one publish run. Never persisted, never shared across runs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Write policy for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Fail if an object already exists at the target path
    Add,
    /// Replace whatever is at the target path
    Overwrite,
}

/// Destination and write policy for a single upload
///
/// Serializes to the provider's upload argument object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadDescriptor {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
}

/// An object the store has accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Store-assigned identifier, the durable handle for later calls
    pub id: String,

    /// Canonical lowercase path (informational)
    #[serde(rename = "path_lower")]
    pub path: String,
}

/// Public sharing link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Exchanges the long-lived secret bundle for a short-lived credential
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a fresh credential. Every call performs a new exchange.
    async fn obtain(&self, secrets: &SecretBundle) -> Result<Credential>;
}

/// Whole-file upload and existence lookup against the remote store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the local file to the descriptor's path
    async fn upload(
        &self,
        local_path: &Path,
        descriptor: &UploadDescriptor,
        credential: &Credential,
    ) -> Result<RemoteObject>;

    /// Check whether an object with the given identifier exists
    ///
    /// The provider's "not found" answer is `Ok(false)`, not an error.
    async fn exists(&self, id: &str, credential: &Credential) -> Result<bool>;
}

/// Creates or retrieves a public sharing link
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkPublisher: Send + Sync {
    /// Return the public link for `path`, creating it if none exists
    async fn get_or_create_link(&self, path: &str, credential: &Credential) -> Result<ShareLink>;
}
