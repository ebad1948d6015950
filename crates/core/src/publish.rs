//! Publish workflow
//!
//! Composes the credential provider, object store and link publisher into a
//! single operation:
//!
//! ```text
//! Init -> CredentialObtained -> Uploaded -> Verified -> Published -> Done
//! ```
//!
//! Any failure ends the run in `Failed`. Nothing is retried: a credential
//! rejection, an upload rejection, an unexpected lookup status, a missing
//! object right after upload and a share rejection all stop the run with the
//! original error.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::path::DEFAULT_UPLOAD_PREFIX;
use crate::secrets::SecretBundle;
use crate::traits::{
    Credential, CredentialProvider, LinkPublisher, ObjectStore, RemoteObject, ShareLink,
    UploadDescriptor,
};

/// Named stages of a publish run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Init,
    CredentialObtained,
    Uploaded,
    Verified,
    Published,
    Done,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::CredentialObtained => "credential obtained",
            Self::Uploaded => "uploaded",
            Self::Verified => "verified",
            Self::Published => "published",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

impl PublishStage {
    /// The step a run leaving this stage is attempting
    pub fn next_step(self) -> &'static str {
        match self {
            Self::Init => "obtaining credential",
            Self::CredentialObtained => "uploading",
            Self::Uploaded => "verifying upload",
            Self::Verified => "creating share link",
            Self::Published | Self::Done => "finishing",
        }
    }
}

/// A state change reported to the operator
#[derive(Debug)]
pub enum Transition<'a> {
    CredentialObtained,
    Uploaded(&'a RemoteObject),
    Verified(&'a RemoteObject),
    Published(&'a ShareLink),
    Done,
    Failed { stage: PublishStage, error: &'a Error },
}

impl fmt::Display for Transition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialObtained => write!(f, "Access token obtained"),
            Self::Uploaded(object) => {
                write!(f, "Uploaded to {} (id {})", object.path, object.id)
            }
            Self::Verified(object) => write!(f, "Verified {} exists in the store", object.id),
            Self::Published(link) => write!(f, "Share link ready: {link}"),
            Self::Done => write!(f, "Publish complete"),
            Self::Failed { stage, error } => {
                write!(f, "Publish failed while {}: {error}", stage.next_step())
            }
        }
    }
}

/// Receives progress notices from the publish workflow
///
/// The observer is the only writer to the operator-facing stream during a run.
pub trait PublishObserver: Send + Sync {
    fn notice(&self, transition: &Transition<'_>);
}

/// Observer that discards every notice
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl PublishObserver for SilentObserver {
    fn notice(&self, _transition: &Transition<'_>) {}
}

/// Result of a completed publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub object: RemoteObject,
    pub link: ShareLink,
}

/// Workflow state, carrying what the next step needs
enum State {
    Init,
    CredentialObtained(Credential),
    Uploaded(Credential, RemoteObject),
    Verified(Credential, RemoteObject),
    Published(RemoteObject, ShareLink),
}

impl State {
    fn stage(&self) -> PublishStage {
        match self {
            State::Init => PublishStage::Init,
            State::CredentialObtained(_) => PublishStage::CredentialObtained,
            State::Uploaded(..) => PublishStage::Uploaded,
            State::Verified(..) => PublishStage::Verified,
            State::Published(..) => PublishStage::Published,
        }
    }

    fn transition(&self) -> Option<Transition<'_>> {
        match self {
            State::Init => None,
            State::CredentialObtained(_) => Some(Transition::CredentialObtained),
            State::Uploaded(_, object) => Some(Transition::Uploaded(object)),
            State::Verified(_, object) => Some(Transition::Verified(object)),
            State::Published(_, link) => Some(Transition::Published(link)),
        }
    }
}

/// Publish orchestrator
///
/// Holds borrowed components so callers can inject any implementation,
/// including test doubles. One call to [`Publisher::publish`] is one run;
/// credentials never outlive it.
pub struct Publisher<'a> {
    credentials: &'a dyn CredentialProvider,
    store: &'a dyn ObjectStore,
    links: &'a dyn LinkPublisher,
    observer: &'a dyn PublishObserver,
    upload_prefix: String,
}

impl<'a> Publisher<'a> {
    pub fn new(
        credentials: &'a dyn CredentialProvider,
        store: &'a dyn ObjectStore,
        links: &'a dyn LinkPublisher,
    ) -> Self {
        Self {
            credentials,
            store,
            links,
            observer: &SilentObserver,
            upload_prefix: DEFAULT_UPLOAD_PREFIX.to_string(),
        }
    }

    /// Report transitions to `observer`
    pub fn with_observer(mut self, observer: &'a dyn PublishObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Remote folder uploads are placed in
    pub fn with_upload_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.upload_prefix = prefix.into();
        self
    }

    /// Run the workflow for one local file
    pub async fn publish(&self, secrets: &SecretBundle, local_path: &Path) -> Result<Publication> {
        let mut state = State::Init;

        loop {
            let stage = state.stage();
            state = match self.advance(state, secrets, local_path).await {
                Ok(next) => next,
                Err(error) => {
                    tracing::debug!(%stage, %error, "publish run failed");
                    self.observer.notice(&Transition::Failed {
                        stage,
                        error: &error,
                    });
                    return Err(error);
                }
            };

            if let Some(transition) = state.transition() {
                self.observer.notice(&transition);
            }

            if let State::Published(object, link) = state {
                self.observer.notice(&Transition::Done);
                return Ok(Publication { object, link });
            }
        }
    }

    async fn advance(
        &self,
        state: State,
        secrets: &SecretBundle,
        local_path: &Path,
    ) -> Result<State> {
        match state {
            State::Init => {
                let credential = self.credentials.obtain(secrets).await?;
                Ok(State::CredentialObtained(credential))
            }
            State::CredentialObtained(credential) => {
                let descriptor = UploadDescriptor::add_only(&self.upload_prefix, local_path)?;
                let object = self
                    .store
                    .upload(local_path, &descriptor, &credential)
                    .await?;
                Ok(State::Uploaded(credential, object))
            }
            State::Uploaded(credential, object) => {
                if self.store.exists(&object.id, &credential).await? {
                    Ok(State::Verified(credential, object))
                } else {
                    Err(Error::Unverified(object.id))
                }
            }
            State::Verified(credential, object) => {
                let link = self
                    .links
                    .get_or_create_link(&object.path, &credential)
                    .await?;
                Ok(State::Published(object, link))
            }
            published @ State::Published(..) => Ok(published),
        }
    }
}
