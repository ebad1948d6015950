//! Shared link creation
//!
//! `create_shared_link_with_settings` answers a repeated request for the same
//! path with 409 `shared_link_already_exists`, carrying the existing link's
//! metadata. That answer is returned as the link; no lookup is made first.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use td_core::{Credential, Error, LinkPublisher, Result, ShareLink};

use crate::client::{DropboxClient, decode, error_body};

const CREATE_SHARED_LINK_PATH: &str = "/2/sharing/create_shared_link_with_settings";

#[derive(Debug, Serialize)]
struct CreateSharedLinkRequest<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct SharedLinkMetadata {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<CreateSharedLinkError>,
}

#[derive(Debug, Deserialize)]
struct CreateSharedLinkError {
    #[serde(rename = ".tag")]
    tag: String,
    shared_link_already_exists: Option<AlreadyExists>,
}

#[derive(Debug, Deserialize)]
struct AlreadyExists {
    metadata: Option<SharedLinkMetadata>,
}

/// URL of the existing link in a `shared_link_already_exists` error body
fn existing_link_url(body: &str) -> Option<String> {
    let response: ApiErrorResponse = serde_json::from_str(body).ok()?;
    let error = response.error?;
    if error.tag != "shared_link_already_exists" {
        return None;
    }
    error.shared_link_already_exists?.metadata.map(|m| m.url)
}

#[async_trait]
impl LinkPublisher for DropboxClient {
    async fn get_or_create_link(&self, path: &str, credential: &Credential) -> Result<ShareLink> {
        let request = self
            .http()
            .post(self.api_endpoint(CREATE_SHARED_LINK_PATH))
            .header(AUTHORIZATION, credential.bearer())
            .json(&CreateSharedLinkRequest { path });

        let response = self.send(request, "share link").await?;

        let status = response.status();
        if status.is_success() {
            let metadata: SharedLinkMetadata = decode(response).await?;
            return Ok(ShareLink { url: metadata.url });
        }

        let body = error_body(response).await;
        if status == StatusCode::CONFLICT {
            if let Some(url) = existing_link_url(&body) {
                tracing::debug!(path, "reusing existing shared link");
                return Ok(ShareLink { url });
            }
        }

        tracing::warn!(status = status.as_u16(), path, "share link request rejected");
        Err(Error::Share {
            status: status.as_u16(),
            body,
        })
    }
}
