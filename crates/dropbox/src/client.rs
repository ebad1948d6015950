//! Dropbox HTTP client
//!
//! Holds the shared `reqwest` client and the three endpoint hosts the
//! Dropbox API is split across. The component traits from td-core are
//! implemented in the `auth`, `files` and `sharing` modules.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use td_core::{DropboxSettings, Error, Result};
use url::Url;

/// Header carrying the JSON arguments of content-upload endpoints
pub const DROPBOX_API_ARG: &str = "Dropbox-API-Arg";

/// Dropbox API client
#[derive(Debug, Clone)]
pub struct DropboxClient {
    http_client: Client,
    oauth_url: String,
    api_url: String,
    content_url: String,
}

impl DropboxClient {
    /// Create a new client from the `[dropbox]` settings
    pub fn new(settings: &DropboxSettings) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("tubedrop/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = &settings.timeout {
            builder = builder
                .connect_timeout(Duration::from_millis(timeout.connect_ms))
                .timeout(Duration::from_millis(timeout.request_ms));
        }

        let http_client = builder
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            oauth_url: base_url(&settings.oauth_url)?,
            api_url: base_url(&settings.api_url)?,
            content_url: base_url(&settings.content_url)?,
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    /// URL on the OAuth2 host
    pub(crate) fn oauth_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.oauth_url)
    }

    /// URL on the RPC host
    pub(crate) fn api_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    /// URL on the content host
    pub(crate) fn content_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.content_url)
    }

    /// Send a request, mapping transport failures to `Error::Network`
    pub(crate) async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("{what} request failed: {e}")))?;

        tracing::debug!(what, status = response.status().as_u16(), "response received");
        Ok(response)
    }
}

/// Validate a configured host URL and strip the trailing slash
fn base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Endpoint '{raw}' must use http or https"
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Read the response body as text for an error message
pub(crate) async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

/// Decode a successful JSON response
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("Failed to read response: {e}")))?;

    serde_json::from_str(&text).map_err(Error::Json)
}
