//! OAuth2 refresh-token exchange

use async_trait::async_trait;
use serde::Deserialize;
use td_core::{Credential, CredentialProvider, Error, Result, SecretBundle};

use crate::client::{DropboxClient, decode, error_body};

const TOKEN_PATH: &str = "/oauth2/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait]
impl CredentialProvider for DropboxClient {
    async fn obtain(&self, secrets: &SecretBundle) -> Result<Credential> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", secrets.app_key.as_str()),
            ("client_secret", secrets.app_secret.as_str()),
            ("refresh_token", secrets.refresh_token.as_str()),
        ];

        let request = self.http().post(self.oauth_endpoint(TOKEN_PATH)).form(&form);
        let response = self.send(request, "token").await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::warn!(status = status.as_u16(), "token request rejected");
            return Err(Error::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = decode(response).await?;
        Ok(Credential::new(token.access_token))
    }
}
