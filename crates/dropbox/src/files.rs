//! File upload and metadata lookup
//!
//! Uploads are single-shot: the whole file is streamed as the request body
//! of one `files/upload` call. Chunked upload sessions are not used.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, StatusCode};
use serde::Serialize;
use td_core::{
    Credential, Error, ObjectStore, RemoteObject, Result, UploadDescriptor, header_safe_json,
};

use crate::client::{DROPBOX_API_ARG, DropboxClient, decode, error_body};

const UPLOAD_PATH: &str = "/2/files/upload";
const GET_METADATA_PATH: &str = "/2/files/get_metadata";

#[derive(Debug, Serialize)]
struct GetMetadataRequest<'a> {
    path: &'a str,
    include_deleted: bool,
    include_has_explicit_shared_members: bool,
    include_media_info: bool,
}

#[async_trait]
impl ObjectStore for DropboxClient {
    async fn upload(
        &self,
        local_path: &Path,
        descriptor: &UploadDescriptor,
        credential: &Credential,
    ) -> Result<RemoteObject> {
        let file = tokio::fs::File::open(local_path).await?;
        let size = file.metadata().await?.len();
        let arg = header_safe_json(descriptor)?;

        tracing::debug!(
            local = %local_path.display(),
            remote = %descriptor.path,
            size,
            "uploading file"
        );

        let request = self
            .http()
            .post(self.content_endpoint(UPLOAD_PATH))
            .header(AUTHORIZATION, credential.bearer())
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .header(DROPBOX_API_ARG, arg)
            .body(Body::from(file));

        let response = self.send(request, "upload").await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::warn!(status = status.as_u16(), remote = %descriptor.path, "upload rejected");
            return Err(Error::Upload {
                status: status.as_u16(),
                body,
            });
        }

        decode(response).await
    }

    async fn exists(&self, id: &str, credential: &Credential) -> Result<bool> {
        let payload = GetMetadataRequest {
            path: id,
            include_deleted: false,
            include_has_explicit_shared_members: false,
            include_media_info: false,
        };

        let request = self
            .http()
            .post(self.api_endpoint(GET_METADATA_PATH))
            .header(AUTHORIZATION, credential.bearer())
            .json(&payload);

        let response = self.send(request, "metadata").await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::CONFLICT => {
                let body = error_body(response).await;
                tracing::debug!(id, %body, "object not found");
                Ok(false)
            }
            status => {
                let body = error_body(response).await;
                tracing::warn!(status = status.as_u16(), id, "unexpected metadata status");
                Err(Error::Lookup {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;
    use td_core::{DropboxSettings, WriteMode};
    use tempfile::TempDir;

    fn client_for(server: &mockito::ServerGuard) -> DropboxClient {
        let settings = DropboxSettings {
            api_url: server.url(),
            content_url: server.url(),
            ..Default::default()
        };
        DropboxClient::new(&settings).unwrap()
    }

    fn local_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    fn credential() -> Credential {
        Credential::new("sl.token")
    }

    #[tokio::test]
    async fn test_upload_streams_file_with_api_arg() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "clip.mp4", b"fake video bytes");
        let descriptor = UploadDescriptor::add_only("/downloads", &path).unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2/files/upload")
            .match_header("authorization", "Bearer sl.token")
            .match_header("content-type", "application/octet-stream")
            .match_header(
                "dropbox-api-arg",
                r#"{"path":"/downloads/clip.mp4","mode":"add","autorename":false,"mute":false}"#,
            )
            .match_body("fake video bytes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"name":"clip.mp4","id":"id:abc123","path_lower":"/downloads/clip.mp4","path_display":"/downloads/clip.mp4","size":16}"#,
            )
            .create_async()
            .await;

        let object = client_for(&server)
            .upload(&path, &descriptor, &credential())
            .await
            .unwrap();

        assert_eq!(object.id, "id:abc123");
        assert_eq!(object.path, "/downloads/clip.mp4");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_escapes_non_ascii_name() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "Café.mp3", b"audio");
        let descriptor = UploadDescriptor::add_only("/downloads", &path).unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2/files/upload")
            .match_header(
                "dropbox-api-arg",
                r#"{"path":"/downloads/Caf\u00e9.mp3","mode":"add","autorename":false,"mute":false}"#,
            )
            .with_status(200)
            .with_body(r#"{"id":"id:cafe","path_lower":"/downloads/café.mp3"}"#)
            .create_async()
            .await;

        let object = client_for(&server)
            .upload(&path, &descriptor, &credential())
            .await
            .unwrap();

        assert_eq!(object.path, "/downloads/café.mp3");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_path_collision_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "clip.mp4", b"fake video bytes");
        let descriptor = UploadDescriptor::add_only("/downloads", &path).unwrap();
        assert_eq!(descriptor.mode, WriteMode::Add);

        let conflict = r#"{"error_summary": "path/conflict/file/..", "error": {".tag": "path", "reason": {".tag": "conflict", "conflict": {".tag": "file"}}, "upload_session_id": "x"}}"#;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/2/files/upload")
            .with_status(409)
            .with_body(conflict)
            .create_async()
            .await;

        let err = client_for(&server)
            .upload(&path, &descriptor, &credential())
            .await
            .unwrap_err();

        match err {
            Error::Upload { status, ref body } => {
                assert_eq!(status, 409);
                assert_eq!(body, conflict);
            }
            ref other => panic!("expected Upload error, got {other:?}"),
        }
        assert_eq!(err.exit_code(), 6);
    }

    #[tokio::test]
    async fn test_upload_missing_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.mp4");
        let descriptor = UploadDescriptor::add_only("/downloads", &path).unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2/files/upload")
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .upload(&path, &descriptor, &credential())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exists_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/2/files/get_metadata")
            .match_header("authorization", "Bearer sl.token")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "path": "id:abc123",
                "include_deleted": false,
                "include_has_explicit_shared_members": false,
                "include_media_info": false
            })))
            .with_status(200)
            .with_body(r#"{".tag":"file","name":"clip.mp4","id":"id:abc123"}"#)
            .create_async()
            .await;

        let found = client_for(&server)
            .exists("id:abc123", &credential())
            .await
            .unwrap();

        assert!(found);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exists_not_found_is_false() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/2/files/get_metadata")
            .with_status(409)
            .with_body(
                r#"{"error_summary": "path/not_found/..", "error": {".tag": "path", "path": {".tag": "not_found"}}}"#,
            )
            .create_async()
            .await;

        let found = client_for(&server)
            .exists("id:gone", &credential())
            .await
            .unwrap();

        assert!(!found);
    }

    #[tokio::test]
    async fn test_exists_unexpected_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/2/files/get_metadata")
            .with_status(401)
            .with_body(r#"{"error_summary": "expired_access_token/"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .exists("id:abc123", &credential())
            .await
            .unwrap_err();

        match err {
            Error::Lookup { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, r#"{"error_summary": "expired_access_token/"}"#);
            }
            other => panic!("expected Lookup error, got {other:?}"),
        }
    }
}
