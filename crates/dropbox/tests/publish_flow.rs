//! End-to-end publish runs against a mock Dropbox server
//!
//! One mock server stands in for all three Dropbox hosts.

use std::path::PathBuf;

use mockito::{Matcher, Mock, ServerGuard};
use tempfile::TempDir;
use td_core::{DropboxSettings, Error, Publisher, SecretBundle};
use td_dropbox::DropboxClient;

const LINK: &str = "https://www.dropbox.com/s/xyz/clip.mp4";

fn client_for(server: &ServerGuard) -> DropboxClient {
    let settings = DropboxSettings {
        oauth_url: server.url(),
        api_url: server.url(),
        content_url: server.url(),
        ..Default::default()
    };
    DropboxClient::new(&settings).unwrap()
}

fn clip(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, b"fake video bytes").unwrap();
    path
}

fn secrets() -> SecretBundle {
    SecretBundle::new("key", "secret", "refresh")
}

async fn token_mock(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/oauth2/token")
        .with_status(200)
        .with_body(r#"{"access_token":"sl.run"}"#)
        .create_async()
        .await
}

async fn upload_mock(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/2/files/upload")
        .match_header("authorization", "Bearer sl.run")
        .with_status(200)
        .with_body(r#"{"id":"id:abc123","path_lower":"/downloads/clip.mp4"}"#)
        .expect(hits)
        .create_async()
        .await
}

async fn metadata_mock(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
    server
        .mock("POST", "/2/files/get_metadata")
        .match_header("authorization", "Bearer sl.run")
        .match_body(Matcher::PartialJson(serde_json::json!({"path": "id:abc123"})))
        .with_status(status)
        .with_body(r#"{"error_summary": "path/not_found/.."}"#)
        .expect(hits)
        .create_async()
        .await
}

async fn share_mock(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/2/sharing/create_shared_link_with_settings")
        .match_header("authorization", "Bearer sl.run")
        .match_body(Matcher::Json(serde_json::json!({"path": "/downloads/clip.mp4"})))
        .with_status(200)
        .with_body(format!(r#"{{"url":"{LINK}"}}"#))
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn publish_returns_share_link() {
    let dir = TempDir::new().unwrap();
    let path = clip(&dir);
    let mut server = mockito::Server::new_async().await;

    let token = token_mock(&mut server).await;
    let upload = upload_mock(&mut server, 1).await;
    let metadata = metadata_mock(&mut server, 200, 1).await;
    let share = share_mock(&mut server, 1).await;

    let client = client_for(&server);
    let publication = Publisher::new(&client, &client, &client)
        .publish(&secrets(), &path)
        .await
        .unwrap();

    assert_eq!(publication.object.id, "id:abc123");
    assert_eq!(publication.object.path, "/downloads/clip.mp4");
    assert_eq!(publication.link.url, LINK);

    token.assert_async().await;
    upload.assert_async().await;
    metadata.assert_async().await;
    share.assert_async().await;
}

#[tokio::test]
async fn missing_object_after_upload_skips_share() {
    let dir = TempDir::new().unwrap();
    let path = clip(&dir);
    let mut server = mockito::Server::new_async().await;

    let _token = token_mock(&mut server).await;
    let upload = upload_mock(&mut server, 1).await;
    let metadata = metadata_mock(&mut server, 409, 1).await;
    let share = share_mock(&mut server, 0).await;

    let client = client_for(&server);
    let err = Publisher::new(&client, &client, &client)
        .publish(&secrets(), &path)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unverified(ref id) if id == "id:abc123"));
    upload.assert_async().await;
    metadata.assert_async().await;
    share.assert_async().await;
}

#[tokio::test]
async fn rejected_token_makes_no_further_calls() {
    let dir = TempDir::new().unwrap();
    let path = clip(&dir);
    let mut server = mockito::Server::new_async().await;

    let token = server
        .mock("POST", "/oauth2/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .create_async()
        .await;
    let upload = upload_mock(&mut server, 0).await;
    let metadata = metadata_mock(&mut server, 200, 0).await;
    let share = share_mock(&mut server, 0).await;

    let client = client_for(&server);
    let err = Publisher::new(&client, &client, &client)
        .publish(&secrets(), &path)
        .await
        .unwrap_err();

    match err {
        Error::Auth { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, r#"{"error": "invalid_grant"}"#);
        }
        other => panic!("expected Auth error, got {other:?}"),
    }

    token.assert_async().await;
    upload.assert_async().await;
    metadata.assert_async().await;
    share.assert_async().await;
}
