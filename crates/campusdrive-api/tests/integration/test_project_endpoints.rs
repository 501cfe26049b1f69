//! Tests for the per-project endpoints: info, file download, upload

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campusdrive_core::domain::{EntryKind, FileHash, FilePermissions, ProjectId, RelativePath};
use campusdrive_core::ports::{IProjectApi, ProjectArchive};

use crate::common::{client_for_uri, inventory_json, STUB_TOKEN};

fn project_id() -> ProjectId {
    ProjectId::new("p1").unwrap()
}

#[tokio::test]
async fn test_project_info_decodes_inventory() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/project/p1/info"))
        .and(header("Authorization", format!("Bearer {STUB_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(inventory_json("p1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let inventory = client.project_info(&project_id()).await.unwrap();

    assert_eq!(inventory.id.as_str(), "p1");
    assert_eq!(inventory.files.len(), 3);
    assert_eq!(inventory.files[1].kind, EntryKind::Dir);
    assert_eq!(inventory.files[2].permissions, FilePermissions::ReadOnly);
    assert_eq!(inventory.files[2].version, 3);
}

#[tokio::test]
async fn test_download_file_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/project/p1/file"))
        .respond_with(ResponseTemplate::new(200).set_body_string("int main() { return 0; }\n"))
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let content = client
        .download_file(&project_id(), &RelativePath::new("main.c").unwrap())
        .await
        .unwrap();

    assert_eq!(content, "int main() { return 0; }\n");
}

#[tokio::test]
async fn test_upload_with_archive_sets_binary_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/p1/files"))
        .and(header("Content-Type", "application/x-tar"))
        .and(header("Content-Encoding", "br"))
        .and(header("Authorization", format!("Bearer {STUB_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(inventory_json("p1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let archive = ProjectArchive {
        bytes: vec![0x1b, 0x2e, 0x00, 0x04],
        content_hash: FileHash::new("c".repeat(64)).unwrap(),
    };

    let inventory = client
        .upload_files(&project_id(), Some(&archive), &[])
        .await
        .unwrap();

    assert_eq!(inventory.files.len(), 3);
}

#[tokio::test]
async fn test_upload_removals_only_sends_no_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/p1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inventory_json("p1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for_uri(&server.uri());
    let removals = vec![RelativePath::new("old.txt").unwrap()];

    let inventory = client
        .upload_files(&project_id(), None, &removals)
        .await
        .unwrap();

    assert_eq!(inventory.id.as_str(), "p1");

    // The removal-only request must not claim to carry a tar body.
    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/project/p1/files")
        .unwrap();
    assert!(upload.headers.get("Content-Encoding").is_none());
    assert!(upload.body.is_empty());
}
