//! HTTP-level tests for the storage client against a mock server

use serde_json::json;
use std::time::Duration;
use steward_client::{transfer, Config, StorageClient};
use steward_core::{
    BucketSnapshot, Lifecycle, LifecycleError, LifecycleRule, ObjectUri, Operation, RetryConfig,
    RetryingExecutor, StoreError,
};
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> StorageClient {
    StorageClient::new(
        Config::new(server.uri())
            .with_token("test-token")
            .with_project("build-project"),
    )
    .unwrap()
}

fn expiring(days: u32) -> BucketSnapshot {
    BucketSnapshot::named("ci-artifacts")
        .with_lifecycle(Lifecycle::new(vec![LifecycleRule::delete_after_days(days)]))
}

#[tokio::test]
async fn test_get_bucket_decodes_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/ci-artifacts"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "storage#bucket",
            "name": "ci-artifacts",
            "metageneration": "4",
            "lifecycle": {"rule": [{"action": {"type": "Delete"}, "condition": {"age": 30}}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bucket = client_for(&server).get_bucket("ci-artifacts").await.unwrap();

    assert_eq!(bucket.metageneration, Some(4));
    assert_eq!(bucket.lifecycle, expiring(30).lifecycle);
}

#[tokio::test]
async fn test_status_codes_map_to_typed_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/missing-bucket"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "The specified bucket does not exist."}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/locked-bucket"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Access denied."}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/flaky-bucket"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);

    assert_eq!(
        client.get_bucket("missing-bucket").await.unwrap_err(),
        StoreError::NotFound("The specified bucket does not exist.".to_string())
    );
    assert!(matches!(
        client.get_bucket("locked-bucket").await.unwrap_err(),
        StoreError::Forbidden(_)
    ));
    assert!(client.get_bucket("flaky-bucket").await.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_insert_bucket_posts_to_project() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", "build-project"))
        .and(body_json(json!({
            "name": "ci-artifacts",
            "lifecycle": {"rule": [{"action": {"type": "Delete"}, "condition": {"age": 7}}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "ci-artifacts",
            "metageneration": "1",
            "lifecycle": {"rule": [{"action": {"type": "Delete"}, "condition": {"age": 7}}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server).insert_bucket(&expiring(7)).await.unwrap();
    assert_eq!(created.metageneration, Some(1));
}

#[tokio::test]
async fn test_insert_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/b"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "message": "You already own this bucket."}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).insert_bucket(&expiring(7)).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_insert_requires_project() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = StorageClient::new(Config::new(server.uri())).unwrap();
    let err = client.insert_bucket(&expiring(7)).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_update_bucket_puts_full_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/storage/v1/b/ci-artifacts"))
        .and(body_json(json!({
            "name": "ci-artifacts",
            "labels": {"team": "build"},
            "lifecycle": {"rule": [{"action": {"type": "Delete"}, "condition": {"age": 14}}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "ci-artifacts",
            "metageneration": "5"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client_for(&server)
        .update_bucket(&expiring(14).with_label("team", "build"))
        .await
        .unwrap();
    assert_eq!(updated.metageneration, Some(5));
}

#[tokio::test]
async fn test_undecodable_response_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/ci-artifacts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy login</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_bucket("ci-artifacts").await.unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = StorageClient::new(Config::new(server.uri()).with_timeout(Duration::from_millis(50))).unwrap();
    let err = client.get_bucket("ci-artifacts").await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
}

#[tokio::test]
async fn test_upload_and_download_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/ci-artifacts/o"))
        .and(query_param("uploadType", "media"))
        .and(query_param("name", "builds/42/report.txt"))
        .and(header("content-type", "text/plain"))
        .and(body_string("all green"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "builds/42/report.txt",
            "bucket": "ci-artifacts",
            "size": "9"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/ci-artifacts/o/builds%2F42%2Freport.txt"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_string("all green"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let uri = ObjectUri::parse("gs://ci-artifacts/builds/42/report.txt").unwrap();

    let info = client
        .upload_object(&uri, bytes::Bytes::from_static(b"all green"), "text/plain")
        .await
        .unwrap();
    assert_eq!(info.size_bytes(), Some(9));

    let data = client.download_object(&uri).await.unwrap();
    assert_eq!(&data[..], b"all green");
}

#[tokio::test]
async fn test_upload_file_retries_and_strips_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/ci-artifacts/o"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/ci-artifacts/o"))
        .and(query_param("name", "releases/app/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "releases/app/notes.txt",
            "bucket": "ci-artifacts",
            "contentType": "text/plain"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    let local = workspace.path().join("out/app/notes.txt");
    std::fs::create_dir_all(local.parent().unwrap()).unwrap();
    std::fs::write(&local, "release notes").unwrap();

    let executor = RetryingExecutor::new(RetryConfig::immediate(2));
    let info = transfer::upload_file(
        &client_for(&server),
        &executor,
        &local,
        Some(&workspace.path().join("out")),
        &ObjectUri::parse("gs://ci-artifacts/releases").unwrap(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(info.name, "releases/app/notes.txt");
}

#[tokio::test]
async fn test_download_to_writes_nested_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/ci-artifacts/o/releases%2F42%2Fapp.tar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tarball".to_vec()))
        .mount(&server)
        .await;

    let dest = tempfile::tempdir().unwrap();
    let executor = RetryingExecutor::new(RetryConfig::immediate(0));
    let written = transfer::download_to(
        &client_for(&server),
        &executor,
        &ObjectUri::parse("gs://ci-artifacts/releases/42/app.tar").unwrap(),
        Some("releases/"),
        dest.path(),
    )
    .await
    .unwrap();

    assert_eq!(written, dest.path().join("42/app.tar"));
    assert_eq!(std::fs::read(&written).unwrap(), b"tarball");
}

#[tokio::test]
async fn test_download_missing_object_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dest = tempfile::tempdir().unwrap();
    let executor = RetryingExecutor::new(RetryConfig::immediate(3));
    let err = transfer::download_to(
        &client_for(&server),
        &executor,
        &ObjectUri::parse("gs://ci-artifacts/missing.txt").unwrap(),
        None,
        dest.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Remote {
            operation: Operation::Download,
            source: StoreError::NotFound(_),
            ..
        }
    ));
    assert!(!dest.path().join("missing.txt").exists());
}
