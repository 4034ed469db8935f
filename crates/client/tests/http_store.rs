mod common;

use estate_cms_client::{ClientConfig, ClientError, HttpContentClient};
use estate_cms_core::{AssetStore, DocumentStore, LocalFile, SectionName, StoreError};
use serde_json::json;

fn section(name: &str) -> SectionName {
    SectionName::parse(name).unwrap()
}

fn client_for(backend: &common::FakeBackend) -> HttpContentClient {
    HttpContentClient::new(ClientConfig::new(&backend.base_url)).unwrap()
}

#[tokio::test]
async fn fetch_returns_document() {
    let backend = common::spawn().await;
    backend
        .insert("pricing", json!({"plans": [{"name": "Villa", "price": "from $250k"}]}))
        .await;
    let client = client_for(&backend);

    let doc = client.fetch(&section("pricing")).await.unwrap();

    assert_eq!(doc["plans"][0]["name"], "Villa");
}

#[tokio::test]
async fn fetch_unknown_section_is_not_found() {
    let backend = common::spawn().await;
    let client = client_for(&backend);

    let err = client.fetch(&section("nowhere")).await.unwrap_err();

    assert_eq!(err, StoreError::NotFound("nowhere".to_string()));
}

#[tokio::test]
async fn persist_echo_and_silent_responses() {
    let backend = common::spawn().await;
    let client = client_for(&backend);
    let about = section("about");

    let echoed = client.persist(&about, &json!({"title": "x"})).await.unwrap();
    assert_eq!(echoed, Some(json!({"title": "x"})));

    backend.echo_persist(false).await;
    let silent = client.persist(&about, &json!({"title": "y"})).await.unwrap();
    assert_eq!(silent, None);
    assert_eq!(backend.document("about").await, Some(json!({"title": "y"})));
}

#[tokio::test]
async fn persist_failure_maps_status() {
    let backend = common::spawn().await;
    backend.fail_persist(true).await;
    let client = client_for(&backend);

    let err = client
        .persist(&section("about"), &json!({}))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StoreError::Status {
            status: 500,
            body: "database unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn upload_sends_image_field() {
    let backend = common::spawn().await;
    let client = client_for(&backend);
    let file = LocalFile::new("masterplan.png", vec![7u8; 32]).with_content_type("image/png");

    let uploaded = client.upload(&file).await.unwrap();

    assert_eq!(uploaded.public_id, "img-1");
    assert_eq!(uploaded.url, "http://cdn.test/img-1/masterplan.png");
    let received = backend.uploads().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].field, "image");
    assert_eq!(received[0].file_name.as_deref(), Some("masterplan.png"));
    assert_eq!(received[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(received[0].len, 32);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let backend = common::spawn().await;
    let client = client_for(&backend);

    client.delete("abc123").await.unwrap();
    client.delete("missing").await.unwrap();
    let err = client.delete("explode").await.unwrap_err();

    assert!(matches!(err, StoreError::Status { status: 500, .. }));
    assert_eq!(
        backend.delete_requests().await,
        vec!["abc123", "missing", "explode"]
    );
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let backend = common::spawn().await;
    backend.insert("about", json!({})).await;
    let client =
        HttpContentClient::new(ClientConfig::new(&backend.base_url).with_token("s3cret")).unwrap();

    client.fetch(&section("about")).await.unwrap();

    assert_eq!(backend.authorization().await, vec!["Bearer s3cret"]);
}

#[test]
fn token_with_newline_is_rejected() {
    let result = HttpContentClient::new(ClientConfig::new("http://localhost").with_token("a\nb"));
    assert!(matches!(result, Err(ClientError::InvalidToken)));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HttpContentClient::new(ClientConfig::new(format!("http://{addr}"))).unwrap();

    let err = client.fetch(&section("about")).await.unwrap_err();

    assert!(matches!(err, StoreError::Transport(_)));
}
