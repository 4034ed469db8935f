//! Fake content backend honoring the document and image endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

#[derive(Debug, Default)]
pub struct BackendState {
    pub documents: HashMap<String, Value>,
    pub uploads: Vec<ReceivedUpload>,
    pub delete_requests: Vec<String>,
    pub authorization: Vec<String>,
    pub fail_persist: bool,
    pub echo_persist: bool,
    next_id: usize,
}

#[derive(Clone)]
pub struct FakeBackend {
    pub state: Arc<Mutex<BackendState>>,
    pub base_url: String,
}

#[allow(dead_code)]
impl FakeBackend {
    pub async fn insert(&self, section: &str, document: Value) {
        self.state
            .lock()
            .await
            .documents
            .insert(section.to_string(), document);
    }

    pub async fn document(&self, section: &str) -> Option<Value> {
        self.state.lock().await.documents.get(section).cloned()
    }

    pub async fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.lock().await.uploads.clone()
    }

    pub async fn delete_requests(&self) -> Vec<String> {
        self.state.lock().await.delete_requests.clone()
    }

    pub async fn authorization(&self) -> Vec<String> {
        self.state.lock().await.authorization.clone()
    }

    pub async fn fail_persist(&self, fail: bool) {
        self.state.lock().await.fail_persist = fail;
    }

    pub async fn echo_persist(&self, echo: bool) {
        self.state.lock().await.echo_persist = echo;
    }
}

type Shared = Arc<Mutex<BackendState>>;

/// Start the fake backend on an ephemeral port.
pub async fn spawn() -> FakeBackend {
    let state: Shared = Arc::new(Mutex::new(BackendState {
        echo_persist: true,
        ..BackendState::default()
    }));

    let app = Router::new()
        .route("/api/upload", post(upload))
        .route("/api/delete-image", post(delete_image))
        .route("/api/{section}", get(fetch_section).post(persist_section))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend crashed");
    });

    FakeBackend {
        state,
        base_url: format!("http://{addr}"),
    }
}

async fn record_auth(state: &Shared, headers: &HeaderMap) {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        state.lock().await.authorization.push(value.to_string());
    }
}

async fn fetch_section(
    State(state): State<Shared>,
    Path(section): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_auth(&state, &headers).await;
    match state.lock().await.documents.get(&section) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "no such section").into_response(),
    }
}

async fn persist_section(
    State(state): State<Shared>,
    Path(section): Path<String>,
    headers: HeaderMap,
    Json(document): Json<Value>,
) -> Response {
    record_auth(&state, &headers).await;
    let mut guard = state.lock().await;
    if guard.fail_persist {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    guard.documents.insert(section, document.clone());
    if guard.echo_persist {
        Json(document).into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    let mut received = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        received = Some(ReceivedUpload {
            field: name,
            file_name,
            content_type,
            len,
        });
    }

    let Some(upload) = received.filter(|u| u.field == "image") else {
        return (StatusCode::BAD_REQUEST, "missing image field").into_response();
    };

    let mut guard = state.lock().await;
    guard.next_id += 1;
    let public_id = format!("img-{}", guard.next_id);
    let url = format!(
        "http://cdn.test/{public_id}/{}",
        upload.file_name.clone().unwrap_or_default()
    );
    guard.uploads.push(upload);
    Json(json!({ "url": url, "publicId": public_id })).into_response()
}

async fn delete_image(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let public_id = body["publicId"].as_str().unwrap_or_default().to_string();
    state.lock().await.delete_requests.push(public_id.clone());
    match public_id.as_str() {
        "missing" => (StatusCode::NOT_FOUND, "unknown image").into_response(),
        "explode" => (StatusCode::INTERNAL_SERVER_ERROR, "storage offline").into_response(),
        _ => Json(json!({ "result": "ok" })).into_response(),
    }
}
