//! HTTP gateway tests against a mock `/service` backend.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use pollboard::api::ServiceApi;
use pollboard::error::MutationError;
use pollboard::gateway::HttpGateway;
use pollboard::service::{Service, ServiceStatus};

#[derive(Clone, Default)]
struct Backend {
    services: Arc<Mutex<Vec<Service>>>,
    next_id: Arc<Mutex<u64>>,
}

#[derive(Deserialize)]
struct UpsertBody {
    url: String,
    name: String,
}

async fn list(State(backend): State<Backend>) -> Json<Vec<Service>> {
    Json(backend.services.lock().unwrap().clone())
}

async fn fetch(
    State(backend): State<Backend>,
    Path(id): Path<String>,
) -> Result<Json<Service>, StatusCode> {
    backend
        .services
        .lock()
        .unwrap()
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create(
    State(backend): State<Backend>,
    Json(body): Json<UpsertBody>,
) -> (StatusCode, Json<Service>) {
    let mut next_id = backend.next_id.lock().unwrap();
    *next_id += 1;
    let service = Service {
        id: next_id.to_string(),
        name: body.name,
        url: body.url,
        status: ServiceStatus::Unknown,
    };
    backend.services.lock().unwrap().push(service.clone());
    (StatusCode::CREATED, Json(service))
}

async fn update(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<UpsertBody>,
) -> Result<Json<Service>, StatusCode> {
    let mut services = backend.services.lock().unwrap();
    let service = services
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    service.url = body.url;
    service.name = body.name;
    Ok(Json(service.clone()))
}

async fn remove(State(backend): State<Backend>, Path(id): Path<String>) -> StatusCode {
    let mut services = backend.services.lock().unwrap();
    let before = services.len();
    services.retain(|s| s.id != id);
    if services.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/service", get(list).post(create))
        .route("/service/:id", get(fetch).put(update).delete(remove))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn seeded(services: Vec<Service>) -> Backend {
    Backend {
        services: Arc::new(Mutex::new(services)),
        next_id: Arc::new(Mutex::new(0)),
    }
}

fn service(id: &str, name: &str, url: &str, status: ServiceStatus) -> Service {
    Service {
        id: id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        status,
    }
}

#[tokio::test]
async fn test_fetch_all_returns_ordered_list() {
    let base_url = spawn_backend(seeded(vec![
        service("1", "A", "http://a", ServiceStatus::Ok),
        service("2", "B", "http://b", ServiceStatus::Fail),
    ]))
    .await;
    let gateway = HttpGateway::new(base_url);

    let services = gateway.fetch_all().await.unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0].id, "1");
    assert_eq!(services[1].status, ServiceStatus::Fail);
}

#[tokio::test]
async fn test_create_posts_body_and_parses_response() {
    let backend = seeded(vec![]);
    let base_url = spawn_backend(backend.clone()).await;
    let gateway = HttpGateway::new(base_url);

    let created = gateway.create_service("http://b", "B").await.unwrap();
    assert_eq!(created.name, "B");
    assert_eq!(created.url, "http://b");
    assert_eq!(created.status, ServiceStatus::Unknown);

    let stored = backend.services.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, created.id);
}

#[tokio::test]
async fn test_update_existing_service() {
    let base_url = spawn_backend(seeded(vec![service(
        "1",
        "A",
        "http://a",
        ServiceStatus::Ok,
    )]))
    .await;
    let gateway = HttpGateway::new(base_url);

    let updated = gateway
        .update_service("1", "http://new", "renamed")
        .await
        .unwrap();
    assert_eq!(updated.id, "1");
    assert_eq!(updated.url, "http://new");
    assert_eq!(updated.name, "renamed");
}

#[tokio::test]
async fn test_update_missing_service_maps_404() {
    let base_url = spawn_backend(seeded(vec![])).await;
    let gateway = HttpGateway::new(base_url);

    let err = gateway
        .update_service("9", "http://x", "X")
        .await
        .unwrap_err();
    assert!(matches!(err, MutationError::Backend { status: 404, .. }));
    assert_eq!(err.to_error_code(), "BACKEND_ERROR");
}

#[tokio::test]
async fn test_delete_service() {
    let backend = seeded(vec![service("1", "A", "http://a", ServiceStatus::Ok)]);
    let base_url = spawn_backend(backend.clone()).await;
    let gateway = HttpGateway::new(base_url);

    gateway.delete_service("1").await.unwrap();
    assert!(backend.services.lock().unwrap().is_empty());

    let err = gateway.delete_service("1").await.unwrap_err();
    assert!(matches!(err, MutationError::Backend { status: 404, .. }));
}

#[tokio::test]
async fn test_empty_fields_rejected_without_network() {
    // unroutable base url: local validation must fail before any request
    let gateway = HttpGateway::new("http://127.0.0.1:1");

    let err = gateway.create_service("", "B").await.unwrap_err();
    assert!(matches!(err, MutationError::InvalidInput(_)));
    assert_eq!(err.to_error_code(), "INVALID_INPUT");

    let err = gateway.update_service("1", "http://b", "").await.unwrap_err();
    assert!(matches!(err, MutationError::InvalidInput(_)));
}

#[tokio::test]
async fn test_malformed_list_body_surfaces_parse_error() {
    let app = Router::new().route("/service", get(|| async { "definitely not json" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let gateway = HttpGateway::new(format!("http://{}", addr));
    let err = gateway.fetch_all().await.unwrap_err();
    assert!(matches!(err, MutationError::Parse(_)));
    assert_eq!(err.to_error_code(), "PARSE_ERROR");
}

#[tokio::test]
async fn test_transport_failure_maps_to_transport_error() {
    let gateway = HttpGateway::new("http://127.0.0.1:1");
    let err = gateway.fetch_all().await.unwrap_err();
    assert!(matches!(err, MutationError::Transport(_)));
}
