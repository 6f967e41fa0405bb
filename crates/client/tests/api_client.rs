use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use frontdesk_client::{ApiClient, ApiError, CheckInData, QueryParams, TimeRange, TokenSource};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Seen {
    auth: Arc<Mutex<Vec<Option<String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Seen {
    fn record(&self, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth.lock().unwrap().push(auth);
    }
}

struct TestServer {
    base_url: String,
    seen: Seen,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let seen = Seen::default();
        let app = Router::new()
            .route("/sfam/v1/tenants", get(list_tenants))
            .route("/sfam/v1/visitors", get(list_visitors))
            .route("/sfam/v1/visitors/lookup", get(lookup))
            .route("/sfam/v1/visitors/check-in/qrcode", post(echo))
            .route("/sfam/v1/visitors/:id/check-in", post(check_in))
            .route("/sfam/v1/visitors/:id/check-out", post(check_out))
            .route("/sfam/v1/analytics/visitors", get(echo_query))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/sfam/v1", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, seen, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn list_tenants(State(seen): State<Seen>, headers: HeaderMap) -> Json<Value> {
    seen.record(&headers);
    Json(json!([{ "id": "t-1", "name": "Acme Corp" }]))
}

async fn list_visitors(State(seen): State<Seen>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    seen.record(&headers);
    if headers.get("authorization").is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "missing token" })));
    }
    (StatusCode::OK, Json(json!([])))
}

async fn lookup(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({ "email": q.get("email") }))
}

async fn echo(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.bodies.lock().unwrap().push(body.clone());
    Json(body)
}

async fn echo_query(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!(q))
}

async fn check_in(Path(id): Path<String>, Json(body): Json<Value>) -> (StatusCode, String) {
    if id == "visitor-broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
    }
    (StatusCode::OK, json!({ "id": id, "status": "checked-in", "method": body["method"] }).to_string())
}

async fn check_out() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Default)]
struct FakeTokens {
    token: Option<String>,
    unauthorized_calls: AtomicUsize,
}

#[async_trait]
impl TokenSource for FakeTokens {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn on_unauthorized(&self) {
        self.unauthorized_calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn with_token(token: Option<&str>) -> Arc<FakeTokens> {
    Arc::new(FakeTokens {
        token: token.map(str::to_string),
        unauthorized_calls: AtomicUsize::new(0),
    })
}

#[tokio::test]
async fn attaches_bearer_token() {
    let server = TestServer::spawn().await;
    let client = ApiClient::new(&server.base_url).with_token_source(with_token(Some("tok-123")));

    let tenants = client.list_tenants().await.unwrap();

    assert_eq!(tenants[0]["name"], "Acme Corp");
    let auth = server.seen.auth.lock().unwrap().clone();
    assert_eq!(auth, vec![Some("Bearer tok-123".to_string())]);
}

#[tokio::test]
async fn unauthorized_signs_out_and_errors() {
    let server = TestServer::spawn().await;
    let tokens = with_token(None);
    let client = ApiClient::new(&server.base_url).with_token_source(tokens.clone());

    let err = client.list_visitors(None).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(tokens.unauthorized_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let server = TestServer::spawn().await;
    let client = ApiClient::new(&server.base_url);
    let data = CheckInData::manual(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());

    let err = client.check_in_visitor("visitor-broken", &data).await.unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn check_in_and_empty_check_out() {
    let server = TestServer::spawn().await;
    let client = ApiClient::new(&server.base_url);
    let data = CheckInData::manual(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());

    let resp = client.check_in_visitor("visitor-1", &data).await.unwrap();
    assert_eq!(resp["status"], "checked-in");
    assert_eq!(resp["method"], "manual");

    let out = client.check_out_visitor("visitor-1", None).await.unwrap();
    assert_eq!(out, Value::Null);
}

#[tokio::test]
async fn qr_check_in_sends_payload_and_method() {
    let server = TestServer::spawn().await;
    let client = ApiClient::new(&server.base_url);
    let data = CheckInData::manual(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());

    client.check_in_by_qr_code("visitor-9", &data).await.unwrap();

    let bodies = server.seen.bodies.lock().unwrap().clone();
    assert_eq!(bodies[0]["qrCodeData"], "visitor-9");
    assert_eq!(bodies[0]["method"], "qr_code");
}

#[tokio::test]
async fn query_strings_are_encoded() {
    let server = TestServer::spawn().await;
    let client = ApiClient::new(&server.base_url);

    let found = client.find_visitor_by_email("a+b@x.com").await.unwrap();
    assert_eq!(found["email"], "a+b@x.com");

    let stats = client.visitor_stats("t-1", TimeRange::Weekly).await.unwrap();
    assert_eq!(stats, json!({ "tenantId": "t-1", "timeRange": "weekly" }));
}

#[tokio::test]
async fn list_params_include_extras() {
    let server = TestServer::spawn().await;
    let client = ApiClient::new(&server.base_url).with_token_source(with_token(Some("t")));
    let mut params = QueryParams::for_tenant("t-1");
    params.page_size = Some(25);
    params.extra.push(("sort".to_string(), "name".to_string()));

    let visitors = client.list_visitors(Some(&params)).await.unwrap();
    assert_eq!(visitors, json!([]));
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(format!("http://{}", addr));
    let err = client.list_tenants().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}
