//! `HttpAccountService` against an in-process fake Account Service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use session::{AccountService, ApiError, HttpAccountService, SessionConfig, SessionStatus, SessionStore};

#[derive(Clone, Default)]
struct FakeAccounts {
    session_checks: Arc<AtomicUsize>,
}

fn has_sid(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .any(|pair| pair.trim() == "sid=abc")
}

async fn session(State(fake): State<FakeAccounts>, headers: HeaderMap) -> Response {
    fake.session_checks.fetch_add(1, Ordering::SeqCst);
    if !has_sid(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Not authenticated" }))).into_response();
    }
    Json(json!({
        "user": {
            "userId": 42,
            "email": "farmer@shop.test",
            "role": "farmer",
            "first_name": "Fern",
            "last_name": "Field",
            "contact_number": 5_550_100,
        }
    }))
    .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == "farmer@shop.test" && body["password"] == "hunter2" {
        return (
            [(header::SET_COOKIE, "sid=abc; Path=/; HttpOnly")],
            Json(json!({ "user": { "id": "42", "email": "farmer@shop.test", "role": "farmer" } })),
        )
            .into_response();
    }
    (StatusCode::BAD_REQUEST, Json(json!({ "message": "Invalid credentials" }))).into_response()
}

async fn logout(headers: HeaderMap) -> Response {
    if !has_sid(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ([(header::SET_COOKIE, "sid=; Path=/; Max-Age=0")], Json(json!({ "ok": true }))).into_response()
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/api")
}

async fn spawn_fake() -> (String, FakeAccounts) {
    let fake = FakeAccounts::default();
    let api = Router::new()
        .route("/auth/session", get(session))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .with_state(fake.clone());
    (spawn(Router::new().nest("/api", api)).await, fake)
}

fn config_for(base: &str) -> SessionConfig {
    SessionConfig {
        api_base_url: base.to_owned(),
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn fetch_without_cookie_is_no_session() {
    let (base, fake) = spawn_fake().await;
    let client = HttpAccountService::new(&config_for(&base)).expect("client");

    assert!(client.fetch_session().await.expect("fetch").is_none());
    assert_eq!(fake.session_checks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wrong_password_surfaces_upstream_message() {
    let (base, _) = spawn_fake().await;
    let client = HttpAccountService::new(&config_for(&base)).expect("client");

    let err = client.login("farmer@shop.test", "nope").await.expect_err("rejected");

    assert_eq!(err, ApiError::Upstream { status: 400, message: "Invalid credentials".into() });
    assert!(client.session_cookie().is_none());
}

#[tokio::test]
async fn login_then_session_then_logout_round_trip() {
    let (base, _) = spawn_fake().await;
    let client = HttpAccountService::new(&config_for(&base)).expect("client");

    let raw = client.login("farmer@shop.test", "hunter2").await.expect("login");
    assert_eq!(raw.into_record().expect("record").id, "42");
    assert_eq!(client.session_cookie().as_deref(), Some("sid=abc"));

    let record = client
        .fetch_session()
        .await
        .expect("fetch")
        .expect("session present")
        .into_record()
        .expect("record");
    assert_eq!(record.id, "42");
    assert_eq!(record.first_name, "Fern");
    assert_eq!(record.contact_number.as_deref(), Some("5550100"));

    client.logout().await.expect("logout");
    assert!(client.fetch_session().await.expect("fetch").is_none());
}

#[tokio::test]
async fn logout_without_session_succeeds() {
    let (base, _) = spawn_fake().await;
    let client = HttpAccountService::new(&config_for(&base)).expect("client");

    client.logout().await.expect("first logout");
    client.logout().await.expect("second logout");
}

#[tokio::test]
async fn seeded_cookie_is_sent_without_login() {
    let (base, _) = spawn_fake().await;
    let config = SessionConfig { session_cookie: Some("theme=dark; sid=abc".into()), ..config_for(&base) };
    let client = HttpAccountService::new(&config).expect("client");

    assert!(client.fetch_session().await.expect("fetch").is_some());
}

#[tokio::test]
async fn server_error_is_upstream_error() {
    let failing = Router::new().route(
        "/api/auth/session",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "database down" }))) }),
    );
    let base = spawn(failing).await;
    let client = HttpAccountService::new(&config_for(&base)).expect("client");

    let err = client.fetch_session().await.expect_err("500");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "database down");
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let broken = Router::new().route("/api/auth/session", get(|| async { "<html>oops</html>" }));
    let base = spawn(broken).await;
    let client = HttpAccountService::new(&config_for(&base)).expect("client");

    assert!(matches!(client.fetch_session().await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let client = HttpAccountService::new(&config_for(&format!("http://{addr}/api"))).expect("client");

    assert!(matches!(client.fetch_session().await, Err(ApiError::Network(_))));
}

#[tokio::test]
async fn store_over_http_tracks_login_and_logout() {
    let (base, _) = spawn_fake().await;
    let client = HttpAccountService::new(&config_for(&base)).expect("client");
    let store = SessionStore::new(Arc::new(client));

    store.refresh().await.expect("refresh");
    assert_eq!(store.status(), SessionStatus::Anonymous);

    assert!(store.login("farmer@shop.test", "wrong").await.is_err());
    assert_eq!(store.status(), SessionStatus::Anonymous);

    store.login("farmer@shop.test", "hunter2").await.expect("login");
    assert!(store.has_role(&["Farmer"]));

    store.refresh().await.expect("refresh");
    assert_eq!(store.user().map(|u| u.id), Some("42".to_owned()));

    store.logout().await;
    store.refresh().await.expect("refresh");
    assert_eq!(store.status(), SessionStatus::Anonymous);
}
