use super::*;

// =============================================================================
// endpoint_url
// =============================================================================

#[test]
fn endpoint_url_joins_with_single_slash() {
    assert_eq!(endpoint_url("https://shop.example/api", "/auth/session"), "https://shop.example/api/auth/session");
    assert_eq!(endpoint_url("https://shop.example/api/", "/auth/login"), "https://shop.example/api/auth/login");
}

// =============================================================================
// parse_session_body / parse_login_body
// =============================================================================

#[test]
fn session_body_with_user_parses() {
    let raw = parse_session_body(r#"{"user":{"id":"u1","email":"a@b.com"}}"#)
        .expect("parse")
        .expect("user present");
    assert_eq!(raw.email.as_deref(), Some("a@b.com"));
}

#[test]
fn session_body_with_null_user_is_no_session() {
    assert_eq!(parse_session_body(r#"{"user":null}"#).expect("parse"), None);
    assert_eq!(parse_session_body("{}").expect("parse"), None);
    assert_eq!(parse_session_body("  ").expect("parse"), None);
}

#[test]
fn session_body_garbage_is_decode_error() {
    let err = parse_session_body("<html>oops</html>").expect_err("not json");
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn login_body_without_user_is_decode_error() {
    let err = parse_login_body("{}").expect_err("user required");
    assert_eq!(err, ApiError::Decode("login response missing user".into()));
}

// =============================================================================
// upstream_error
// =============================================================================

#[test]
fn upstream_error_prefers_message_field() {
    let err = upstream_error(400, r#"{"message":"Invalid credentials","error":"bad_request"}"#);
    assert_eq!(err, ApiError::Upstream { status: 400, message: "Invalid credentials".into() });
}

#[test]
fn upstream_error_falls_back_to_error_field() {
    let err = upstream_error(403, r#"{"error":"account locked"}"#);
    assert_eq!(err.message(), "account locked");
}

#[test]
fn upstream_error_uses_plain_text_body() {
    let err = upstream_error(502, "  upstream timeout \n");
    assert_eq!(err.message(), "upstream timeout");
}

#[test]
fn upstream_error_uses_reason_phrase_for_empty_body() {
    let err = upstream_error(503, "");
    assert_eq!(err.message(), "Service Unavailable");
    assert_eq!(err.status(), Some(503));
}

#[test]
fn upstream_error_ignores_json_without_known_fields() {
    let err = upstream_error(500, r#"{"detail":"x"}"#);
    assert_eq!(err.message(), "Internal Server Error");
}

// =============================================================================
// HttpAccountService construction
// =============================================================================

#[test]
fn new_rejects_unparseable_base_url() {
    let config = SessionConfig { api_base_url: "http://".into(), ..SessionConfig::default() };
    assert!(matches!(HttpAccountService::new(&config), Err(ApiError::ClientBuild(_))));
}

#[test]
fn new_seeds_cookie_store() {
    let config = SessionConfig {
        api_base_url: "http://127.0.0.1:4000/api".into(),
        session_cookie: Some("sid=abc; theme=dark".into()),
        ..SessionConfig::default()
    };
    let service = HttpAccountService::new(&config).expect("client");
    let cookie = service.session_cookie().expect("cookie header");
    assert!(cookie.contains("sid=abc"), "cookie header was {cookie}");
    assert!(cookie.contains("theme=dark"), "cookie header was {cookie}");
    assert_eq!(service.base_url(), "http://127.0.0.1:4000/api");
}

#[test]
fn new_without_seed_has_no_cookie() {
    let service = HttpAccountService::new(&SessionConfig::default()).expect("client");
    assert_eq!(service.session_cookie(), None);
}
