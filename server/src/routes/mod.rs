//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The edge server sits in front of the storefront's static build. Every
//! request passes the route guard before it reaches `ServeDir`, so protected
//! dashboard pages are never served to a browser without a session cookie.
//! `/healthz` sits behind the same guard but is never protected.

pub mod guard;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let site = ServeDir::new(&state.site_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(site)
        .layer(middleware::from_fn_with_state(state.clone(), guard::require_session_cookie))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
