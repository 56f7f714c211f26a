//! Route guard middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use session::RouteDecision;
use tracing::info;

use crate::state::AppState;

/// Redirect requests for protected paths that carry no session cookie.
pub async fn require_session_cookie(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let decision = state
        .guard
        .decide(request.uri().path(), jar.iter().map(|cookie| (cookie.name(), cookie.value())));

    match decision {
        RouteDecision::Continue => next.run(request).await,
        RouteDecision::Redirect(location) => {
            info!(path = %request.uri().path(), %location, "redirecting request without session cookie");
            Redirect::temporary(&location).into_response()
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
