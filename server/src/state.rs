//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and middleware via the `State`
//! extractor. It is read-only after startup: the route guard is built once
//! from configuration and shared behind an `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use session::RouteGuard;

use crate::config::ServerConfig;

/// Clone is required by Axum; all inner fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<RouteGuard>,
    pub site_dir: PathBuf,
}

impl AppState {
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self { guard: Arc::new(RouteGuard::new(config.route_guard.clone())), site_dir: config.site_dir.clone() }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
