mod config;
mod routes;
mod state;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is normal outside local development.
        if !e.not_found() {
            eprintln!("ignoring unreadable .env: {e}");
        }
    }
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid server configuration");
    tracing::info!(
        site_dir = %config.site_dir.display(),
        protected = ?config.route_guard.protected_prefixes,
        login_path = %config.route_guard.login_path,
        "route guard configured"
    );

    let state = state::AppState::new(&config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "storefront edge listening");
    axum::serve(listener, app).await.expect("server failed");
}
