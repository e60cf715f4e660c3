mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub use state::{AppState, SessionRegistry};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/search", get(handlers::quick_search))
        .route("/api/rank", get(handlers::rank))
        .route("/api/ask", get(handlers::ask))
        .route("/api/layers", get(handlers::layer_list))
        .route("/api/layer", get(handlers::layer))
        .route("/api/nearby", get(handlers::nearby))
        .route(
            "/api/favorites",
            get(handlers::favorites_list)
                .post(handlers::favorites_add)
                .delete(handlers::favorites_remove),
        )
        .route("/api/stats", get(handlers::stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: Arc<AppState>) {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(%addr, error = %e, "cannot bind");
            std::process::exit(1);
        });

    info!("GeoLearn server listening on http://{}", addr);
    eprintln!("  GeoLearn server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "server error");
            std::process::exit(1);
        });
}
