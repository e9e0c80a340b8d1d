//! JSON HTTP service over the estimator, tracking simulator and errand board.

mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::Config;

pub fn build_router(config: Config) -> Router {
    let state = Arc::new(AppState::new(config));

    Router::new()
        .route("/api/estimate", get(handlers::estimate))
        .route("/api/places", get(handlers::places))
        .route("/api/tracking", post(handlers::tracking_start))
        .route(
            "/api/tracking/{id}",
            get(handlers::tracking_get).delete(handlers::tracking_stop),
        )
        .route(
            "/api/errands",
            get(handlers::errands_list).post(handlers::errand_submit),
        )
        .route("/api/errands/{id}", axum::routing::delete(handlers::errand_reject))
        .route("/api/errands/{id}/accept", post(handlers::errand_accept))
        .route("/api/errands/{id}/counter", post(handlers::errand_counter))
        .route("/api/errands/{id}/complete", post(handlers::errand_complete))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl+C.
pub async fn start(config: Config) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(config);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("errand server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
}
