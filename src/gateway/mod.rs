//! HTTP gateway (Axum) for group lookups and on-demand refresh.

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{group_handler, refresh_handler};
pub use state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/v1/groups/{id}", get(group_handler))
        .route("/v1/refresh", post(refresh_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    Json(HealthResponse { status: "ok" }).into_response()
}
