use std::sync::Arc;

use crate::models::dto::Message;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::error;
use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(paths(
    health_checker_handler
))]
/// Defines the OpenAPI spec for health endpoints
pub struct HealthApi;
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "HEALTH",
    responses(
        (status = 200, description = "Service and database are reachable", body = Message),
        (status = 503, description = "Database is unreachable", body = Message)
    )
)]
pub async fn health_checker_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, Json(Message::new("OK, I'm alive!"))),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Message::new("Database unavailable")),
            )
        }
    }
}
