use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Readiness of the relay, which is the readiness of its backend.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.provider.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "diagram-relay",
                "version": env!("CARGO_PKG_VERSION"),
                "model": state.config.backend.model,
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Backend health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "diagram-relay",
                    "error": e.to_string()
                })),
            )
        }
    }
}
