use axum::{response::IntoResponse, Json};
use serde_json::json;

pub const ROOT_MESSAGE: &str = "AI Diagram Generation Server is running.";

/// Plain-text liveness answer on `/`. Never touches the backend.
pub async fn root() -> &'static str {
    ROOT_MESSAGE
}

/// Answer bare `OPTIONS` requests on the public routes.
///
/// Browser preflights never reach this handler; the CORS layer answers them first.
pub async fn preflight() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
