use crate::error::RelayError;
use crate::models::{build_conversation, GenerateRequest, GenerateResponse};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use metrics::counter;
use std::time::Instant;

/// Relay a prompt to the backend and return the generated Mermaid code verbatim.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, RelayError> {
    let result = relay(&state, payload).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    counter!("relay_generations_total", "outcome" => outcome).increment(1);

    result.map(Json)
}

async fn relay(
    state: &AppState,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<GenerateResponse, RelayError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::info!(error = %rejection.body_text(), "Rejected generate request body");
        RelayError::BadRequest(rejection.body_text())
    })?;

    if state.config.generation.require_prompt && !request.has_prompt() {
        return Err(RelayError::BadRequest("prompt is required".to_string()));
    }

    let model = &state.config.backend.model;
    let messages = build_conversation(request.prompt_text());
    let start = Instant::now();

    tracing::info!(
        model = %model,
        prompt_len = request.prompt_text().len(),
        prompt_present = request.prompt.is_some(),
        "Relaying generation request"
    );

    match state.provider.chat(model, &messages).await {
        Ok(mermaid_code) => {
            tracing::info!(
                model = %model,
                output_len = mermaid_code.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Generation succeeded"
            );
            Ok(GenerateResponse { mermaid_code })
        }
        Err(e) => {
            let err = RelayError::from(e);
            tracing::error!(
                model = %model,
                kind = err.kind(),
                error = %err,
                duration_ms = start.elapsed().as_millis() as u64,
                "Generation failed"
            );
            Err(err)
        }
    }
}
