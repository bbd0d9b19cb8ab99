//! Startup readiness bootstrap.
//!
//! Waits for the inference backend to answer, then makes sure the configured
//! model is present, pulling it when allowed.

use crate::config::ReadinessConfig;
use crate::error::RelayError;
use crate::services::providers::{model_matches, ChatProvider, ProviderError};
use backoff::future::retry_notify;
use backoff::ExponentialBackoffBuilder;
use std::time::{Duration, Instant};

/// Poll the backend health check with exponential backoff until it succeeds
/// or the elapsed budget runs out.
pub async fn wait_until_ready(
    provider: &dyn ChatProvider,
    config: &ReadinessConfig,
) -> Result<(), RelayError> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(config.initial_interval())
        .with_max_interval(config.max_interval())
        .with_max_elapsed_time(Some(config.max_elapsed()))
        .build();

    let start = Instant::now();

    retry_notify(
        policy,
        || async {
            // A stalled check may not outlive the overall budget.
            let budget = config
                .max_elapsed()
                .saturating_sub(start.elapsed())
                .max(config.initial_interval());
            let outcome = match tokio::time::timeout(budget, provider.health_check()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Unavailable(format!(
                    "health check gave no answer within {}ms",
                    budget.as_millis()
                ))),
            };
            outcome.map_err(backoff::Error::transient)
        },
        |err: ProviderError, wait: Duration| {
            tracing::warn!(
                error = %err,
                retry_in_ms = wait.as_millis() as u64,
                "Backend not ready yet"
            );
        },
    )
    .await
    .map_err(|e| {
        RelayError::BackendUnavailable(format!(
            "backend not ready after {:.1}s: {}",
            start.elapsed().as_secs_f64(),
            e
        ))
    })?;

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Backend is ready"
    );
    Ok(())
}

/// Make sure `model` is available on the backend.
pub async fn ensure_model(
    provider: &dyn ChatProvider,
    model: &str,
    pull_missing: bool,
) -> Result<(), RelayError> {
    let models = provider.list_models().await?;

    if models.iter().any(|m| model_matches(m, model)) {
        tracing::info!(model = %model, "Model available");
        return Ok(());
    }

    if !pull_missing {
        return Err(ProviderError::ModelNotFound(model.to_string()).into());
    }

    tracing::info!(model = %model, "Model missing, pulling");
    provider.pull_model(model).await?;
    tracing::info!(model = %model, "Model pulled");
    Ok(())
}

/// Full startup sequence: readiness, then model presence.
pub async fn bootstrap(
    provider: &dyn ChatProvider,
    model: &str,
    config: &ReadinessConfig,
) -> Result<(), RelayError> {
    wait_until_ready(provider, config).await?;
    ensure_model(provider, model, config.pull_missing_model).await
}
