use diagram_relay::config::RelayConfig;
use diagram_relay::startup::Application;
use service_core::error::AppError;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = RelayConfig::load()?;

    init_tracing(
        "diagram-relay",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %config.backend.base_url,
        model = %config.backend.model,
        "Starting diagram relay"
    );

    let app = Application::build(config).await?;
    app.run_until_stopped().await?;

    tracing::info!("Diagram relay stopped");
    Ok(())
}
