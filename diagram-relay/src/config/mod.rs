use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub backend: BackendConfig,
    pub readiness: ReadinessConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Ollama-compatible server.
    pub base_url: String,
    /// Model identifier sent with every chat request.
    pub model: String,
    pub request_timeout_secs: u64,
    /// Upper bound for a model pull. Unset means the pull may take as long as the download.
    pub pull_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessConfig {
    /// Skip the startup readiness wait entirely (tests, or a backend that starts later).
    pub enabled: bool,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub max_elapsed_secs: u64,
    /// Pull the configured model when the backend does not have it yet.
    pub pull_missing_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Reject requests whose prompt is missing or blank instead of forwarding an empty turn.
    pub require_prompt: bool,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pull_timeout(&self) -> Option<Duration> {
        self.pull_timeout_secs.map(Duration::from_secs)
    }
}

impl ReadinessConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_secs(self.max_elapsed_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            pull_timeout_secs: None,
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_interval_ms: 500,
            max_interval_ms: 5_000,
            max_elapsed_secs: 60,
            pull_missing_model: true,
        }
    }
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the service settings from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_defaults = BackendConfig::default();
        let readiness_defaults = ReadinessConfig::default();

        let backend = BackendConfig {
            base_url: lookup("OLLAMA_BASE_URL")
                .unwrap_or(backend_defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            model: lookup("RELAY_MODEL").unwrap_or(backend_defaults.model),
            request_timeout_secs: parse_var(
                &lookup,
                "RELAY_REQUEST_TIMEOUT_SECS",
                backend_defaults.request_timeout_secs,
            )?,
            pull_timeout_secs: parse_optional_var(&lookup, "RELAY_PULL_TIMEOUT_SECS")?,
        };

        if backend.model.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RELAY_MODEL must not be empty"
            )));
        }

        let readiness = ReadinessConfig {
            enabled: parse_var(&lookup, "RELAY_READINESS_ENABLED", readiness_defaults.enabled)?,
            initial_interval_ms: parse_var(
                &lookup,
                "RELAY_READINESS_INITIAL_INTERVAL_MS",
                readiness_defaults.initial_interval_ms,
            )?,
            max_interval_ms: parse_var(
                &lookup,
                "RELAY_READINESS_MAX_INTERVAL_MS",
                readiness_defaults.max_interval_ms,
            )?,
            max_elapsed_secs: parse_var(
                &lookup,
                "RELAY_READINESS_MAX_ELAPSED_SECS",
                readiness_defaults.max_elapsed_secs,
            )?,
            pull_missing_model: parse_var(
                &lookup,
                "RELAY_PULL_MISSING_MODEL",
                readiness_defaults.pull_missing_model,
            )?,
        };

        let generation = GenerationConfig {
            require_prompt: parse_var(&lookup, "RELAY_REQUIRE_PROMPT", false)?,
        };

        Ok(RelayConfig {
            common,
            backend,
            readiness,
            generation,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional_var(lookup, key)?.unwrap_or(default))
}

fn parse_optional_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| {
                AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
            })
        })
        .transpose()
}
