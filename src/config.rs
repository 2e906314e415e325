//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Service configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the REST server binds to.
    pub bind_addr: String,
    /// Path to the libSQL database file.
    pub db_path: PathBuf,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
    /// LLM backend to use.
    pub llm_backend: LlmBackend,
    /// Model name passed to the backend.
    pub llm_model: String,
    /// API key for the LLM backend.
    pub llm_api_key: SecretString,
    /// Delay before the splash screen auto-advances.
    pub splash_delay: Duration,
}

impl AppConfig {
    /// Read configuration from `NUTRIMIND_*` environment variables.
    ///
    /// Only the API key is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("NUTRIMIND_LLM_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("NUTRIMIND_LLM_API_KEY".to_string()))?;

        let backend = match std::env::var("NUTRIMIND_LLM_BACKEND")
            .unwrap_or_else(|_| "anthropic".to_string())
            .to_lowercase()
            .as_str()
        {
            "anthropic" => LlmBackend::Anthropic,
            "openai" => LlmBackend::OpenAi,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "NUTRIMIND_LLM_BACKEND".to_string(),
                    message: format!("unknown backend '{other}' (expected anthropic or openai)"),
                });
            }
        };

        let model = std::env::var("NUTRIMIND_LLM_MODEL")
            .unwrap_or_else(|_| default_model(backend).to_string());

        let bind_addr =
            std::env::var("NUTRIMIND_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let db_path = std::env::var("NUTRIMIND_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/nutrimind.db"));

        let log_dir = std::env::var("NUTRIMIND_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./logs"));

        let splash_delay_ms: u64 = match std::env::var("NUTRIMIND_SPLASH_DELAY_MS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "NUTRIMIND_SPLASH_DELAY_MS".to_string(),
                message: format!("'{raw}' is not a valid millisecond count"),
            })?,
            Err(_) => 2_000,
        };

        Ok(Self {
            bind_addr,
            db_path,
            log_dir,
            llm_backend: backend,
            llm_model: model,
            llm_api_key: SecretString::from(api_key),
            splash_delay: Duration::from_millis(splash_delay_ms),
        })
    }
}

fn default_model(backend: LlmBackend) -> &'static str {
    match backend {
        LlmBackend::Anthropic => "claude-sonnet-4-20250514",
        LlmBackend::OpenAi => "gpt-4o",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_per_backend() {
        assert!(default_model(LlmBackend::Anthropic).starts_with("claude"));
        assert!(default_model(LlmBackend::OpenAi).starts_with("gpt"));
    }
}
