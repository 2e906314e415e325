//! Error types for NutriMind.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Blueprint error: {0}")]
    Blueprint(#[from] BlueprintError),

    #[error("Meal error: {0}")]
    Meal(#[from] MealError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wizard flow errors.
///
/// A rejected `advance()` is NOT an error — it is a normal outcome the UI
/// polls for. These cover genuinely invalid operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Screen index {index} out of range 1..={total}")]
    ScreenOutOfRange { index: u8, total: u8 },

    #[error("Onboarding already completed")]
    AlreadyCompleted,

    #[error("Blueprint generation already in progress")]
    GenerationInProgress,
}

/// Blueprint generation errors.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    #[error("Session is missing required answers: {missing}")]
    IncompleteSession { missing: String },

    #[error("Generation call failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Model returned an unusable blueprint: {reason}")]
    InvalidResponse { reason: String },
}

/// Meal pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum MealError {
    #[error("Failed to fetch photo from {url}: {reason}")]
    PhotoFetch { url: String, reason: String },

    #[error("Analysis call failed: {0}")]
    Analysis(#[from] LlmError),

    #[error("Model returned an unusable analysis: {reason}")]
    InvalidResponse { reason: String },

    #[error("Nothing to analyze: provide a photo or a transcript")]
    EmptyInput,
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
