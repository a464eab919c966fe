//! Error types for Care Assist.

use std::time::Duration;

use crate::llm::RunStatus;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the upstream assistants/completions API.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request failed during {operation}: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid response from upstream: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Upstream HTTP status code, if this error carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            LlmError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Repository/store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conversation session errors.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Run ended without completing: {status}")]
    RunEnded { status: RunStatus },

    #[error("Run did not reach a terminal status within {deadline:?}")]
    PollDeadlineExceeded { deadline: Duration },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Onboarding flow errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Failed to load onboarding questions: {0}")]
    LoadFailed(String),
}

/// Activity catalog errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to load activity catalog: {0}")]
    LoadFailed(String),
}
