//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default assistant used for conversation runs when none is configured.
pub const DEFAULT_ASSISTANT_ID: &str = "asst_qiqsbYM7YTvl4WlyScnMK4gZ";

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the upstream assistants/completions service.
    pub api_key: secrecy::SecretString,
    /// Assistant id used when creating conversation runs.
    pub assistant_id: String,
    /// Chat-completion model for one-shot generation (routines, behavior analysis).
    pub completion_model: String,
    /// HTTP bind port.
    pub port: u16,
    /// Interval between run-status polls.
    pub poll_interval: Duration,
    /// Deadline after which an unfinished run poll is abandoned.
    pub poll_deadline: Duration,
    /// Pause after an onboarding option is selected, before advancing.
    pub feedback_delay: Duration,
    /// Path of the preference-store JSON file.
    pub prefs_path: PathBuf,
    /// Bearer token expected by the behavior-log endpoint.
    pub behavior_auth_token: Option<String>,
}

impl Config {
    /// Build configuration from environment variables.
    ///
    /// `CARE_ASSIST_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("CARE_ASSIST_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("CARE_ASSIST_API_KEY".to_string()))?;

        let assistant_id = std::env::var("CARE_ASSIST_ASSISTANT_ID")
            .unwrap_or_else(|_| DEFAULT_ASSISTANT_ID.to_string());

        let completion_model =
            std::env::var("CARE_ASSIST_MODEL").unwrap_or_else(|_| "gpt-4".to_string());

        let port = parse_env("CARE_ASSIST_PORT", 8080)?;
        let poll_interval = Duration::from_millis(parse_env("CARE_ASSIST_POLL_INTERVAL_MS", 1000)?);
        let poll_deadline = Duration::from_secs(parse_env("CARE_ASSIST_POLL_DEADLINE_SECS", 120)?);
        let feedback_delay = Duration::from_millis(parse_env("CARE_ASSIST_FEEDBACK_DELAY_MS", 400)?);

        let prefs_path = std::env::var("CARE_ASSIST_PREFS_PATH")
            .unwrap_or_else(|_| "./data/preferences.json".to_string())
            .into();

        let behavior_auth_token = std::env::var("CARE_ASSIST_BEHAVIOR_TOKEN").ok();

        Ok(Self {
            api_key: secrecy::SecretString::from(api_key),
            assistant_id,
            completion_model,
            port,
            poll_interval,
            poll_deadline,
            feedback_delay,
            prefs_path,
            behavior_auth_token,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse '{raw}'"),
        }),
        Err(_) => Ok(default),
    }
}
