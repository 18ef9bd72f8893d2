//! Named settings exposed through `blinderfit set` / `blinderfit unset`.

use std::error::Error;
use std::fmt;

use crate::core::config::data::{Config, Environment};

pub const API_BASE_URL_KEY: &str = "api-base-url";
pub const ENVIRONMENT_KEY: &str = "environment";
pub const KNOWN_KEYS: &[&str] = &[API_BASE_URL_KEY, ENVIRONMENT_KEY];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue { key: &'static str, reason: String },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (known keys: {})",
                KNOWN_KEYS.join(", ")
            ),
            SettingError::InvalidValue { key, reason } => {
                write!(f, "Invalid value for {key}: {reason}")
            }
        }
    }
}

impl Error for SettingError {}

/// Applies `value` to `key` and returns a confirmation line.
pub fn set_value(config: &mut Config, key: &str, value: &str) -> Result<String, SettingError> {
    match key {
        API_BASE_URL_KEY => {
            let trimmed = value.trim().trim_end_matches('/');
            reqwest::Url::parse(trimmed).map_err(|err| SettingError::InvalidValue {
                key: API_BASE_URL_KEY,
                reason: err.to_string(),
            })?;
            config.api_base_url = Some(trimmed.to_string());
            Ok(format!("Set {API_BASE_URL_KEY} to: {trimmed}"))
        }
        ENVIRONMENT_KEY => {
            let environment: Environment =
                value
                    .parse()
                    .map_err(|reason| SettingError::InvalidValue {
                        key: ENVIRONMENT_KEY,
                        reason,
                    })?;
            config.environment = Some(environment);
            Ok(format!("Set {ENVIRONMENT_KEY} to: {environment}"))
        }
        other => Err(SettingError::UnknownKey(other.to_string())),
    }
}

pub fn unset_value(config: &mut Config, key: &str) -> Result<String, SettingError> {
    match key {
        API_BASE_URL_KEY => config.api_base_url = None,
        ENVIRONMENT_KEY => config.environment = None,
        other => return Err(SettingError::UnknownKey(other.to_string())),
    }
    Ok(format!("Unset {key}"))
}
