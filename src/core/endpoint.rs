//! Backend base URL selection and endpoint construction.

use tracing::warn;

use crate::core::config::{Config, Environment};

pub const API_BASE_URL_ENV: &str = "BLINDERFIT_API_BASE_URL";
pub const ENVIRONMENT_ENV: &str = "BLINDERFIT_ENV";

pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8000";
pub const PRODUCTION_BASE_URL: &str = "https://us-central1-blinderfit.cloudfunctions.net/app";

impl Environment {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `BLINDERFIT_ENV`, then the config file, then development.
pub fn resolve_environment(config: &Config) -> Environment {
    if let Some(raw) = non_empty_env(ENVIRONMENT_ENV) {
        match raw.parse() {
            Ok(environment) => return environment,
            Err(reason) => warn!("ignoring {ENVIRONMENT_ENV}: {reason}"),
        }
    }
    config.environment.unwrap_or_default()
}

/// `BLINDERFIT_API_BASE_URL`, then the configured URL, then the default for
/// the resolved environment.
pub fn resolve_base_url(config: &Config) -> String {
    select_base_url(
        non_empty_env(API_BASE_URL_ENV),
        config,
        resolve_environment(config),
    )
}

fn select_base_url(
    override_url: Option<String>,
    config: &Config,
    environment: Environment,
) -> String {
    override_url
        .or_else(|| config.api_base_url.clone())
        .unwrap_or_else(|| environment.default_base_url().to_string())
}

/// Joins a base URL and a path with exactly one slash between them.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
