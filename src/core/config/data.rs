use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Deployment the client talks to when no explicit base URL is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment '{other}' (expected 'development' or 'production')"
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL, e.g. "https://api.example.com"
    pub api_base_url: Option<String>,
    pub environment: Option<Environment>,
}

impl Config {
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec!["Current configuration:".to_string()];
        match &self.api_base_url {
            Some(url) => lines.push(format!("  api-base-url: {url}")),
            None => lines.push("  api-base-url: (unset)".to_string()),
        }
        match self.environment {
            Some(environment) => lines.push(format!("  environment: {environment}")),
            None => lines.push(format!(
                "  environment: (unset, defaults to {})",
                Environment::default()
            )),
        }
        lines
    }

    pub fn print_all(&self) {
        for line in self.describe() {
            println!("{line}");
        }
    }
}

/// Shorten paths under the home directory to `~/...` for display.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
