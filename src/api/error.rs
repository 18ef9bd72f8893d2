use std::error::Error;
use std::fmt;

/// The single failure kind of an AI call.
///
/// Transport failures, serialization failures and error responses from the
/// backend are all reported through this type. When the backend answered,
/// the HTTP status is kept alongside the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiError {
    message: String,
    status: Option<u16>,
}

impl AiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Builds an error from a non-success response, pulling a short summary
    /// out of JSON bodies when one is present.
    pub fn from_response(status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let message = if trimmed.is_empty() {
            "<empty>".to_string()
        } else {
            serde_json::from_str::<serde_json::Value>(trimmed)
                .ok()
                .and_then(|value| extract_error_summary(&value))
                .filter(|summary| !summary.is_empty())
                .unwrap_or_else(|| trimmed.to_string())
        };

        Self {
            message,
            status: Some(status),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

// FastAPI reports `detail`; proxies and gateways tend to use `error.message`.
fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .get("detail")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "API request failed with status {status}: {}",
                self.message
            ),
            None => write!(f, "API request failed: {}", self.message),
        }
    }
}

impl Error for AiError {}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status: err.status().map(|status| status.as_u16()),
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("invalid JSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_response_prefers_fastapi_detail() {
        let err = AiError::from_response(500, r#"{"detail":"Chat request failed"}"#);
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.message(), "Chat request failed");
        assert_eq!(
            err.to_string(),
            "API request failed with status 500: Chat request failed"
        );
    }

    #[test]
    fn from_response_reads_nested_error_message() {
        let err = AiError::from_response(
            429,
            r#"{"error":{"message":"too   many\nrequests","type":"rate_limit"}}"#,
        );
        assert_eq!(err.message(), "too many requests");
    }

    #[test]
    fn from_response_keeps_plain_bodies() {
        let err = AiError::from_response(502, "  bad gateway \n");
        assert_eq!(err.message(), "bad gateway");

        let empty = AiError::from_response(503, "   ");
        assert_eq!(empty.message(), "<empty>");
    }

    #[test]
    fn from_response_falls_back_to_raw_json_without_summary() {
        let err = AiError::from_response(400, r#"{"status":"failed"}"#);
        assert_eq!(err.message(), r#"{"status":"failed"}"#);
    }

    #[test]
    fn plain_errors_have_no_status() {
        let err = AiError::new("connection refused");
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "API request failed: connection refused");
    }
}
