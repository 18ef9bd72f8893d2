//! HTTP wrapper around the BlinderFit backend.
//!
//! Every call is a single request: no retries, no timeout, no backoff. A
//! non-success status is turned into an [`AiError`] carrying the status and
//! a summary of the body.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{AiError, ChatRequest};
use crate::core::auth::AuthContext;
use crate::core::endpoint::endpoint;


/// Anything that can deliver one message to the remote AI endpoint.
///
/// [`ApiClient`] is the production implementation; the request hook only
/// depends on this trait.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, message: &str) -> Result<Value, AiError>;
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, auth: AuthContext) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, auth)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        auth: AuthContext,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = endpoint(&self.base_url, path);
        debug!(%method, %url, "building backend request");
        let builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        self.auth.apply(builder)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, AiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            log_failed_status(status, &body);
            return Err(AiError::from_response(status.as_u16(), &body));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /ai/chat` with an optional context object.
    pub async fn send_message_with_context(
        &self,
        message: &str,
        context: Option<&Value>,
    ) -> Result<Value, AiError> {
        let body = ChatRequest { message, context };
        let request = self.request(Method::POST, "/ai/chat").json(&body);
        self.execute(request).await
    }

    pub async fn health_check(&self) -> Result<Value, AiError> {
        self.execute(self.request(Method::GET, "/health")).await
    }

    pub async fn chat_history(&self, limit: Option<u32>) -> Result<Value, AiError> {
        let mut request = self.request(Method::GET, "/ai/history");
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.execute(request).await
    }

    pub async fn clear_chat_history(&self) -> Result<Value, AiError> {
        self.execute(self.request(Method::DELETE, "/ai/history"))
            .await
    }
}

#[async_trait]
impl MessageSender for ApiClient {
    async fn send_message(&self, message: &str) -> Result<Value, AiError> {
        self.send_message_with_context(message, None).await
    }
}

fn log_failed_status(status: StatusCode, body: &str) {
    if status == StatusCode::UNAUTHORIZED {
        warn!(%status, body, "authentication error; the stored token may be expired");
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(%status, body, "rate limited by backend");
    } else if status.is_server_error() {
        warn!(%status, body, "backend server error");
    } else {
        debug!(%status, body, "backend rejected request");
    }
}
