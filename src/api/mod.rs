use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod client;
pub mod error;
pub mod stream;

pub use client::{ApiClient, MessageSender};
pub use error::AiError;

/// Body of `POST /ai/chat` and `POST /ai/chat/stream`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub context: Option<&'a Value>,
}

/// Envelope the backend wraps every JSON answer in.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// One `data:` event of the streaming chat endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub token: String,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// `data` of `GET /ai/history`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatHistory {
    #[serde(default)]
    pub chats: Vec<ChatSession>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChatSession {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}
