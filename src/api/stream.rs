//! Token streaming from `POST /ai/chat/stream`.
//!
//! The backend answers with server-sent events, one word per event:
//! `data: {"token": "...", "is_final": false, "timestamp": "..."}`.

use futures_util::StreamExt;
use memchr::memchr;
use reqwest::Method;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{AiError, ApiClient, ChatRequest, StreamChunk};

#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Token(String),
    Error(String),
    End,
}

type StreamSender = mpsc::UnboundedSender<(StreamMessage, u64)>;

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(payload: &str, tx: &StreamSender, stream_id: u64) -> bool {
    if payload == "[DONE]" {
        let _ = tx.send((StreamMessage::End, stream_id));
        return true;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            let _ = tx.send((StreamMessage::Token(chunk.token), stream_id));
            if chunk.is_final {
                let _ = tx.send((StreamMessage::End, stream_id));
            }
            chunk.is_final
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }

            let summary = AiError::from_response(200, payload);
            let err = AiError::new(summary.message());
            let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

fn process_sse_line(line: &str, tx: &StreamSender, stream_id: u64) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, tx, stream_id))
        .unwrap_or(false)
}

pub struct StreamParams {
    pub client: ApiClient,
    pub message: String,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: StreamSender,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                message,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = run_stream(&client, &message, &tx, &cancel_token, stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "chat stream cancelled");
                }
            }
        });
    }
}

async fn run_stream(
    client: &ApiClient,
    message: &str,
    tx: &StreamSender,
    cancel_token: &CancellationToken,
    stream_id: u64,
) {
    let body = ChatRequest {
        message,
        context: None,
    };
    let request = client.request(Method::POST, "/ai/chat/stream").json(&body);

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            let err = AiError::from(err);
            let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        let err = AiError::from_response(status, &error_text);
        let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
        let _ = tx.send((StreamMessage::End, stream_id));
        return;
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut interrupted = false;

    while let Some(chunk) = stream.next().await {
        if cancel_token.is_cancelled() {
            return;
        }

        let chunk_bytes = match chunk {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(stream_id, error = %err, "chat stream interrupted");
                let err = AiError::from(err);
                let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
                interrupted = true;
                break;
            }
        };
        buffer.extend_from_slice(&chunk_bytes);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let should_end = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(line) => process_sse_line(line.trim(), tx, stream_id),
                Err(err) => {
                    warn!(stream_id, error = %err, "invalid UTF-8 in chat stream");
                    false
                }
            };
            buffer.drain(..=newline_pos);
            if should_end {
                return;
            }
        }
    }

    // The last event may arrive without a trailing newline.
    if !interrupted && !buffer.is_empty() {
        match std::str::from_utf8(&buffer) {
            Ok(line) => {
                if process_sse_line(line.trim(), tx, stream_id) {
                    return;
                }
            }
            Err(err) => warn!(stream_id, error = %err, "invalid UTF-8 in chat stream"),
        }
    }

    let _ = tx.send((StreamMessage::End, stream_id));
}
