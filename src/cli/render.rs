//! Terminal output for assistant answers and chat history.

use std::io::{self, Write};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::{ApiEnvelope, ChatHistory};
use crate::core::request::RequestState;

/// The text a user should read for a backend answer.
///
/// Envelopes carrying `data.response` yield that string, bare strings are
/// shown as-is, and anything else is pretty-printed.
pub fn response_text(value: &Value) -> String {
    if let Some(response) = value
        .pointer("/data/response")
        .and_then(Value::as_str)
    {
        return response.to_string();
    }

    match value {
        Value::Null => "(empty response)".to_string(),
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn suggestions(value: &Value) -> Vec<String> {
    value
        .pointer("/data/suggestions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn render_response<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", response_text(value))?;

    let suggestions = suggestions(value);
    if !suggestions.is_empty() {
        writeln!(out)?;
        writeln!(out, "💡 Suggestions:")?;
        for suggestion in suggestions {
            writeln!(out, "  • {suggestion}")?;
        }
    }
    Ok(())
}

pub fn render_history<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    let history = serde_json::from_value::<ApiEnvelope>(value.clone())
        .ok()
        .and_then(|envelope| serde_json::from_value::<ChatHistory>(envelope.data).ok())
        .unwrap_or_default();

    if history.chats.is_empty() {
        return writeln!(out, "No chat history.");
    }

    for (index, chat) in history.chats.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        let when = chat.created_at.as_deref().unwrap_or("unknown time");
        match &chat.session_id {
            Some(session_id) => writeln!(out, "── {when} ({session_id})")?,
            None => writeln!(out, "── {when}")?,
        }
        if let Some(summary) = chat.summary.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "   {summary}")?;
        }
        for message in &chat.messages {
            writeln!(out, "{}: {}", message.role, message.content.trim())?;
        }
    }
    Ok(())
}

/// Shows `⏳ label…` while a request hook reports loading.
///
/// The watcher exits once it observes any settled state, so it cannot
/// outlive the call it was started for.
pub struct LoadingIndicator {
    handle: JoinHandle<()>,
}

impl LoadingIndicator {
    pub fn spawn<W>(mut states: watch::Receiver<RequestState>, label: &str, mut out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let label = label.to_string();
        let handle = tokio::spawn(async move {
            let mut shown = false;
            if states.borrow().is_loading {
                shown = show(&mut out, &label);
            }
            while states.changed().await.is_ok() {
                if !states.borrow_and_update().is_loading {
                    break;
                }
                if !shown {
                    shown = show(&mut out, &label);
                }
            }
            if shown {
                let _ = writeln!(out);
            }
        });
        Self { handle }
    }

    pub async fn finish(self) {
        let _ = self.handle.await;
    }
}

fn show<W: Write>(out: &mut W, label: &str) -> bool {
    let _ = write!(out, "⏳ {label}…");
    let _ = out.flush();
    true
}
