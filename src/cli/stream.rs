use std::error::Error;
use std::io::{self, Write};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::cli::session::Session;

const STREAM_ID: u64 = 1;

/// Prints tokens as they arrive; returns the assembled answer.
pub async fn stream_answer<W: Write>(
    session: &Session,
    prompt: &str,
    out: &mut W,
) -> Result<String, Box<dyn Error>> {
    let (service, mut rx) = ChatStreamService::new();
    let cancel_token = CancellationToken::new();
    service.spawn_stream(StreamParams {
        client: session.client.clone(),
        message: prompt.to_string(),
        cancel_token: cancel_token.clone(),
        stream_id: STREAM_ID,
    });
    drop(service);

    let mut tokens: Vec<String> = Vec::new();
    let mut failure = None;
    while let Some((message, stream_id)) = rx.recv().await {
        if stream_id != STREAM_ID {
            continue;
        }
        match message {
            StreamMessage::Token(token) if token.is_empty() => {}
            StreamMessage::Token(token) => {
                if !tokens.is_empty() {
                    write!(out, " ")?;
                }
                write!(out, "{token}")?;
                out.flush()?;
                tokens.push(token);
            }
            StreamMessage::Error(err) => failure = Some(err),
            StreamMessage::End => break,
        }
    }
    cancel_token.cancel();

    if !tokens.is_empty() {
        writeln!(out)?;
    }
    debug!(tokens = tokens.len(), "chat stream finished");

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(tokens.join(" ")),
    }
}

pub async fn run_stream(session: &Session, words: Vec<String>) -> Result<(), Box<dyn Error>> {
    let prompt = words.join(" ");
    let answer = stream_answer(session, &prompt, &mut io::stdout()).await;

    let logged = match &answer {
        Ok(text) => session.transcript.log_exchange(&prompt, text),
        Err(_) => session.transcript.log_note("stream interrupted"),
    };
    if let Err(err) = logged {
        warn!(error = %err, "failed to write transcript");
    }

    answer.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::core::auth::AuthContext;
    use crate::utils::logging::TranscriptLog;
    use crate::utils::test_utils::{
        direct_client, http_response, json_response, spawn_mock_backend,
    };

    fn session_for(base_url: String) -> Session {
        Session::from_parts(
            ApiClient::with_client(direct_client(), base_url, AuthContext::signed_out()),
            TranscriptLog::disabled(),
        )
    }

    #[tokio::test]
    async fn tokens_are_printed_with_spaces() {
        let events = concat!(
            "data: {\"token\":\"Stretch\",\"is_final\":false}\n\n",
            "data: {\"token\":\"daily.\",\"is_final\":false}\n\n",
            "data: {\"token\":\"\",\"is_final\":true}\n\n",
        );
        let (base_url, server) =
            spawn_mock_backend(vec![http_response("200 OK", "text/event-stream", events)]).await;
        let session = session_for(base_url);

        let mut out = Vec::new();
        let answer = stream_answer(&session, "mobility tips", &mut out)
            .await
            .unwrap();

        assert_eq!(answer, "Stretch daily.");
        assert_eq!(String::from_utf8(out).unwrap(), "Stretch daily.\n");
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn error_status_is_returned() {
        let (base_url, server) = spawn_mock_backend(vec![json_response(
            "500 Internal Server Error",
            r#"{"detail":"Streaming chat failed"}"#,
        )])
        .await;
        let session = session_for(base_url);

        let mut out = Vec::new();
        let err = stream_answer(&session, "hi", &mut out).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "API request failed with status 500: Streaming chat failed"
        );
        assert!(out.is_empty());
        server.await.unwrap().unwrap();
    }
}
