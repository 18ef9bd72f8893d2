use std::error::Error;
use std::io;

use serde_json::Value;

use crate::cli::render::render_history;
use crate::cli::session::Session;

pub async fn run_history(session: &Session, limit: Option<u32>) -> Result<(), Box<dyn Error>> {
    let history = session.client.chat_history(limit).await?;
    render_history(&mut io::stdout().lock(), &history)?;
    Ok(())
}

pub async fn run_clear_history(session: &Session) -> Result<(), Box<dyn Error>> {
    session.client.clear_chat_history().await?;
    println!("✅ Chat history cleared");
    Ok(())
}

pub async fn run_health(session: &Session) -> Result<(), Box<dyn Error>> {
    let status = session.client.health_check().await?;
    println!(
        "✅ {} is reachable ({})",
        session.client.base_url(),
        health_summary(&status)
    );
    Ok(())
}

fn health_summary(status: &Value) -> String {
    match status.get("status").and_then(Value::as_str) {
        Some(state) => state.to_string(),
        None if status.is_null() => "no status reported".to_string(),
        None => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_summary_prefers_status_field() {
        assert_eq!(
            health_summary(&json!({"status": "healthy", "version": "1.0.0"})),
            "healthy"
        );
        assert_eq!(health_summary(&Value::Null), "no status reported");
        assert_eq!(health_summary(&json!("ok")), r#""ok""#);
    }
}
