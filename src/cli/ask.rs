use std::error::Error;
use std::io;

use clap::Args;
use serde_json::Value;
use tracing::warn;

use crate::cli::render::{render_response, response_text, LoadingIndicator};
use crate::cli::session::Session;
use crate::core::question::{PlanPreferences, Question};
use crate::core::request::AiRequestHook;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PlanArgs {
    /// What the plan should concentrate on (e.g. strength, endurance)
    #[arg(long, value_name = "AREA")]
    pub focus_area: String,

    /// How long the plan should run (e.g. "4 weeks")
    #[arg(long)]
    pub duration: String,

    /// Training days per week
    #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(u32).range(1..=7))]
    pub days_per_week: u32,

    /// Extra profile data as a JSON object
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub user_data: String,
}

impl PlanArgs {
    pub fn preferences(&self) -> PlanPreferences {
        PlanPreferences {
            focus_area: self.focus_area.clone(),
            duration: self.duration.clone(),
            days_per_week: self.days_per_week,
        }
    }
}

/// Builds the question from command-line words. With `json`, the joined
/// words must form one JSON value.
pub fn question_from_words(words: &[String], json: bool) -> Result<Question, serde_json::Error> {
    let text = words.join(" ");
    if json {
        Ok(Question::Structured(serde_json::from_str(&text)?))
    } else {
        Ok(Question::Text(text))
    }
}

pub async fn run_ask(
    session: &Session,
    words: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let question = question_from_words(&words, json)?;
    let shown = question.clone().into_message();

    let hook = AiRequestHook::new(session.client.clone());
    let indicator = LoadingIndicator::spawn(hook.subscribe(), "Thinking", io::stderr());
    let result = hook.ask_ai(question).await;
    indicator.finish().await;

    let value = result?;
    render_response(&mut io::stdout().lock(), &value)?;
    log_exchange(session, &shown, &value);
    Ok(())
}

pub async fn run_plan(session: &Session, plan: PlanArgs) -> Result<(), Box<dyn Error>> {
    let user_data: Value = serde_json::from_str(&plan.user_data)
        .map_err(|err| format!("--user-data is not valid JSON: {err}"))?;
    let preferences = plan.preferences();

    let hook = AiRequestHook::new(session.client.clone());
    let indicator =
        LoadingIndicator::spawn(hook.subscribe(), "Building your plan", io::stderr());
    let result = hook.generate_plan(&preferences, &user_data).await;
    indicator.finish().await;

    let value = result?;
    render_response(&mut io::stdout().lock(), &value)?;
    log_exchange(
        session,
        &format!(
            "Plan: {} for {}, {} days per week",
            preferences.focus_area, preferences.duration, preferences.days_per_week
        ),
        &value,
    );
    Ok(())
}

fn log_exchange(session: &Session, question: &str, answer: &Value) {
    if let Err(err) = session
        .transcript
        .log_exchange(question, &response_text(answer))
    {
        warn!(error = %err, "failed to write transcript");
    }
}
