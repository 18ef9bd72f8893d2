//! What the user asks the assistant, and how it becomes message text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::AiError;

/// A question for the assistant.
///
/// Text is sent verbatim. Structured questions are sent as their compact
/// JSON text, even when the value happens to be a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub enum Question {
    Text(String),
    Structured(Value),
}

impl Question {
    pub fn into_message(self) -> String {
        match self {
            Question::Text(text) => text,
            Question::Structured(value) => value.to_string(),
        }
    }
}

impl From<&str> for Question {
    fn from(text: &str) -> Self {
        Question::Text(text.to_string())
    }
}

impl From<String> for Question {
    fn from(text: String) -> Self {
        Question::Text(text)
    }
}

impl From<Value> for Question {
    fn from(value: Value) -> Self {
        Question::Structured(value)
    }
}

/// Shape of a fitness-plan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreferences {
    pub focus_area: String,
    pub duration: String,
    pub days_per_week: u32,
}

pub fn plan_prompt<P: Serialize + ?Sized>(
    preferences: &P,
    user_data: &Value,
) -> Result<String, AiError> {
    let preferences = serde_json::to_string(preferences)?;
    let user_data = serde_json::to_string(user_data)?;
    Ok(format!(
        "Generate a personalized fitness plan with these preferences: {preferences}. User data: {user_data}"
    ))
}
