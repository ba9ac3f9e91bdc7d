//! Automation explainer
//!
//! Asks Gemini for a structured, plain-language explanation of an automation.
//! Whatever the model answers, callers always receive all five fields.

use serde_json::Value;
use tracing::warn;

use crate::clients::GeminiClient;
use crate::config::AppState;
use crate::document::{display, AutomationDocument};
use crate::types::Explanation;

/// Explain automation YAML. Never fails; falls back to generic guidance.
pub async fn explain(state: &AppState, text: &str) -> Explanation {
    let document = match AutomationDocument::parse(text) {
        Ok(document) => document,
        Err(e) => {
            warn!(error = %e, "Cannot explain an unreadable automation");
            return analysis_unavailable();
        }
    };
    let alias = document.str_field("alias").unwrap_or("Automation");

    let gemini = GeminiClient::new(state);
    match gemini
        .generate(&state.config.gemini_explain_model, &build_prompt(text))
        .await
    {
        Ok(reply) => parse_explanation(&reply, alias),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Automation analysis failed");
            analysis_unavailable()
        }
    }
}

/// Parse a model reply, back-filling any missing field.
///
/// Each key is read on its own: a mistyped key falls back to its default
/// without discarding the rest of the reply.
pub fn parse_explanation(reply: &str, alias: &str) -> Explanation {
    let body = extract_fenced(reply);

    let fields = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            warn!("Model reply is JSON but not an object");
            return analysis_unparsed();
        }
        Err(e) => {
            let preview: String = body.chars().take(200).collect();
            warn!(error = %e, reply = %preview, "Model reply is not valid JSON");
            return analysis_unparsed();
        }
    };

    Explanation {
        summary: text_field(fields.get("summary"))
            .unwrap_or_else(|| format!("Automation: {}", alias)),
        triggers: list_field(fields.get("triggers")),
        conditions: list_field(fields.get("conditions")),
        actions: list_field(fields.get("actions")),
        suggestions: list_field(fields.get("suggestions")),
    }
}

/// Body of the first ```json (or bare ```) fence, or the whole reply.
pub fn extract_fenced(reply: &str) -> &str {
    let reply = reply.trim();
    let fenced = reply
        .split_once("```json")
        .or_else(|| reply.split_once("```"))
        .map(|(_, rest)| rest.split("```").next().unwrap_or(rest));

    fenced.unwrap_or(reply).trim()
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// A list of strings; a lone string becomes one item and non-string items
/// are rendered as text.
fn list_field(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| display(Some(item)))
            .collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text.clone()],
        _ => Vec::new(),
    }
}

fn analysis_unparsed() -> Explanation {
    Explanation {
        summary: "The automation looks valid but could not be analysed in detail.".to_string(),
        triggers: vec!["Check the triggers in the YAML".to_string()],
        conditions: Vec::new(),
        actions: vec!["Check the actions in the YAML".to_string()],
        suggestions: vec!["Use the test to check validity".to_string()],
    }
}

fn analysis_unavailable() -> Explanation {
    Explanation {
        summary: "Automation present but analysis is not available right now.".to_string(),
        triggers: Vec::new(),
        conditions: Vec::new(),
        actions: Vec::new(),
        suggestions: vec!["Try again later".to_string()],
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        r#"Analyze this Home Assistant automation in a simple and clear way.

AUTOMATION:
{}

Respond ONLY with a valid JSON object (no markdown):
{{
    "summary": "Brief explanation of what it does (1-2 sentences)",
    "triggers": ["list of when it triggers"],
    "conditions": ["list of necessary conditions"],
    "actions": ["list of executed actions"],
    "suggestions": ["2-3 improvement suggestions"]
}}

IMPORTANT: Respond ONLY with the JSON, no additional text or markdown."#,
        text
    )
}
