//! Automation installer
//!
//! Saves an automation into Home Assistant through its config API. The
//! automation-management endpoints differ between core versions, so two are
//! tried in turn and neither is treated as the canonical one:
//!
//! 1. `POST /services/automation/reload` (best effort, result ignored)
//! 2. `POST /config/automation/config/{id}`
//! 3. `POST /config/automation/config`

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::clients::{BackendReply, HomeAssistantClient};
use crate::config::AppState;
use crate::document::{display, AutomationDocument};
use crate::types::{InstallFailure, InstallPayload, InstallReport, InstallSuccess};

/// Advice returned whenever the automation could not be saved through the API.
pub const MANUAL_WORKAROUND: &str = "Copy the YAML and paste it manually in Home Assistant: \
Settings → Automations → Create automation → Edit in YAML.";

/// Longest backend body echoed back in a failure.
const DETAIL_CHARS: usize = 200;

/// Install automation YAML into Home Assistant.
pub async fn install(state: &AppState, text: &str) -> InstallReport {
    let document = match AutomationDocument::parse(text) {
        Ok(document) => document,
        Err(e) => return rejected(format!("invalid document: {}", e)),
    };

    let (id, payload) = match prepare(&document) {
        Ok(prepared) => prepared,
        Err(reason) => return rejected(reason),
    };
    let alias = payload.alias.clone();

    let body = match serde_json::to_value(&payload) {
        Ok(body) => body,
        Err(e) => return failed(format!("unable to encode automation: {}", e), None),
    };

    info!(alias = %alias, id = %id, "Installing automation");
    let ha = HomeAssistantClient::new(state);

    match ha.reload_automations().await {
        Ok(reply) => info!(status = %reply.status, "Automation reload requested"),
        Err(e) => warn!(error = %e, "Automation reload failed"),
    }

    let by_id = ha.save_automation_config(&id, &body).await;
    if accepted(&by_id) {
        return installed(
            &alias,
            &id,
            "api",
            format!("Automation \"{}\" created successfully!", alias),
            "Created through the Home Assistant API. Open Settings → Automations to see it.",
        );
    }
    log_refusal("/config/automation/config/{id}", &by_id);

    let by_collection = ha.create_automation_config(&body).await;
    if accepted(&by_collection) {
        return installed(
            &alias,
            &id,
            "api_post",
            format!("Automation \"{}\" created!", alias),
            "Open Settings → Automations to see it.",
        );
    }
    log_refusal("/config/automation/config", &by_collection);

    match by_id {
        Ok(reply) => failed(
            format!(
                "Home Assistant API unavailable or unauthorized. Status: {}",
                reply.status.as_u16()
            ),
            Some(reply.body.chars().take(DETAIL_CHARS).collect()),
        ),
        Err(e) => failed(format!("unable to create automation via API: {}", e), None),
    }
}

/// Check the document and build the id and config payload to send.
///
/// Fails when the automation has no alias.
pub fn prepare(document: &AutomationDocument) -> Result<(String, InstallPayload), String> {
    if !document.has_content("alias") {
        return Err("automation has no alias; add a unique name".to_string());
    }

    let id = match document.get("id") {
        Some(id) if !display(Some(id)).is_empty() => display(Some(id)),
        _ => {
            let id = generate_id();
            info!(id = %id, "Assigned automation id");
            id
        }
    };

    let payload = InstallPayload {
        alias: display(document.get("alias")),
        description: document.str_field("description").unwrap_or_default().to_string(),
        trigger: section_or_empty(document, "trigger"),
        condition: section_or_empty(document, "condition"),
        action: section_or_empty(document, "action"),
        mode: document.str_field("mode").unwrap_or("single").to_string(),
        variables: document.get("variables").cloned(),
        max: document.get("max").cloned(),
        max_exceeded: document.get("max_exceeded").cloned(),
    };

    Ok((id, payload))
}

/// Time-based id with a short random suffix.
pub fn generate_id() -> String {
    format!(
        "ai_generated_{}_{}",
        Utc::now().timestamp(),
        &uuid::Uuid::new_v4().simple().to_string()[..6]
    )
}

fn section_or_empty(document: &AutomationDocument, key: &str) -> Value {
    match document.get(key) {
        None | Some(Value::Null) => Value::Array(Vec::new()),
        Some(section) => section.clone(),
    }
}

fn accepted(outcome: &reqwest::Result<BackendReply>) -> bool {
    matches!(outcome, Ok(reply) if reply.is_accepted())
}

fn log_refusal(endpoint: &str, outcome: &reqwest::Result<BackendReply>) {
    match outcome {
        Ok(reply) => warn!(endpoint, status = %reply.status, "Config endpoint refused automation"),
        Err(e) => warn!(endpoint, error = %e, "Config endpoint unreachable"),
    }
}

fn installed(alias: &str, id: &str, method: &str, message: String, note: &str) -> InstallReport {
    InstallReport::Installed(InstallSuccess {
        success: true,
        message,
        alias: alias.to_string(),
        id: id.to_string(),
        method: method.to_string(),
        note: note.to_string(),
    })
}

fn rejected(error: String) -> InstallReport {
    InstallReport::Rejected(InstallFailure {
        success: false,
        error,
        detail: None,
        workaround: None,
    })
}

fn failed(error: String, detail: Option<String>) -> InstallReport {
    InstallReport::Failed(InstallFailure {
        success: false,
        error,
        detail,
        workaround: Some(MANUAL_WORKAROUND.to_string()),
    })
}
