//! Automation storage diagnostics
//!
//! Operational aid behind `/api/debug_automations`: shows where the
//! automation files live inside the add-on container and what Home Assistant
//! reports as loaded. Every probe reports its own failure inline.

use serde_json::{json, Value};

use crate::clients::HomeAssistantClient;
use crate::config::AppState;
use crate::types::{AutomationDiagnostics, PathProbe};

/// Places an `automations.yaml` may be mounted.
pub const AUTOMATION_PATHS: [&str; 4] = [
    "/homeassistant/automations.yaml",
    "/config/automations.yaml",
    "/data/automations.yaml",
    "/usr/share/hassio/homeassistant/automations.yaml",
];

/// Places a `configuration.yaml` may be mounted.
pub const CONFIGURATION_PATHS: [&str; 2] = [
    "/homeassistant/configuration.yaml",
    "/config/configuration.yaml",
];

const PREVIEW_CHARS: usize = 500;
const LISTED_AUTOMATIONS: usize = 10;

/// Probe the well-known paths and the live entity list.
pub async fn collect(state: &AppState) -> AutomationDiagnostics {
    collect_from(state, &AUTOMATION_PATHS, &CONFIGURATION_PATHS).await
}

pub async fn collect_from(
    state: &AppState,
    automation_paths: &[&str],
    configuration_paths: &[&str],
) -> AutomationDiagnostics {
    let mut diagnostics = AutomationDiagnostics::default();

    for path in automation_paths {
        let probe = probe_path(path).await;
        if probe.exists {
            diagnostics.files_found.push(path.to_string());
        }
        diagnostics.paths_checked.push(probe);
    }

    if let Some(path) = diagnostics.files_found.first() {
        diagnostics.file_content = Some(preview_automations(path).await);
    }

    for path in configuration_paths {
        if tokio::fs::metadata(path).await.is_ok() {
            diagnostics.ha_config = Some(inspect_configuration(path).await);
            break;
        }
    }

    diagnostics.ha_automations = Some(loaded_automations(state).await);
    diagnostics
}

async fn probe_path(path: &str) -> PathProbe {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => PathProbe {
            path: path.to_string(),
            exists: true,
            is_file: metadata.is_file(),
            size: metadata.len(),
        },
        Err(_) => PathProbe {
            path: path.to_string(),
            exists: false,
            is_file: false,
            size: 0,
        },
    }
}

async fn preview_automations(path: &str) -> Value {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => return json!({ "path": path, "error": e.to_string() }),
    };

    let automations_count = if content.trim().is_empty() {
        Ok(0)
    } else {
        serde_yaml::from_str::<Value>(&content).map(|parsed| match parsed {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::Null => 0,
            _ => 1,
        })
    };

    let mut preview = json!({
        "path": path,
        "size": content.len(),
        "lines": content.split('\n').count(),
        "preview": content.chars().take(PREVIEW_CHARS).collect::<String>(),
    });
    match automations_count {
        Ok(count) => preview["automations_count"] = json!(count),
        Err(e) => preview["error"] = json!(e.to_string()),
    }
    preview
}

async fn inspect_configuration(path: &str) -> Value {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => json!({
            "path": path,
            "has_automation_include":
                content.contains("automation:") || content.contains("automations.yaml"),
            "preview": content.chars().take(PREVIEW_CHARS).collect::<String>(),
        }),
        Err(e) => json!({ "path": path, "error": e.to_string() }),
    }
}

async fn loaded_automations(state: &AppState) -> Value {
    match HomeAssistantClient::new(state).try_fetch_entities().await {
        Ok(entities) => {
            let automations: Vec<&Value> = entities
                .iter()
                .filter(|entity| {
                    entity
                        .get("entity_id")
                        .and_then(Value::as_str)
                        .is_some_and(|id| id.starts_with("automation."))
                })
                .collect();

            let names: Vec<Value> = automations
                .iter()
                .take(LISTED_AUTOMATIONS)
                .map(|automation| {
                    automation
                        .get("attributes")
                        .and_then(|attributes| attributes.get("friendly_name"))
                        .or_else(|| automation.get("entity_id"))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect();

            json!({ "count": automations.len(), "list": names })
        }
        Err(e) => json!({ "error": format!("{:#}", e) }),
    }
}
