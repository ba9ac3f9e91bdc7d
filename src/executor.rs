//! Action executor
//!
//! Runs the `action` section of an automation against Home Assistant, one
//! service call per action, in document order. Each call stands alone: a
//! failing action is recorded and the next one is still attempted.
//!
//! Control steps (`delay`, `wait_template`, `wait_for_trigger`) have no
//! remote effect and are skipped without a result.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::clients::HomeAssistantClient;
use crate::config::AppState;
use crate::document::{display, entity_refs, service_of, split_service, AutomationDocument};
use crate::types::{ActionResult, ExecutionReport};

/// Reported when a document has nothing to send to Home Assistant.
pub const NO_ACTIONS: &str = "no actions to execute";

const CONTROL_KEYS: [&str; 3] = ["delay", "wait_template", "wait_for_trigger"];

/// Longest message preview shown in a result label.
const MESSAGE_PREVIEW_CHARS: usize = 30;

/// What a single action entry turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPlan {
    /// A service call with its assembled payload.
    Call {
        service: String,
        payload: Map<String, Value>,
    },
    /// A delay or wait step; nothing to send.
    Control,
    /// Not a mapping, or no service can be derived from it.
    Unrecognized,
}

/// Work out which service an action calls and with what payload.
///
/// Payload keys are layered in order: bare `entity_id`, then the `target`
/// fields, then `data`, then `scene`/`event`; later layers win.
pub fn plan_action(action: &Value) -> ActionPlan {
    let Some(entry) = action.as_object() else {
        return ActionPlan::Unrecognized;
    };

    let service = match service_of(action) {
        Some(service) => service.to_string(),
        None if entry.contains_key("scene") => "scene.turn_on".to_string(),
        None if entry.contains_key("event") => "event.fire".to_string(),
        None if CONTROL_KEYS.iter().any(|key| entry.contains_key(*key)) => {
            return ActionPlan::Control;
        }
        None => return ActionPlan::Unrecognized,
    };

    let mut payload = Map::new();

    if let Some(entity_id) = entry.get("entity_id") {
        payload.insert("entity_id".to_string(), entity_id.clone());
    }
    if let Some(Value::Object(target)) = entry.get("target") {
        for key in ["entity_id", "device_id", "area_id"] {
            if let Some(value) = target.get(key) {
                payload.insert(key.to_string(), value.clone());
            }
        }
    }
    if let Some(Value::Object(data)) = entry.get("data") {
        for (key, value) in data {
            payload.insert(key.clone(), value.clone());
        }
    }
    if let Some(scene) = entry.get("scene") {
        payload.insert("entity_id".to_string(), scene.clone());
    }
    if let Some(event) = entry.get("event") {
        payload.insert("event_type".to_string(), event.clone());
    }

    ActionPlan::Call { service, payload }
}

/// Per-domain call budget; cameras and media players are slow to answer.
pub fn service_timeout(domain: &str) -> Duration {
    match domain {
        "camera" => Duration::from_secs(60),
        "media_player" => Duration::from_secs(20),
        _ => Duration::from_secs(30),
    }
}

/// Executes automation actions against Home Assistant.
pub struct ActionExecutor<'a> {
    ha: HomeAssistantClient<'a>,
    timeout: Option<Duration>,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            ha: HomeAssistantClient::new(state),
            timeout: None,
        }
    }

    /// Use one call budget for every domain instead of [`service_timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Execute every service-calling action in the document.
    pub async fn execute(&self, document: &AutomationDocument) -> ExecutionReport {
        let mut results = Vec::new();

        for (index, action) in document.actions().into_iter().enumerate() {
            let position = index + 1;
            match plan_action(action) {
                ActionPlan::Call { service, payload } => {
                    results.push(self.call(&service, payload).await);
                }
                ActionPlan::Control => {
                    info!(position, "Action is a delay/wait step, skipping");
                }
                ActionPlan::Unrecognized => {
                    warn!(position, action = %action, "Action has no recognizable service, skipping");
                }
            }
        }

        if results.is_empty() {
            return ExecutionReport {
                success: false,
                results,
                total_actions: 0,
                error: Some(NO_ACTIONS.to_string()),
            };
        }

        ExecutionReport {
            success: results.iter().all(|result| result.success),
            total_actions: results.len(),
            results,
            error: None,
        }
    }

    async fn call(&self, service: &str, payload: Map<String, Value>) -> ActionResult {
        let Some((domain, name)) = split_service(service) else {
            return ActionResult::failed(service, "invalid service format");
        };

        let timeout = self.timeout.unwrap_or_else(|| service_timeout(domain));
        let payload = Value::Object(payload);
        info!(domain = %domain, service = %name, data = %payload, "Calling service");

        match self.ha.call_service(domain, name, &payload, timeout).await {
            Ok(reply) if reply.status == StatusCode::OK => {
                ActionResult::succeeded(describe_call(service, &payload), "executed successfully")
            }
            Ok(reply) => {
                warn!(domain = %domain, service = %name, status = %reply.status, "Service call rejected");
                let error = if reply.body.is_empty() {
                    format!("HTTP {}", reply.status.as_u16())
                } else {
                    reply.body
                };
                ActionResult::failed(service, error)
            }
            Err(e) if e.is_timeout() => {
                warn!(domain = %domain, service = %name, "Service call timed out");
                ActionResult::failed(
                    service,
                    format!(
                        "timeout (>{}s): the service took too long; it may still have completed, check your devices",
                        timeout.as_secs()
                    ),
                )
            }
            Err(e) => {
                warn!(domain = %domain, service = %name, error = %e, "Service call failed");
                ActionResult::failed(service, format!("connection error: {}", e))
            }
        }
    }
}

/// Human-readable label for a successful call.
fn describe_call(service: &str, payload: &Value) -> String {
    if let Some(entity) = payload.get("entity_id") {
        let shown = match entity_refs(Some(entity)).as_slice() {
            [] => display(Some(entity)),
            [only] => only.clone(),
            [first, rest @ ..] => format!("{} (+{})", first, rest.len()),
        };
        return format!("{} → {}", service, shown);
    }

    if let Some(message) = payload.get("message").and_then(Value::as_str) {
        let preview = if message.chars().count() > MESSAGE_PREVIEW_CHARS {
            let head: String = message.chars().take(MESSAGE_PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            message.to_string()
        };
        return format!("{} → \"{}\"", service, preview);
    }

    service.to_string()
}
