//! Data types for the assistant API and its backends
//!
//! Based on:
//! - the Home Assistant REST API (states, services, automation config)
//! - the Gemini `generateContent` API
//! - the JSON shapes the browser UI consumes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ═══════════════════════════════════════════════════════════════════════════
// Request Types
// ═══════════════════════════════════════════════════════════════════════════

/// Request body for /api/generate
///
/// Absent and `null` fields are treated alike.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub description: Option<String>,
    pub entities: Option<Vec<Value>>,
}

impl GenerateRequest {
    /// The description, unless missing or blank.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    pub fn entities(&self) -> &[Value] {
        self.entities.as_deref().unwrap_or_default()
    }
}

/// Request body for every endpoint that works on an automation's YAML text
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationRequest {
    pub automation: Option<String>,
}

impl AutomationRequest {
    /// The YAML text, unless missing or blank.
    pub fn automation(&self) -> Option<&str> {
        non_blank(self.automation.as_deref())
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}

/// Response from /api/generate
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub automation: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// Validation Types
// ═══════════════════════════════════════════════════════════════════════════

/// Outcome of checking an automation against the live catalog.
///
/// `valid` is true iff `errors` is empty; use [`ValidationResult::finish`]
/// rather than setting it by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub entity_errors: BTreeMap<String, String>,
    pub service_errors: BTreeMap<String, String>,
}

impl ValidationResult {
    /// A failed result carrying a single error.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
        .finish()
    }

    pub fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Graph Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    Trigger,
    Condition,
    Action,
    Logic,
    End,
}

/// A node in the automation flow graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: usize,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub icon: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphInfo {
    pub alias: String,
    pub description: String,
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub info: GraphInfo,
}

/// Graph returned in place of a real one when the document cannot be drawn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphFailure {
    pub error: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum GraphOutcome {
    Built(Graph),
    Failed(GraphFailure),
}

// ═══════════════════════════════════════════════════════════════════════════
// Explanation Types
// ═══════════════════════════════════════════════════════════════════════════

/// Plain-language explanation of an automation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub summary: String,
    pub triggers: Vec<String>,
    pub conditions: Vec<String>,
    pub actions: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Response from /api/visualize
#[derive(Debug, Clone, Serialize)]
pub struct VisualizeResponse {
    pub graph: GraphOutcome,
    pub analysis: Explanation,
}

// ═══════════════════════════════════════════════════════════════════════════
// Execution Types
// ═══════════════════════════════════════════════════════════════════════════

/// Result of one attempted service call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult {
    pub action: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn succeeded(action: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            success: true,
            response: Some(response.into()),
            error: None,
        }
    }

    pub fn failed(action: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            success: false,
            response: None,
            error: Some(error.into()),
        }
    }
}

/// Response from /api/execute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionReport {
    pub success: bool,
    pub results: Vec<ActionResult>,
    pub total_actions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Install Types
// ═══════════════════════════════════════════════════════════════════════════

/// Automation config as sent to the Home Assistant config API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallPayload {
    pub alias: String,
    pub description: String,
    pub trigger: Value,
    pub condition: Value,
    pub action: Value,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_exceeded: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallSuccess {
    pub success: bool,
    pub message: String,
    pub alias: String,
    pub id: String,
    /// Which config endpoint accepted the automation: `api` or `api_post`
    pub method: String,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallFailure {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workaround: Option<String>,
}

/// Response from /api/install
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum InstallReport {
    Installed(InstallSuccess),
    /// The document itself was unusable; nothing was sent to the backend
    Rejected(InstallFailure),
    /// The backend refused the automation on every endpoint
    Failed(InstallFailure),
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        matches!(self, InstallReport::Installed(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Gemini Types
// ═══════════════════════════════════════════════════════════════════════════

/// Gemini generateContent request
#[derive(Debug, Clone, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

/// Gemini generateContent response
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: GeminiContent,
}

// ═══════════════════════════════════════════════════════════════════════════
// Diagnostics Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct PathProbe {
    pub path: String,
    pub exists: bool,
    pub is_file: bool,
    pub size: u64,
}

/// Response from /api/debug_automations
#[derive(Debug, Clone, Serialize, Default)]
pub struct AutomationDiagnostics {
    pub paths_checked: Vec<PathProbe>,
    pub files_found: Vec<String>,
    pub file_content: Option<Value>,
    pub ha_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ha_automations: Option<Value>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
