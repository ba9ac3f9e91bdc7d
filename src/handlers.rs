//! HTTP request handlers for the assistant API
//!
//! Implements the endpoints the browser UI calls:
//! - GET /api/entities
//! - POST /api/generate
//! - POST /api/test
//! - POST /api/execute
//! - POST /api/install
//! - POST /api/visualize
//! - GET /api/debug_automations

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::info;

use crate::clients::HomeAssistantClient;
use crate::config::AppState;
use crate::document::AutomationDocument;
use crate::executor::ActionExecutor;
use crate::types::*;
use crate::{diagnostics, explainer, generator, graph, installer, validator};

fn bad_request(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn missing_automation() -> Response {
    bad_request("automation YAML missing")
}

// ═══════════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════════

/// GET /api/entities
///
/// Entity list straight from Home Assistant (empty if unreachable)
pub async fn entities_handler(State(state): State<AppState>) -> impl IntoResponse {
    let entities = HomeAssistantClient::new(&state).fetch_entities().await;
    (StatusCode::OK, Json(entities))
}

// ═══════════════════════════════════════════════════════════════════════════
// Generate
// ═══════════════════════════════════════════════════════════════════════════

/// POST /api/generate
///
/// Write an automation for a plain-language description
pub async fn generate_handler(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Response {
    let Some(description) = body.description() else {
        return bad_request("description missing");
    };

    let entities = body.entities();
    info!(entities = entities.len(), "Generating automation");
    let automation = generator::generate(&state, description, entities).await;

    (StatusCode::OK, Json(GenerateResponse { automation })).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════
// Test (validation)
// ═══════════════════════════════════════════════════════════════════════════

/// POST /api/test
///
/// Validate an automation against the live entity and service catalog
pub async fn test_handler(
    State(state): State<AppState>,
    Json(body): Json<AutomationRequest>,
) -> Response {
    let Some(automation) = body.automation() else {
        return missing_automation();
    };

    let result = validator::validate(&state, automation).await;
    info!(valid = result.valid, errors = result.errors.len(), "Automation tested");

    (StatusCode::OK, Json(result)).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════
// Execute
// ═══════════════════════════════════════════════════════════════════════════

/// POST /api/execute
///
/// Run the automation's actions right now, one service call each
pub async fn execute_handler(
    State(state): State<AppState>,
    Json(body): Json<AutomationRequest>,
) -> Response {
    let Some(automation) = body.automation() else {
        return missing_automation();
    };

    let document = match AutomationDocument::parse(automation) {
        Ok(document) => document,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let report = ActionExecutor::new(&state).execute(&document).await;
    info!(
        success = report.success,
        total_actions = report.total_actions,
        "Automation executed"
    );

    (StatusCode::OK, Json(report)).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════
// Install
// ═══════════════════════════════════════════════════════════════════════════

/// POST /api/install
///
/// Save the automation into Home Assistant
pub async fn install_handler(
    State(state): State<AppState>,
    Json(body): Json<AutomationRequest>,
) -> Response {
    let Some(automation) = body.automation() else {
        return missing_automation();
    };

    let report = installer::install(&state, automation).await;
    info!(installed = report.is_success(), "Automation install finished");
    let status = match &report {
        InstallReport::Installed(_) => StatusCode::OK,
        InstallReport::Rejected(_) => StatusCode::BAD_REQUEST,
        InstallReport::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(report)).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════
// Visualize
// ═══════════════════════════════════════════════════════════════════════════

/// POST /api/visualize
///
/// Flow graph plus an AI explanation of the automation
pub async fn visualize_handler(
    State(state): State<AppState>,
    Json(body): Json<AutomationRequest>,
) -> Response {
    let Some(automation) = body.automation() else {
        return missing_automation();
    };

    let graph = graph::build_graph(automation);
    let analysis = explainer::explain(&state, automation).await;

    (StatusCode::OK, Json(VisualizeResponse { graph, analysis })).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════
// Diagnostics
// ═══════════════════════════════════════════════════════════════════════════

/// GET /api/debug_automations
pub async fn debug_automations_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(diagnostics::collect(&state).await))
}

// ═══════════════════════════════════════════════════════════════════════════
// Health Check
// ═══════════════════════════════════════════════════════════════════════════

/// GET /healthz
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
