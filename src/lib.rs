//! Home Assistant AI assistant - Library
//!
//! Re-exports modules for integration testing and builds the HTTP router.

pub mod clients;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod executor;
pub mod explainer;
pub mod generator;
pub mod graph;
pub mod handlers;
pub mod installer;
pub mod types;
pub mod validator;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppState;
use crate::handlers::*;

/// Build the router with every API endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Catalog
        .route("/api/entities", get(entities_handler))
        // AI
        .route("/api/generate", post(generate_handler))
        .route("/api/visualize", post(visualize_handler))
        // Home Assistant round trips
        .route("/api/test", post(test_handler))
        .route("/api/execute", post(execute_handler))
        .route("/api/install", post(install_handler))
        // Diagnostics
        .route("/api/debug_automations", get(debug_automations_handler))
        // Health check
        .route("/healthz", get(health_handler))
        // Add CORS support
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        // Add request tracing
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
