//! Home Assistant AI assistant
//!
//! Turns plain-language requests into Home Assistant automations with
//! Gemini, then checks, draws, runs and installs them.
//!
//! ## Endpoints
//!
//! - `GET /api/entities` - Entity list from Home Assistant
//! - `POST /api/generate` - Write an automation from a description
//! - `POST /api/test` - Validate an automation against the live catalog
//! - `POST /api/execute` - Run an automation's actions now
//! - `POST /api/install` - Save an automation into Home Assistant
//! - `POST /api/visualize` - Flow graph plus AI explanation
//! - `GET /api/debug_automations` - Where automations are stored
//! - `GET /healthz` - Health check

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ha_assist::config::{AppState, Config};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ha_assist=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    info!("Starting Home Assistant AI assistant");
    info!("Home Assistant URL: {}", config.ha_url);
    info!("Gemini model: {}", config.gemini_model);
    if config.supervisor_token.is_empty() {
        warn!("SUPERVISOR_TOKEN is not set; Home Assistant calls will be rejected");
    }
    if config.gemini_key.is_empty() {
        warn!("GOOGLE_API_KEY is not set; generation and analysis will fail");
    }
    info!("Binding to: {}", bind_addr);

    let app = ha_assist::router(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
