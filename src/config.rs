//! Configuration module - Environment-based configuration
//!
//! Matches the environment the add-on container receives from the supervisor.

use std::env;
use std::sync::Arc;
use std::time::Duration;

/// Default base URL of the Home Assistant REST API when running as an add-on.
pub const DEFAULT_HA_URL: &str = "http://supervisor/core/api";

/// Default base URL of the Gemini generative language API.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server config
    pub host: String,
    pub port: u16,

    // Home Assistant REST API
    pub ha_url: String,
    pub supervisor_token: String,

    // Gemini API
    pub gemini_url: String,
    pub gemini_key: String,
    /// Model used to write automations
    pub gemini_model: String,
    /// Model used to explain automations
    pub gemini_explain_model: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8099".to_string())
            .parse()
            .unwrap_or(8099);

        Self {
            host,
            port,
            ha_url: env::var("HA_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_HA_URL.to_string()),
            supervisor_token: env::var("SUPERVISOR_TOKEN").unwrap_or_default(),
            gemini_url: env::var("GEMINI_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
            gemini_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            gemini_explain_model: env::var("GEMINI_EXPLAIN_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config: Arc::new(config),
            http_client,
        }
    }
}
