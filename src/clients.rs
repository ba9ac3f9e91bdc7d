//! External HTTP clients for Home Assistant and Gemini
//!
//! Both borrow the shared [`AppState`] so every call uses the startup
//! configuration and the pooled `reqwest::Client`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::AppState;
use crate::types::{GeminiContent, GeminiPart, GeminiRequest, GeminiResponse};

/// Timeout for catalog reads and the automation reload.
pub const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for automation config writes.
pub const CONFIG_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for text generation calls.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

// ═══════════════════════════════════════════════════════════════════════════
// Service Catalog
// ═══════════════════════════════════════════════════════════════════════════

/// Services known to Home Assistant, keyed by domain then service name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceCatalog {
    domains: BTreeMap<String, Map<String, Value>>,
}

impl ServiceCatalog {
    /// Normalize the `/services` payload.
    ///
    /// Newer cores answer with `[{"domain": "light", "services": {...}}, ...]`,
    /// older ones with `{"light": {...}, ...}`. Anything else is treated as
    /// an empty catalog.
    pub fn from_backend(raw: Value) -> Self {
        let mut domains = BTreeMap::new();

        match raw {
            Value::Array(records) => {
                for record in records {
                    let domain = record
                        .get("domain")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    if domain.is_empty() {
                        continue;
                    }
                    let services = match record.get("services") {
                        Some(Value::Object(services)) => services.clone(),
                        _ => Map::new(),
                    };
                    domains.insert(domain.to_string(), services);
                }
            }
            Value::Object(by_domain) => {
                for (domain, services) in by_domain {
                    let services = match services {
                        Value::Object(services) => services,
                        _ => Map::new(),
                    };
                    domains.insert(domain, services);
                }
            }
            _ => {}
        }

        Self { domains }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Services listed for a domain; `None` when the domain is unknown or
    /// lists nothing.
    pub fn services(&self, domain: &str) -> Option<&Map<String, Value>> {
        self.domains.get(domain).filter(|services| !services.is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Home Assistant Client (supervisor core API)
// ═══════════════════════════════════════════════════════════════════════════

/// Status and body of a backend reply, whatever the status.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: String,
}

impl BackendReply {
    /// The config endpoints answer 200 or 201 on success.
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, StatusCode::OK | StatusCode::CREATED)
    }
}

pub struct HomeAssistantClient<'a> {
    state: &'a AppState,
}

impl<'a> HomeAssistantClient<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.state.config.ha_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            "Authorization",
            format!("Bearer {}", self.state.config.supervisor_token),
        )
    }

    /// GET /states - Every entity with its current state
    pub async fn try_fetch_entities(&self) -> Result<Vec<Value>> {
        let response = self
            .authorized(self.state.http_client.get(self.url("/states")))
            .timeout(CATALOG_TIMEOUT)
            .send()
            .await
            .context("Failed to fetch entities from Home Assistant")?
            .error_for_status()
            .context("Home Assistant rejected the entity request")?;

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse entity list")?;

        match payload {
            Value::Array(entities) => Ok(entities),
            other => anyhow::bail!("Unexpected entity payload: {}", kind_of(&other)),
        }
    }

    /// Entity list, empty when Home Assistant cannot be reached.
    pub async fn fetch_entities(&self) -> Vec<Value> {
        match self.try_fetch_entities().await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Entity catalog unavailable");
                Vec::new()
            }
        }
    }

    /// GET /services - Available services by domain
    pub async fn try_fetch_services(&self) -> Result<ServiceCatalog> {
        let response = self
            .authorized(self.state.http_client.get(self.url("/services")))
            .timeout(CATALOG_TIMEOUT)
            .send()
            .await
            .context("Failed to fetch services from Home Assistant")?
            .error_for_status()
            .context("Home Assistant rejected the service request")?;

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse service list")?;

        Ok(ServiceCatalog::from_backend(payload))
    }

    /// Service catalog, empty when Home Assistant cannot be reached.
    pub async fn fetch_services(&self) -> ServiceCatalog {
        match self.try_fetch_services().await {
            Ok(services) => services,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Service catalog unavailable");
                ServiceCatalog::default()
            }
        }
    }

    /// POST /services/{domain}/{service} - Invoke a service
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: &Value,
        timeout: Duration,
    ) -> reqwest::Result<BackendReply> {
        self.post_json(
            &format!("/services/{}/{}", segment(domain), segment(service)),
            payload,
            timeout,
        )
        .await
    }

    /// POST /services/automation/reload
    pub async fn reload_automations(&self) -> reqwest::Result<BackendReply> {
        self.post_json(
            "/services/automation/reload",
            &Value::Object(Map::new()),
            CATALOG_TIMEOUT,
        )
        .await
    }

    /// POST /config/automation/config/{id} - Create or replace by id
    pub async fn save_automation_config(
        &self,
        id: &str,
        payload: &Value,
    ) -> reqwest::Result<BackendReply> {
        self.post_json(
            &format!("/config/automation/config/{}", segment(id)),
            payload,
            CONFIG_TIMEOUT,
        )
        .await
    }

    /// POST /config/automation/config - Create in the collection
    pub async fn create_automation_config(&self, payload: &Value) -> reqwest::Result<BackendReply> {
        self.post_json("/config/automation/config", payload, CONFIG_TIMEOUT)
            .await
    }

    async fn post_json(
        &self,
        path: &str,
        payload: &Value,
        timeout: Duration,
    ) -> reqwest::Result<BackendReply> {
        let response = self
            .authorized(self.state.http_client.post(self.url(path)))
            .json(payload)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(path = %path, status = %status, "Home Assistant replied");

        Ok(BackendReply { status, body })
    }
}

/// Percent-encode a value used as a single URL path segment.
fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Gemini Client (generativelanguage.googleapis.com)
// ═══════════════════════════════════════════════════════════════════════════

pub struct GeminiClient<'a> {
    state: &'a AppState,
}

impl<'a> GeminiClient<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// POST /models/{model}:generateContent - Single prompt, single text reply
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.state.config.gemini_url, model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .state
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.state.config.gemini_key)
            .json(&request)
            .timeout(GENERATION_TIMEOUT)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini returned {}: {}", status, error_body);
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let text: String = gemini_response
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!("Gemini returned no text");
        }

        Ok(text)
    }
}
