//! Shared helpers: in-process stand-ins for Home Assistant and Gemini.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, RawQuery},
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ha_assist::config::{AppState, Config};

/// Every request a stub received, as `"METHOD /path"` plus its JSON body.
pub type CallLog = Arc<Mutex<Vec<(String, Value)>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(call, _)| call.clone()).collect()
}

/// Serve a router on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn state_for(ha_url: &str, gemini_url: &str) -> AppState {
    AppState::new(Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ha_url: ha_url.to_string(),
        supervisor_token: "test-token".to_string(),
        gemini_url: gemini_url.to_string(),
        gemini_key: "test-key".to_string(),
        gemini_model: "gemini-test".to_string(),
        gemini_explain_model: "gemini-explain-test".to_string(),
    })
}

pub fn sample_entities() -> Value {
    json!([
        {"entity_id": "light.kitchen", "state": "off", "attributes": {"friendly_name": "Kitchen"}},
        {"entity_id": "binary_sensor.front_door", "state": "off", "attributes": {}},
        {"entity_id": "automation.morning", "state": "on", "attributes": {"friendly_name": "Morning"}}
    ])
}

pub fn sample_services() -> Value {
    json!([
        {"domain": "light", "services": {"turn_on": {}, "turn_off": {}}},
        {"domain": "notify", "services": {"mobile_app": {}}}
    ])
}

/// Home Assistant stand-in.
///
/// Catalog endpoints answer with the given payloads. Service calls answer
/// 200, except services named `fail` (500 with a body) and `fail_silently`
/// (503, empty body). Services named `slow` answer after five seconds.
/// Config endpoints answer with the given statuses.
pub fn home_assistant(
    log: CallLog,
    entities: Value,
    services: Value,
    config_by_id: StatusCode,
    config_collection: StatusCode,
) -> Router {
    let states_log = log.clone();
    let services_log = log.clone();
    let call_log = log.clone();
    let by_id_log = log.clone();
    let collection_log = log;

    Router::new()
        .route(
            "/states",
            get(move || {
                let log = states_log.clone();
                let entities = entities.clone();
                async move {
                    log.lock().unwrap().push(("GET /states".to_string(), Value::Null));
                    Json(entities)
                }
            }),
        )
        .route(
            "/services",
            get(move || {
                let log = services_log.clone();
                let services = services.clone();
                async move {
                    log.lock().unwrap().push(("GET /services".to_string(), Value::Null));
                    Json(services)
                }
            }),
        )
        .route(
            "/services/:domain/:service",
            post(
                move |Path((domain, service)): Path<(String, String)>, Json(body): Json<Value>| {
                    let log = call_log.clone();
                    async move {
                        log.lock()
                            .unwrap()
                            .push((format!("POST /services/{}/{}", domain, service), body));
                        if service == "slow" {
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                        match service.as_str() {
                            "fail" => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
                            "fail_silently" => (StatusCode::SERVICE_UNAVAILABLE, String::new()),
                            _ => (StatusCode::OK, "[]".to_string()),
                        }
                    }
                },
            ),
        )
        .route(
            "/config/automation/config/:id",
            post(move |Path(id): Path<String>, Json(body): Json<Value>| {
                let log = by_id_log.clone();
                async move {
                    log.lock()
                        .unwrap()
                        .push((format!("POST /config/automation/config/{}", id), body));
                    (config_by_id, "{\"result\": \"ok\"}".to_string())
                }
            }),
        )
        .route(
            "/config/automation/config",
            post(move |Json(body): Json<Value>| {
                let log = collection_log.clone();
                async move {
                    log.lock()
                        .unwrap()
                        .push(("POST /config/automation/config".to_string(), body));
                    (config_collection, "{\"result\": \"ok\"}".to_string())
                }
            }),
        )
}

/// Home Assistant stand-in with the sample catalog and accepting config API.
pub fn default_home_assistant(log: CallLog) -> Router {
    home_assistant(
        log,
        sample_entities(),
        sample_services(),
        StatusCode::OK,
        StatusCode::OK,
    )
}

/// Gemini stand-in answering every prompt with `reply`.
///
/// Requests without the `test-key` API key header get 401. Any query
/// string is kept in the recorded call.
pub fn gemini(log: CallLog, reply: &str) -> Router {
    let reply = reply.to_string();
    Router::new().route(
        "/models/:model",
        post(
            move |Path(model): Path<String>,
                  RawQuery(query): RawQuery,
                  headers: HeaderMap,
                  Json(body): Json<Value>| {
                let log = log.clone();
                let reply = reply.clone();
                async move {
                    let call = match query {
                        Some(query) => format!("POST /models/{}?{}", model, query),
                        None => format!("POST /models/{}", model),
                    };
                    log.lock().unwrap().push((call, body));

                    let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
                    if key != Some("test-key") {
                        return (StatusCode::UNAUTHORIZED, "missing API key").into_response();
                    }
                    Json(json!({
                        "candidates": [{"content": {"parts": [{"text": reply}]}}]
                    }))
                    .into_response()
                }
            },
        ),
    )
}

/// Send a JSON request through the app router.
pub async fn send(state: AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = ha_assist::router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}
