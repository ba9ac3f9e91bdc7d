//! Installing automations through the Home Assistant config API
//!
//! - Alias is mandatory and checked before any backend call
//! - Reload, then save-by-id, then the collection endpoint as fallback
//! - Failure on every endpoint returns the manual workaround

mod common;

use axum::http::StatusCode;

use common::*;
use ha_assist::installer::{install, MANUAL_WORKAROUND};
use ha_assist::types::InstallReport;

const WASHER: &str = r#"
id: washer_done
alias: Washer done
trigger:
  - platform: state
    entity_id: sensor.washer_status
    to: idle
action:
  - service: notify.mobile_app
    data:
      message: Laundry is ready
"#;

fn ha_with(log: CallLog, by_id: StatusCode, collection: StatusCode) -> axum::Router {
    home_assistant(log, sample_entities(), sample_services(), by_id, collection)
}

#[tokio::test]
async fn test_missing_alias_makes_no_calls() {
    let log = call_log();
    let ha = serve(default_home_assistant(log.clone())).await;
    let state = state_for(&ha, &unreachable_url());

    let report = install(&state, "trigger:\n  platform: sun\naction:\n  delay: 1\n").await;

    match report {
        InstallReport::Rejected(failure) => {
            assert!(!failure.success);
            assert!(failure.error.contains("alias"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_invalid_yaml_is_rejected() {
    let log = call_log();
    let ha = serve(default_home_assistant(log.clone())).await;
    let state = state_for(&ha, &unreachable_url());

    let report = install(&state, "alias: [broken").await;

    assert!(matches!(report, InstallReport::Rejected(_)));
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_saved_by_id() {
    let log = call_log();
    let ha = serve(default_home_assistant(log.clone())).await;
    let state = state_for(&ha, &unreachable_url());

    let report = install(&state, WASHER).await;

    match &report {
        InstallReport::Installed(success) => {
            assert!(success.success);
            assert_eq!(success.method, "api");
            assert_eq!(success.id, "washer_done");
            assert_eq!(success.alias, "Washer done");
        }
        other => panic!("expected install, got {:?}", other),
    }
    assert_eq!(
        calls(&log),
        vec![
            "POST /services/automation/reload",
            "POST /config/automation/config/washer_done",
        ]
    );

    let recorded = log.lock().unwrap();
    let payload = &recorded[1].1;
    assert_eq!(payload["alias"], "Washer done");
    assert_eq!(payload["mode"], "single");
    assert_eq!(payload["condition"], serde_json::json!([]));
    assert_eq!(payload["action"][0]["service"], "notify.mobile_app");
}

#[tokio::test]
async fn test_falls_back_to_collection_endpoint() {
    let log = call_log();
    let ha = serve(ha_with(log.clone(), StatusCode::NOT_FOUND, StatusCode::CREATED)).await;
    let state = state_for(&ha, &unreachable_url());

    let report = install(&state, WASHER).await;

    match &report {
        InstallReport::Installed(success) => assert_eq!(success.method, "api_post"),
        other => panic!("expected install, got {:?}", other),
    }
    assert_eq!(
        calls(&log),
        vec![
            "POST /services/automation/reload",
            "POST /config/automation/config/washer_done",
            "POST /config/automation/config",
        ]
    );
}

#[tokio::test]
async fn test_generated_id_when_absent() {
    let log = call_log();
    let ha = serve(default_home_assistant(log.clone())).await;
    let state = state_for(&ha, &unreachable_url());

    let yaml = WASHER.replace("id: washer_done\n", "");
    let report = install(&state, &yaml).await;

    let InstallReport::Installed(success) = report else {
        panic!("expected install");
    };
    assert!(success.id.starts_with("ai_generated_"));
    assert!(calls(&log).contains(&format!("POST /config/automation/config/{}", success.id)));
}

#[tokio::test]
async fn test_every_endpoint_refuses() {
    let log = call_log();
    let ha = serve(ha_with(
        log.clone(),
        StatusCode::UNAUTHORIZED,
        StatusCode::UNAUTHORIZED,
    ))
    .await;
    let state = state_for(&ha, &unreachable_url());

    let report = install(&state, WASHER).await;

    match &report {
        InstallReport::Failed(failure) => {
            assert!(!failure.success);
            assert!(failure.error.contains("401"));
            assert_eq!(failure.workaround.as_deref(), Some(MANUAL_WORKAROUND));
            assert!(failure.detail.is_some());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_unreachable_backend_fails_with_workaround() {
    let state = state_for(&unreachable_url(), &unreachable_url());

    let report = install(&state, WASHER).await;

    let InstallReport::Failed(failure) = report else {
        panic!("expected failure");
    };
    assert!(failure.error.starts_with("unable to create automation via API"));
    assert_eq!(failure.workaround.as_deref(), Some(MANUAL_WORKAROUND));
}

#[tokio::test]
async fn test_id_is_sent_as_one_path_segment() {
    let log = call_log();
    let ha = serve(default_home_assistant(log.clone())).await;
    let state = state_for(&ha, &unreachable_url());

    let yaml = WASHER.replace("id: washer_done", "id: \"laundry/room?x#1\"");
    let report = install(&state, &yaml).await;

    let InstallReport::Installed(success) = report else {
        panic!("expected install");
    };
    assert_eq!(success.method, "api");
    assert_eq!(success.id, "laundry/room?x#1");
    assert_eq!(
        calls(&log)[1],
        "POST /config/automation/config/laundry/room?x#1"
    );
}
