//! Automation validator
//!
//! Checks an automation for the sections Home Assistant requires and for
//! references to entities and services that do not exist on the live
//! instance. Catalog lookups degrade gracefully: if the entity list cannot be
//! fetched, entity references are left unverified instead of being reported
//! as missing.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};

use crate::clients::{HomeAssistantClient, ServiceCatalog};
use crate::config::AppState;
use crate::document::{referenced_entities, service_of, split_service, AutomationDocument};
use crate::types::ValidationResult;

/// What the validator knows about the entities on the instance.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityCatalog {
    /// The entity list could not be fetched; references are unverifiable.
    Unavailable(String),
    /// The entity list was fetched. It may legitimately be empty.
    Available(HashSet<String>),
}

impl EntityCatalog {
    /// Build from `/states` records, ignoring anything without an `entity_id`.
    pub fn from_records(records: &[Value]) -> Self {
        let ids = records
            .iter()
            .filter_map(|record| record.get("entity_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        EntityCatalog::Available(ids)
    }

    /// True only when the catalog is known and does not list the entity.
    pub fn is_missing(&self, entity_id: &str) -> bool {
        match self {
            EntityCatalog::Unavailable(_) => false,
            EntityCatalog::Available(ids) => !ids.contains(entity_id),
        }
    }
}

/// Validate automation YAML against the live Home Assistant catalog.
pub async fn validate(state: &AppState, text: &str) -> ValidationResult {
    let document = match AutomationDocument::parse(text) {
        Ok(document) => document,
        Err(e) => return ValidationResult::failure(format!("invalid document: {}", e)),
    };

    let ha = HomeAssistantClient::new(state);

    let entities = match ha.try_fetch_entities().await {
        Ok(records) => {
            info!(count = records.len(), "Loaded entities from Home Assistant");
            EntityCatalog::from_records(&records)
        }
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Entity verification unavailable");
            EntityCatalog::Unavailable(e.to_string())
        }
    };

    let mut service_warning = None;
    let services = match ha.try_fetch_services().await {
        Ok(services) => {
            info!(domains = services.len(), "Loaded services from Home Assistant");
            services
        }
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Service verification unavailable");
            service_warning = Some(format!("unable to verify services: {}", e));
            ServiceCatalog::default()
        }
    };

    let mut result = check(&document, &entities, &services);
    result.warnings.extend(service_warning);
    result.finish()
}

/// Run every structural and referential check against known catalogs.
pub fn check(
    document: &AutomationDocument,
    entities: &EntityCatalog,
    services: &ServiceCatalog,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    if let EntityCatalog::Unavailable(reason) = entities {
        result.warnings.push(format!(
            "unable to verify entities: {}; results may be inaccurate",
            reason
        ));
    }

    let sections = [
        ("Trigger", document.triggers()),
        ("Condition", document.conditions()),
        ("Action", document.actions()),
    ];
    for (section, entries) in sections {
        for entry in entries.into_iter().filter(|entry| entry.is_object()) {
            for entity_id in referenced_entities(entry) {
                if entities.is_missing(&entity_id) {
                    result.errors.push(format!(
                        "{}: entity '{}' does not exist",
                        section, entity_id
                    ));
                    result.entity_errors.insert(
                        entity_id,
                        "entity not found in Home Assistant".to_string(),
                    );
                }
            }
        }
    }

    if !services.is_empty() {
        for action in document.actions() {
            let Some(service) = service_of(action) else {
                continue;
            };
            let Some((domain, name)) = split_service(service) else {
                continue;
            };
            // Domains missing from the catalog are unverifiable, not wrong.
            let Some(known) = services.services(domain) else {
                continue;
            };
            if !known.contains_key(name) {
                result.errors.push(format!(
                    "service '{}' is not available in Home Assistant",
                    service
                ));
                result
                    .service_errors
                    .insert(service.to_string(), "service not available".to_string());
            }
        }
    }

    if !document.has_content("trigger") {
        result.errors.push("missing 'trigger'".to_string());
    }
    if !document.has_content("action") {
        result.errors.push("missing 'action'".to_string());
    }

    result.finish()
}
