//! Automation document model
//!
//! An automation is a loosely-typed YAML tree. Sections such as `trigger`,
//! `condition` and `action` may hold a single mapping or a sequence of them,
//! and entity references may be a string or a list of strings. The helpers
//! here normalize those shapes once so the validator, graph builder, executor
//! and installer all read the document the same way.

use serde_json::{Map, Value};

use crate::error::DocumentError;

/// A parsed automation document (root is always a mapping).
#[derive(Debug, Clone)]
pub struct AutomationDocument {
    root: Map<String, Value>,
}

impl AutomationDocument {
    /// Parse YAML text into a document.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(DocumentError::NotAMapping),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// String value of a top-level key, if it is a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.root.get(key).and_then(Value::as_str)
    }

    /// True when the key is present and carries a non-empty value.
    pub fn has_content(&self, key: &str) -> bool {
        !is_blank(self.root.get(key))
    }

    pub fn triggers(&self) -> Vec<&Value> {
        one_or_many(self.root.get("trigger"))
    }

    pub fn conditions(&self) -> Vec<&Value> {
        one_or_many(self.root.get("condition"))
    }

    pub fn actions(&self) -> Vec<&Value> {
        one_or_many(self.root.get("action"))
    }
}

/// Normalize a section that may be absent, a single item, or a sequence.
pub fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) => vec![item],
    }
}

/// Normalize an entity reference that may be a string or a list of strings.
///
/// Non-string list members are ignored.
pub fn entity_refs(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(id)) if !id.is_empty() => vec![id.clone()],
        Some(Value::Array(ids)) => ids
            .iter()
            .filter_map(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Entities referenced through `target.entity_id`.
pub fn target_entity_refs(entry: &Value) -> Vec<String> {
    entity_refs(entry.get("target").and_then(|target| target.get("entity_id")))
}

/// Every entity an entry references, bare `entity_id` first, then the target.
pub fn referenced_entities(entry: &Value) -> Vec<String> {
    let mut ids = entity_refs(entry.get("entity_id"));
    ids.extend(target_entity_refs(entry));
    ids
}

/// The dotted service an action calls via `service` or `action`.
pub fn service_of(action: &Value) -> Option<&str> {
    ["service", "action"]
        .iter()
        .filter_map(|key| action.get(*key).and_then(Value::as_str))
        .find(|service| !service.is_empty())
}

/// Split `domain.service_name` on the first dot.
pub fn split_service(service: &str) -> Option<(&str, &str)> {
    service.split_once('.')
}

/// Absent, null, false, or an empty string/sequence/mapping.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Number(_)) => false,
    }
}

/// Render a scalar for display; strings are shown without quotes.
pub fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
