//! Automation flow graph
//!
//! Turns an automation into the node/edge graph the visualizer draws:
//!
//! ```text
//! START ─when─▶ trigger(s) ─or─▶ OR ─if─▶ condition(s) ─and─▶ AND ─execute─▶ action ─then─▶ … ─done─▶ END
//! ```
//!
//! Merge nodes only appear when a section has more than one entry. Node ids
//! are handed out in emission order starting at 0.

use serde_json::Value;

use crate::document::{
    display, entity_refs, is_blank, target_entity_refs, AutomationDocument,
};
use crate::error::DocumentError;
use crate::types::{Graph, GraphEdge, GraphFailure, GraphInfo, GraphNode, GraphOutcome, NodeKind};

/// Build the flow graph for automation YAML, or an error graph.
pub fn build_graph(text: &str) -> GraphOutcome {
    match AutomationDocument::parse(text).and_then(|document| graph_of(&document)) {
        Ok(graph) => GraphOutcome::Built(graph),
        Err(e) => GraphOutcome::Failed(GraphFailure {
            error: e.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }),
    }
}

/// Build the flow graph for a parsed document.
pub fn graph_of(document: &AutomationDocument) -> Result<Graph, DocumentError> {
    let mut builder = GraphBuilder::default();

    let start = builder
        .add(NodeKind::Start, "▶️", "START".to_string(), "Automation starts".to_string())
        .id;

    // Triggers
    let mut trigger_ids = Vec::new();
    for (index, trigger) in document.triggers().into_iter().enumerate() {
        if !trigger.is_object() {
            return Err(DocumentError::MalformedEntry {
                section: "trigger",
                position: index + 1,
            });
        }
        let node = builder.add(NodeKind::Trigger, "⏰", trigger_label(trigger), describe(trigger));
        node.entity_id = entity_refs(trigger.get("entity_id")).into_iter().next();
        let id = node.id;
        builder.connect(start, id, "when");
        trigger_ids.push(id);
    }

    let mut frontier = builder.merge(
        &trigger_ids,
        "OR",
        "🔀",
        "Any one of the triggers",
        "or",
    )
    .unwrap_or(start);

    // Conditions
    let mut condition_ids = Vec::new();
    for (index, condition) in document.conditions().into_iter().enumerate() {
        if !condition.is_object() {
            return Err(DocumentError::MalformedEntry {
                section: "condition",
                position: index + 1,
            });
        }
        let node = builder.add(
            NodeKind::Condition,
            "✅",
            condition_label(condition),
            describe(condition),
        );
        node.entity_id = entity_refs(condition.get("entity_id")).into_iter().next();
        let id = node.id;
        builder.connect(frontier, id, "if");
        condition_ids.push(id);
    }

    frontier = builder
        .merge(
            &condition_ids,
            "AND",
            "🔗",
            "All conditions must hold",
            "and",
        )
        .unwrap_or(frontier);

    // Actions
    let mut first_action = true;
    for action in document.actions().into_iter().filter(|action| action.is_object()) {
        let service = action_service(action);
        let (icon, name) = action_style(&service);

        let entities = match entity_refs(action.get("entity_id")) {
            ids if !ids.is_empty() => ids,
            _ => target_entity_refs(action),
        };

        let mut label = format!("{} {}", icon, name);
        if let Some(first) = entities.first() {
            label.push('\n');
            label.push_str(first);
            if entities.len() > 1 {
                label.push_str(&format!("\n+{} more", entities.len() - 1));
            }
        }

        let node = builder.add(NodeKind::Action, icon, label, describe(action));
        node.entity_id = entities.into_iter().next();
        node.service = Some(service);
        let id = node.id;

        builder.connect(frontier, id, if first_action { "execute" } else { "then" });
        first_action = false;
        frontier = id;
    }

    let end = builder
        .add(NodeKind::End, "✅", "END".to_string(), "Automation finished".to_string())
        .id;
    builder.connect(frontier, end, "done");

    Ok(Graph {
        nodes: builder.nodes,
        edges: builder.edges,
        info: GraphInfo {
            alias: document.str_field("alias").unwrap_or("Automation").to_string(),
            description: document.str_field("description").unwrap_or_default().to_string(),
            mode: document.str_field("mode").unwrap_or("single").to_string(),
        },
    })
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    next_id: usize,
}

impl GraphBuilder {
    fn add(&mut self, kind: NodeKind, icon: &str, label: String, description: String) -> &mut GraphNode {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push(GraphNode {
            id,
            label,
            kind,
            icon: icon.to_string(),
            description,
            entity_id: None,
            service: None,
        });
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    fn connect(&mut self, from: usize, to: usize, label: &str) {
        self.edges.push(GraphEdge {
            from,
            to,
            label: label.to_string(),
        });
    }

    /// Collapse a section into the node flow continues from.
    ///
    /// Several entries get a logic node fed by each of them; a single entry
    /// is returned as-is; an empty section yields `None`.
    fn merge(
        &mut self,
        ids: &[usize],
        label: &str,
        icon: &str,
        description: &str,
        edge_label: &str,
    ) -> Option<usize> {
        match ids {
            [] => None,
            [only] => Some(*only),
            _ => {
                let merge = self
                    .add(NodeKind::Logic, icon, label.to_string(), description.to_string())
                    .id;
                for id in ids {
                    self.connect(*id, merge, edge_label);
                }
                Some(merge)
            }
        }
    }
}

fn describe(source: &Value) -> String {
    serde_json::to_string_pretty(source).unwrap_or_default()
}

fn entity_list(entry: &Value) -> String {
    entity_refs(entry.get("entity_id")).join(", ")
}

/// Append `> above` / `< below` lines for numeric comparisons.
fn with_bounds(mut label: String, entry: &Value) -> String {
    if !is_blank(entry.get("above")) {
        label.push_str(&format!("\n> {}", display(entry.get("above"))));
    }
    if !is_blank(entry.get("below")) {
        label.push_str(&format!("\n< {}", display(entry.get("below"))));
    }
    label
}

fn trigger_label(trigger: &Value) -> String {
    // Newer configs spell the platform as `trigger:`.
    let platform = trigger
        .get("platform")
        .or_else(|| trigger.get("trigger"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    match platform {
        "time" => format!("⏰ Time\n{}", display(trigger.get("at"))),
        "state" => format!(
            "🔄 State\n{}\n→ {}",
            entity_list(trigger),
            display(trigger.get("to"))
        ),
        "numeric_state" => with_bounds(format!("📊 Numeric\n{}", entity_list(trigger)), trigger),
        "event" => format!("⚡ Event\n{}", display(trigger.get("event_type"))),
        other => format!("🔔 {}", other),
    }
}

fn condition_label(condition: &Value) -> String {
    let kind = condition
        .get("condition")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    match kind {
        "time" => format!(
            "⏰ Time\n{} - {}",
            display(condition.get("after")),
            display(condition.get("before"))
        ),
        "state" => format!(
            "✅ State\n{}\n= {}",
            entity_list(condition),
            display(condition.get("state"))
        ),
        "numeric_state" => with_bounds(format!("✅ Numeric\n{}", entity_list(condition)), condition),
        "sun" => format!(
            "☀️ Sun\n{}",
            display(condition.get("after").or_else(|| condition.get("before")))
        ),
        other => format!("✅ {}", other),
    }
}

fn action_service(action: &Value) -> String {
    ["service", "action", "scene"]
        .iter()
        .filter_map(|key| action.get(*key).and_then(Value::as_str))
        .find(|service| !service.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Icon and short name for an action, picked by what the service mentions.
fn action_style(service: &str) -> (&'static str, String) {
    let short = service.rsplit('.').next().unwrap_or(service).to_string();

    if service.contains("light") {
        ("💡", short)
    } else if service.contains("climate") || service.contains("heater") {
        ("🔥", short)
    } else if service.contains("notify") {
        ("📱", "notify".to_string())
    } else if service.contains("switch") {
        ("🔌", short)
    } else if service.contains("cover") {
        ("🚪", short)
    } else if service.contains("media_player") {
        ("🎵", short)
    } else {
        ("🎯", service.to_string())
    }
}
