//! Flow graph construction
//!
//! - Node ids are dense and every edge points at existing nodes
//! - OR/AND logic nodes appear only for multi-entry sections
//! - Actions chain in document order and END closes the flow
//! - Generated YAML draws without further processing

use serde_json::json;

use ha_assist::generator::clean_generated;
use ha_assist::graph::build_graph;
use ha_assist::types::{Graph, GraphOutcome, NodeKind};

fn built(yaml: &str) -> Graph {
    match build_graph(yaml) {
        GraphOutcome::Built(graph) => graph,
        GraphOutcome::Failed(failure) => panic!("graph failed: {}", failure.error),
    }
}

fn kinds(graph: &Graph) -> Vec<NodeKind> {
    graph.nodes.iter().map(|node| node.kind).collect()
}

fn assert_well_formed(graph: &Graph) {
    for (index, node) in graph.nodes.iter().enumerate() {
        assert_eq!(node.id, index, "ids must be sequential");
    }
    for edge in &graph.edges {
        assert!(edge.from < graph.nodes.len());
        assert!(edge.to < graph.nodes.len());
    }
    assert_eq!(graph.nodes.first().map(|n| n.kind), Some(NodeKind::Start));
    assert_eq!(graph.nodes.last().map(|n| n.kind), Some(NodeKind::End));

    let end = graph.nodes.len() - 1;
    assert_eq!(graph.edges.iter().filter(|e| e.to == end).count(), 1);
}

const MULTI_TRIGGER: &str = r#"
alias: Evening routine
description: Lights and notification at dusk
mode: restart
trigger:
  - platform: sun
    event: sunset
  - platform: time
    at: "20:00:00"
  - platform: state
    entity_id: binary_sensor.front_door
    to: "on"
condition:
  - condition: state
    entity_id: input_boolean.guest_mode
    state: "off"
  - condition: time
    after: "18:00:00"
action:
  - service: light.turn_on
    target:
      entity_id:
        - light.kitchen
        - light.hall
  - delay: "00:00:05"
  - service: notify.mobile_app
    data:
      message: Evening routine started
"#;

// ═══════════════════════════════════════════════════════════════════════════
// Structure
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_multi_trigger_graph_shape() {
    let graph = built(MULTI_TRIGGER);
    assert_well_formed(&graph);

    assert_eq!(
        kinds(&graph),
        vec![
            NodeKind::Start,
            NodeKind::Trigger,
            NodeKind::Trigger,
            NodeKind::Trigger,
            NodeKind::Logic,
            NodeKind::Condition,
            NodeKind::Condition,
            NodeKind::Logic,
            NodeKind::Action,
            NodeKind::Action,
            NodeKind::Action,
            NodeKind::End,
        ]
    );

    // OR node fed by every trigger
    let or = &graph.nodes[4];
    assert_eq!(or.label, "OR");
    let into_or: Vec<usize> = graph
        .edges
        .iter()
        .filter(|e| e.to == or.id)
        .map(|e| e.from)
        .collect();
    assert_eq!(into_or, vec![1, 2, 3]);
    assert!(graph
        .edges
        .iter()
        .filter(|e| e.to == or.id)
        .all(|e| e.label == "or"));

    // AND node fed by every condition
    let and = &graph.nodes[7];
    assert_eq!(and.label, "AND");
    assert_eq!(graph.edges.iter().filter(|e| e.to == and.id).count(), 2);

    assert_eq!(graph.info.alias, "Evening routine");
    assert_eq!(graph.info.mode, "restart");
}

#[test]
fn test_actions_chain_in_order() {
    let graph = built(MULTI_TRIGGER);

    let edge_labels: Vec<(usize, usize, &str)> = graph
        .edges
        .iter()
        .filter(|e| e.from >= 7)
        .map(|e| (e.from, e.to, e.label.as_str()))
        .collect();

    assert_eq!(
        edge_labels,
        vec![(7, 8, "execute"), (8, 9, "then"), (9, 10, "then"), (10, 11, "done")]
    );

    let lights = &graph.nodes[8];
    assert_eq!(lights.service.as_deref(), Some("light.turn_on"));
    assert_eq!(lights.entity_id.as_deref(), Some("light.kitchen"));
    assert!(lights.label.contains("+1 more"));
}

#[test]
fn test_single_trigger_has_no_logic_node() {
    let graph = built(
        r#"
alias: Simple
trigger:
  platform: state
  entity_id: binary_sensor.front_door
action:
  service: light.turn_on
  entity_id: light.kitchen
"#,
    );
    assert_well_formed(&graph);

    assert!(!kinds(&graph).contains(&NodeKind::Logic));
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.nodes[1].entity_id.as_deref(), Some("binary_sensor.front_door"));

    let labels: Vec<&str> = graph.edges.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["when", "execute", "done"]);
}

#[test]
fn test_empty_automation_connects_start_to_end() {
    let graph = built("alias: Empty\n");

    assert_eq!(kinds(&graph), vec![NodeKind::Start, NodeKind::End]);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].from, 0);
    assert_eq!(graph.edges[0].to, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Failures
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_yaml_yields_error_graph() {
    match build_graph("trigger: [oops") {
        GraphOutcome::Failed(failure) => {
            assert!(!failure.error.is_empty());
            assert!(failure.nodes.is_empty());
            assert!(failure.edges.is_empty());
        }
        GraphOutcome::Built(_) => panic!("expected a failure"),
    }
}

#[test]
fn test_error_graph_serializes_with_empty_lists() {
    let outcome = build_graph("- just\n- a list\n");
    let value = serde_json::to_value(&outcome).unwrap();

    assert!(value["error"].is_string());
    assert_eq!(value["nodes"], json!([]));
    assert_eq!(value["edges"], json!([]));
}

// ═══════════════════════════════════════════════════════════════════════════
// Generated YAML
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_generated_reply_draws_directly() {
    let reply = r#"```yaml
alias: Washer done
description: Tell me when the washer finishes
trigger:
  - platform: state
    entity_id: sensor.washer_status
    to: "idle"
action:
  - service: notify.telegram
    data:
      message: Laundry is ready
mode: single
```"#;

    let yaml = clean_generated(reply);
    assert!(!yaml.contains("```"));
    assert!(yaml.contains("telegram_bot.send_message"));

    let graph = built(&yaml);
    assert_well_formed(&graph);
    assert_eq!(graph.info.alias, "Washer done");

    let action = graph
        .nodes
        .iter()
        .find(|node| node.kind == NodeKind::Action)
        .unwrap();
    assert_eq!(action.service.as_deref(), Some("telegram_bot.send_message"));
}
