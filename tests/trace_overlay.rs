//! Trace overlay on top of a structural graph: values, call sites, and
//! the dataflow edges connecting them to indexed symbols.

mod support;

use serde_json::Value;

use sotmap::graph::{EdgeType, NodeKind};

use support::*;

fn service_documents() -> Vec<scip::types::Document> {
    vec![document(
        "src/Service.php",
        vec![
            definition_with_extent("App/Service#", &[0, 6, 13], &[0, 0, 30, 1]),
            definition_with_extent("App/Service#run().", &[2, 4, 7], &[2, 0, 20, 5]),
            definition_with_extent("App/Service#save().", &[22, 4, 8], &[22, 0, 26, 5]),
            definition("App/User#", &[40, 6, 10]),
        ],
        vec![],
    )]
}

fn service_trace() -> String {
    format!(
        r#"{{
  "values": [
    {{
      "id": "v_input",
      "kind": "parameter",
      "symbol": "{pkg} App/Service#run().($input)",
      "type": "{pkg} App/User#",
      "location": {{"file": "src/Service.php", "line": 3, "col": 8}}
    }},
    {{
      "id": "v_limit",
      "kind": "literal",
      "location": {{"file": "src/Service.php", "line": 5, "col": 12}}
    }},
    {{
      "id": "v_copy",
      "kind": "local",
      "symbol": "{pkg} App/Service#run().local$copy@6",
      "source_value_id": "v_limit",
      "location": {{"file": "src/Service.php", "line": 6, "col": 4}}
    }},
    {{
      "id": "c_save",
      "kind": "result",
      "location": {{"file": "src/Service.php", "line": 14, "col": 8}}
    }}
  ],
  "calls": [
    {{
      "id": "c_save",
      "kind": "method",
      "callee": "{pkg} App/Service#save().",
      "caller": "{pkg} App/Service#run().",
      "receiver_value_id": "v_input",
      "arguments": [{{"position": 0, "value_id": "v_limit"}}],
      "location": {{"file": "src/Service.php", "line": 14, "col": 8}}
    }},
    {{
      "id": "c_new",
      "kind": "constructor",
      "callee": "{pkg} App/User#__construct().",
      "caller": "{pkg} App/Service#run().",
      "return_type": "{pkg} App/User#",
      "location": {{"file": "src/Service.php", "line": 9, "col": 15}}
    }},
    {{
      "id": "c_inline",
      "kind": "constructor",
      "caller": "{pkg} App/Service#run().",
      "return_type": "{pkg} App/User#",
      "location": {{"file": "src/Service.php", "line": 11, "col": 20}}
    }}
  ]
}}"#,
        pkg = PKG
    )
}

fn mapped() -> sotmap::graph::Graph {
    map_with_trace(service_documents(), &service_trace())
}

// ============================================================================
// Nodes
// ============================================================================

#[test]
fn values_and_calls_become_nodes_beside_the_structural_graph() {
    let graph = mapped();

    let input = node_by_kind_and_name(&graph, NodeKind::Value, "$input");
    assert_eq!(input.fqn, "App\\Service::run().$input");
    assert_eq!(input.value_kind.as_deref(), Some("parameter"));
    assert_eq!(input.type_symbol.as_deref(), Some(&ident("App/User#")[..]));
    assert!(input.id.starts_with("node:val:"));
    let range = input.range.unwrap();
    assert_eq!((range.start_line, range.start_col), (3, 8));
    assert_eq!(range.end_col, 8 + "$input".len() as u32);

    let literal = node_by_kind_and_name(&graph, NodeKind::Value, "(literal)");
    assert_eq!(literal.fqn, "src/Service.php:5:(literal)");
    assert_eq!(literal.value_kind.as_deref(), Some("literal"));

    let save_call = node_by_kind_and_name(&graph, NodeKind::Call, "save()");
    assert_eq!(save_call.fqn, "App\\Service::run()@14:8");
    assert_eq!(save_call.call_kind.as_deref(), Some("method"));
    assert_eq!(save_call.identifier, "");
    assert!(save_call.id.starts_with("node:call:"));

    // a constructor with a recorded callee keeps the callee's spelling;
    // one without gets the synthesized form
    let ctor = node_by_kind_and_name(&graph, NodeKind::Call, "__construct()");
    assert_eq!(ctor.call_kind.as_deref(), Some("constructor"));
    let inline = node_by_kind_and_name(&graph, NodeKind::Call, "new User()");
    assert_eq!(inline.call_kind.as_deref(), Some("constructor"));
}

#[test]
fn trace_node_ids_live_in_their_own_namespaces() {
    let graph = mapped();

    let mut namespaces = std::collections::BTreeMap::new();
    for node in &graph.nodes {
        let namespace = if node.id.starts_with("node:val:") {
            "val"
        } else if node.id.starts_with("node:call:") {
            "call"
        } else {
            "sym"
        };
        *namespaces.entry(namespace).or_insert(0usize) += 1;
    }
    assert_eq!(namespaces["val"], 4);
    assert_eq!(namespaces["call"], 3);
    // 4 symbols + 1 file
    assert_eq!(namespaces["sym"], 5);
}

// ============================================================================
// Edges
// ============================================================================

#[test]
fn call_edges_wire_callee_receiver_arguments_and_results() {
    let graph = mapped();

    let save_call = node_by_kind_and_name(&graph, NodeKind::Call, "save()").id.clone();
    let save = node_id(&graph, "App/Service#save().");
    let run = node_id(&graph, "App/Service#run().");
    let input = node_by_kind_and_name(&graph, NodeKind::Value, "$input").id.clone();
    let literal = node_by_kind_and_name(&graph, NodeKind::Value, "(literal)").id.clone();
    let result = node_by_kind_and_name(&graph, NodeKind::Value, "(result)").id.clone();

    assert!(has_edge(&graph, EdgeType::Calls, &save_call, &save));
    assert!(has_edge(&graph, EdgeType::Receiver, &save_call, &input));
    assert!(has_edge(&graph, EdgeType::Produces, &save_call, &result));
    assert!(has_edge(&graph, EdgeType::Contains, &run, &save_call));

    // one resolved call produces exactly one edge of each family
    let from_call = |edge_type: EdgeType| {
        graph
            .edges
            .iter()
            .filter(|e| e.edge_type == edge_type && e.source == save_call)
            .count()
    };
    assert_eq!(from_call(EdgeType::Calls), 1);
    assert_eq!(from_call(EdgeType::Receiver), 1);
    assert_eq!(from_call(EdgeType::Produces), 1);
    assert_eq!(from_call(EdgeType::Argument), 1);

    let argument = graph
        .edges
        .iter()
        .find(|e| e.edge_type == EdgeType::Argument && e.source == save_call)
        .expect("argument edge present");
    assert_eq!(argument.target, literal);
    assert_eq!(argument.position, Some(0));
}

#[test]
fn an_unresolvable_constructor_callee_falls_back_to_the_class() {
    let graph = mapped();

    // __construct() has no indexed symbol, so the call lands on the
    // constructed class instead
    let ctor = node_by_kind_and_name(&graph, NodeKind::Call, "__construct()")
        .id
        .clone();
    let user = node_id(&graph, "App/User#");
    let run = node_id(&graph, "App/Service#run().");

    assert!(has_edge(&graph, EdgeType::Calls, &ctor, &user));
    assert!(has_edge(&graph, EdgeType::Contains, &run, &ctor));
}

#[test]
fn a_constructor_without_any_callee_records_no_call_target() {
    let graph = mapped();

    let inline = node_by_kind_and_name(&graph, NodeKind::Call, "new User()")
        .id
        .clone();
    let run = node_id(&graph, "App/Service#run().");

    assert!(edges_of(&graph, EdgeType::Calls)
        .iter()
        .all(|edge| edge.source != inline));
    // the call site itself still hangs under its caller
    assert!(has_edge(&graph, EdgeType::Contains, &run, &inline));
}

#[test]
fn value_edges_cover_dataflow_typing_and_scoping() {
    let graph = mapped();

    let copy = node_by_kind_and_name(&graph, NodeKind::Value, "$copy").id.clone();
    let literal = node_by_kind_and_name(&graph, NodeKind::Value, "(literal)").id.clone();
    let input = node_by_kind_and_name(&graph, NodeKind::Value, "$input").id.clone();
    let user = node_id(&graph, "App/User#");
    let run = node_id(&graph, "App/Service#run().");

    assert!(has_edge(&graph, EdgeType::AssignedFrom, &copy, &literal));
    assert!(has_edge(&graph, EdgeType::TypeOf, &input, &user));
    // locals hang under the callable their symbol names
    assert!(has_edge(&graph, EdgeType::Contains, &run, &copy));
    assert!(has_edge(&graph, EdgeType::Contains, &run, &input));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn trace_only_keys_appear_only_on_trace_nodes() {
    let graph = mapped();
    let parsed: Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();

    for node in parsed["nodes"].as_array().unwrap() {
        let object = node.as_object().unwrap();
        match node["kind"].as_str().unwrap() {
            "Value" => {
                assert!(object.contains_key("value_kind"));
                assert!(!object.contains_key("call_kind"));
            }
            "Call" => {
                assert!(object.contains_key("call_kind"));
                assert!(!object.contains_key("value_kind"));
                assert_eq!(node["identifier"], "");
            }
            _ => {
                assert!(!object.contains_key("value_kind"));
                assert!(!object.contains_key("call_kind"));
                assert!(!object.contains_key("type_symbol"));
            }
        }
    }

    let argument = parsed["edges"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["type"] == "argument")
        .expect("argument edge serialized");
    assert_eq!(argument["position"], 0);
}

#[test]
fn overlay_runs_are_deterministic() {
    let first = mapped().to_json().unwrap();
    let second = mapped().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn an_empty_trace_changes_nothing() {
    let bare = map(service_documents()).to_json().unwrap();
    let overlaid = map_with_trace(service_documents(), r#"{"values": [], "calls": []}"#)
        .to_json()
        .unwrap();
    assert_eq!(bare, overlaid);
}
