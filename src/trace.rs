//! Runtime trace documents and their graph overlay.
//!
//! A trace document is a JSON file with two arrays: `values` (parameters,
//! locals, literals, call results) and `calls` (call sites with callee,
//! caller, receiver, and argument wiring). [`TraceMapper::overlay`] turns it
//! into `Value`/`Call` nodes and the dataflow edges between them, resolving
//! symbol references against the structural symbol table.
//!
//! Records without an `id` are skipped; references to unknown value ids or
//! unresolvable symbols drop the edge, never the node.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use sotmap_core::graph::{
    call_node_id, value_node_id, Edge, EdgeType, Extent, Node, NodeKind, Range,
};
use sotmap_core::resolve::{resolve_trace, SymbolTable};
use sotmap_core::symbol;

use crate::error::MapError;

// ============================================================================
// Trace Document Model
// ============================================================================

/// A parsed trace document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceDoc {
    #[serde(default)]
    pub values: Vec<TraceValue>,
    #[serde(default)]
    pub calls: Vec<TraceCall>,
}

/// A runtime value record: parameter, local, literal, constant, or call result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceValue {
    /// Trace-local id; also the node key. Empty means the record is skipped.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub location: TraceLocation,
    /// Value category ("parameter", "local", "result", "literal", "constant").
    pub kind: Option<String>,
    /// Symbol identifier for parameters and locals; absent for literals.
    pub symbol: Option<String>,
    /// Symbol identifier of the value's static type.
    #[serde(rename = "type")]
    pub value_type: Option<String>,
    /// Trace-local id of the value this one was assigned from.
    pub source_value_id: Option<String>,
}

/// A call site record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceCall {
    /// Trace-local id; a result value sharing this id is the call's product.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub location: TraceLocation,
    /// Call category ("method", "method_static", "function", "constructor", ...).
    pub kind: Option<String>,
    /// Symbol identifier of the called member, when the tracer resolved it.
    pub callee: Option<String>,
    /// Symbol identifier of the enclosing callable.
    pub caller: Option<String>,
    /// Trace-local id of the receiver value for instance calls.
    pub receiver_value_id: Option<String>,
    #[serde(default)]
    pub arguments: Vec<TraceArgument>,
    /// Symbol identifier of the constructed type for constructor calls.
    pub return_type: Option<String>,
}

/// One argument slot of a call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceArgument {
    /// 0-based argument position.
    pub position: Option<u32>,
    /// Trace-local id of the value passed in this slot.
    pub value_id: Option<String>,
}

/// A position recorded by the tracer (0-based line and column).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceLocation {
    pub file: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub col: u32,
}

impl TraceDoc {
    /// Parse a trace document from JSON text.
    pub fn from_json(text: &str) -> Result<TraceDoc, MapError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Read and parse a trace document file.
pub fn load_trace(path: &Path) -> Result<TraceDoc, MapError> {
    let text = fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    let doc = TraceDoc::from_json(&text)?;
    tracing::debug!(
        "loaded trace {}: {} values, {} calls",
        path.display(),
        doc.values.len(),
        doc.calls.len()
    );
    Ok(doc)
}

// ============================================================================
// Trace Overlay
// ============================================================================

/// Overlays a trace document onto a structural graph under construction.
///
/// Node and edge passes run in a fixed order: value nodes, call nodes, call
/// edges, value edges. Edges that reference values are resolved through the
/// trace-local id map; edges that reference symbols go through the symbol
/// table with the trace resolution ladder.
pub struct TraceMapper<'a> {
    doc: &'a TraceDoc,
    nodes: &'a mut BTreeMap<String, Node>,
    edges: &'a mut Vec<Edge>,
    symbols: &'a SymbolTable,
    /// Trace-local value id -> node id, for values that produced a node.
    value_ids: BTreeMap<String, String>,
}

impl<'a> TraceMapper<'a> {
    /// Apply the full overlay.
    pub fn overlay(
        doc: &'a TraceDoc,
        nodes: &'a mut BTreeMap<String, Node>,
        edges: &'a mut Vec<Edge>,
        symbols: &'a SymbolTable,
    ) {
        let mut mapper = TraceMapper {
            doc,
            nodes,
            edges,
            symbols,
            value_ids: BTreeMap::new(),
        };
        mapper.add_value_nodes();
        let calls = mapper.add_call_nodes();
        mapper.add_call_edges();
        mapper.add_value_edges();
        tracing::debug!(
            "trace overlay: {} value nodes, {} call nodes",
            mapper.value_ids.len(),
            calls
        );
    }

    fn add_value_nodes(&mut self) {
        for value in &self.doc.values {
            if value.id.is_empty() {
                continue;
            }
            let node_id = value_node_id(&value.id);
            self.value_ids.insert(value.id.clone(), node_id.clone());

            let name = symbol::value_display_name(value.symbol.as_deref(), value.kind.as_deref());
            let node = Node {
                id: node_id.clone(),
                kind: NodeKind::Value,
                name: name.clone(),
                fqn: value_fqn(value, &name),
                identifier: value.symbol.clone().unwrap_or_default(),
                file: value.location.file.clone(),
                range: Some(Range::at_token(
                    value.location.line,
                    value.location.col,
                    name.len() as u32,
                )),
                enclosing_range: None,
                documentation: Vec::new(),
                value_kind: Some(value.kind.clone().unwrap_or_else(|| "unknown".to_string())),
                type_symbol: value.value_type.clone(),
                call_kind: None,
                extent: Extent::Measured,
            };
            self.nodes.insert(node_id, node);
        }
    }

    fn add_call_nodes(&mut self) -> usize {
        let mut added = 0;
        for call in &self.doc.calls {
            if call.id.is_empty() {
                continue;
            }
            let node_id = call_node_id(&call.id);

            let name = symbol::call_display_name(
                call.callee.as_deref(),
                call.kind.as_deref(),
                call.return_type.as_deref(),
            );
            let node = Node {
                id: node_id.clone(),
                kind: NodeKind::Call,
                name: name.clone(),
                fqn: call_fqn(call),
                // call sites have no identifier of their own
                identifier: String::new(),
                file: call.location.file.clone(),
                range: Some(Range::at_token(
                    call.location.line,
                    call.location.col,
                    name.len() as u32,
                )),
                enclosing_range: None,
                documentation: Vec::new(),
                value_kind: None,
                type_symbol: None,
                call_kind: Some(call.kind.clone().unwrap_or_else(|| "unknown".to_string())),
                extent: Extent::Measured,
            };
            self.nodes.insert(node_id, node);
            added += 1;
        }
        added
    }

    fn add_call_edges(&mut self) {
        for call in &self.doc.calls {
            if call.id.is_empty() {
                continue;
            }
            let call_node = call_node_id(&call.id);

            // callee, with the constructed class as a fallback target when a
            // constructor's callee symbol did not resolve
            if let Some(callee) = call.callee.as_deref().filter(|c| !c.is_empty()) {
                if let Some(target) = self.resolve(callee) {
                    self.edges
                        .push(Edge::new(EdgeType::Calls, &call_node, target));
                } else if call.kind.as_deref() == Some("constructor") {
                    if let Some(return_type) =
                        call.return_type.as_deref().filter(|t| !t.is_empty())
                    {
                        if let Some(class_id) = self.resolve(return_type) {
                            self.edges
                                .push(Edge::new(EdgeType::Calls, &call_node, class_id));
                        }
                    }
                }
            }

            if let Some(receiver_id) = call.receiver_value_id.as_deref().filter(|r| !r.is_empty())
            {
                if let Some(receiver_node) = self.value_ids.get(receiver_id) {
                    self.edges
                        .push(Edge::new(EdgeType::Receiver, &call_node, receiver_node));
                }
            }

            for arg in &call.arguments {
                if let (Some(position), Some(value_id)) = (arg.position, arg.value_id.as_deref())
                {
                    if value_id.is_empty() {
                        continue;
                    }
                    if let Some(arg_node) = self.value_ids.get(value_id) {
                        let mut edge = Edge::new(EdgeType::Argument, &call_node, arg_node);
                        edge.position = Some(position);
                        self.edges.push(edge);
                    }
                }
            }

            // a result value shares the call's trace-local id
            if let Some(result_node) = self.value_ids.get(&call.id) {
                self.edges
                    .push(Edge::new(EdgeType::Produces, &call_node, result_node));
            }

            if let Some(caller) = call.caller.as_deref().filter(|c| !c.is_empty()) {
                if let Some(scope_node) = self.resolve(caller) {
                    self.edges
                        .push(Edge::new(EdgeType::Contains, scope_node, &call_node));
                }
            }
        }
    }

    fn add_value_edges(&mut self) {
        for value in &self.doc.values {
            if value.id.is_empty() {
                continue;
            }
            let value_node = value_node_id(&value.id);

            if let Some(source_id) = value.source_value_id.as_deref().filter(|s| !s.is_empty()) {
                if let Some(source_node) = self.value_ids.get(source_id) {
                    self.edges
                        .push(Edge::new(EdgeType::AssignedFrom, &value_node, source_node));
                }
            }

            if let Some(type_id) = value.value_type.as_deref().filter(|t| !t.is_empty()) {
                if let Some(type_node) = self.resolve(type_id) {
                    self.edges
                        .push(Edge::new(EdgeType::TypeOf, &value_node, type_node));
                }
            }

            if let Some(identifier) = value.symbol.as_deref().filter(|s| !s.is_empty()) {
                if let Some(scope) = symbol::value_scope_identifier(identifier) {
                    if let Some(scope_node) = self.resolve(&scope) {
                        self.edges
                            .push(Edge::new(EdgeType::Contains, scope_node, &value_node));
                    }
                }
            }
        }
    }

    fn resolve(&self, identifier: &str) -> Option<&'a str> {
        resolve_trace(self.symbols, identifier)
    }
}

// ============================================================================
// FQN Construction
// ============================================================================

/// FQN for a value: scope-qualified for parameters and locals, positional
/// (`file:line:name`) for values without a scoped symbol.
fn value_fqn(value: &TraceValue, name: &str) -> String {
    if let Some(identifier) = value.symbol.as_deref() {
        if let Some(scope) = symbol::value_scope_prefix(identifier) {
            return format!("{}.{}", symbol::scope_fqn(scope), name);
        }
    }
    let file = value.location.file.as_deref().unwrap_or("");
    format!("{}:{}:{}", file, value.location.line, name)
}

/// FQN for a call site: the caller's FQN plus `@line:col`, or a positional
/// `file:line:col` form when no caller was recorded.
fn call_fqn(call: &TraceCall) -> String {
    if let Some(caller) = call.caller.as_deref().filter(|c| !c.is_empty()) {
        let scope = symbol::scope_fqn(caller);
        if !scope.is_empty() {
            return format!("{}@{}:{}", scope, call.location.line, call.location.col);
        }
    }
    let file = call.location.file.as_deref().unwrap_or("");
    format!("{}:{}:{}", file, call.location.line, call.location.col)
}

// ============================================================================
// Tests
// ============================================================================
