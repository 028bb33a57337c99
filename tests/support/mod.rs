//! Shared builders for integration tests.
//!
//! Constructs SCIP indexes and trace documents in memory so tests can
//! exercise the mapping pipeline without fixture files.

// Not every test binary uses every helper.
#![allow(dead_code)]

use protobuf::MessageField;
use scip::types::{Document, Index, Metadata, Occurrence, Relationship, SymbolInformation};

use sotmap::graph::{Edge, EdgeType, Graph, GraphMetadata, Node, NodeKind};
use sotmap::trace::TraceDoc;

/// Identifier prefix shared by every test symbol.
pub const PKG: &str = "scip-php composer app 1.0.0";

pub fn ident(descriptor: &str) -> String {
    format!("{} {}", PKG, descriptor)
}

// ============================================================================
// Index Construction
// ============================================================================

pub fn occurrence(descriptor: &str, range: &[i32], roles: i32) -> Occurrence {
    let mut occ = Occurrence::new();
    occ.symbol = ident(descriptor);
    occ.range = range.to_vec();
    occ.symbol_roles = roles;
    occ
}

pub fn definition(descriptor: &str, range: &[i32]) -> Occurrence {
    occurrence(descriptor, range, 1)
}

pub fn definition_with_extent(descriptor: &str, range: &[i32], extent: &[i32]) -> Occurrence {
    let mut occ = definition(descriptor, range);
    occ.enclosing_range = extent.to_vec();
    occ
}

pub fn reference(descriptor: &str, range: &[i32]) -> Occurrence {
    occurrence(descriptor, range, 0)
}

pub fn info(descriptor: &str, docs: &[&str]) -> SymbolInformation {
    let mut sym = SymbolInformation::new();
    sym.symbol = ident(descriptor);
    sym.documentation = docs.iter().map(|d| d.to_string()).collect();
    sym
}

pub fn info_with_rels(descriptor: &str, docs: &[&str], rels: Vec<Relationship>) -> SymbolInformation {
    let mut sym = info(descriptor, docs);
    sym.relationships = rels;
    sym
}

pub fn rel(descriptor: &str, is_implementation: bool, is_reference: bool) -> Relationship {
    let mut rel = Relationship::new();
    rel.symbol = ident(descriptor);
    rel.is_implementation = is_implementation;
    rel.is_reference = is_reference;
    rel
}

pub fn type_rel(descriptor: &str) -> Relationship {
    let mut rel = rel(descriptor, false, false);
    rel.is_type_definition = true;
    rel
}

pub fn document(
    path: &str,
    occurrences: Vec<Occurrence>,
    symbols: Vec<SymbolInformation>,
) -> Document {
    let mut doc = Document::new();
    doc.relative_path = path.to_string();
    doc.occurrences = occurrences;
    doc.symbols = symbols;
    doc
}

pub fn index(documents: Vec<Document>) -> Index {
    let mut metadata = Metadata::new();
    metadata.project_root = "file:///app".to_string();
    let mut index = Index::new();
    index.metadata = MessageField::some(metadata);
    index.documents = documents;
    index
}

// ============================================================================
// Mapping
// ============================================================================

/// Fixed run metadata so mapped documents compare byte for byte.
pub fn run_metadata() -> GraphMetadata {
    GraphMetadata {
        generated_at: "2025-01-01T00:00:00Z".to_string(),
        source_index_name: "index.scip".to_string(),
        project_root: "file:///app".to_string(),
    }
}

pub fn map(documents: Vec<Document>) -> Graph {
    sotmap::builder::map_index(&index(documents), None, run_metadata())
}

pub fn map_with_trace(documents: Vec<Document>, trace_json: &str) -> Graph {
    let doc = TraceDoc::from_json(trace_json).expect("trace fixture parses");
    sotmap::builder::map_index(&index(documents), Some(&doc), run_metadata())
}

// ============================================================================
// Graph Queries
// ============================================================================

pub fn node_by_identifier<'g>(graph: &'g Graph, identifier: &str) -> &'g Node {
    graph
        .nodes
        .iter()
        .find(|node| node.identifier == identifier)
        .unwrap_or_else(|| panic!("no node for {}", identifier))
}

/// Structural and trace nodes may share display names, so trace lookups
/// filter by kind.
pub fn node_by_kind_and_name<'g>(graph: &'g Graph, kind: NodeKind, name: &str) -> &'g Node {
    graph
        .nodes
        .iter()
        .find(|node| node.kind == kind && node.name == name)
        .unwrap_or_else(|| panic!("no {:?} node named {}", kind, name))
}

pub fn node_id(graph: &Graph, descriptor: &str) -> String {
    node_by_identifier(graph, &ident(descriptor)).id.clone()
}

pub fn file_id(graph: &Graph, path: &str) -> String {
    node_by_identifier(graph, &format!("file:{}", path)).id.clone()
}

pub fn edges_of(graph: &Graph, edge_type: EdgeType) -> Vec<&Edge> {
    graph
        .edges
        .iter()
        .filter(|edge| edge.edge_type == edge_type)
        .collect()
}

pub fn has_edge(graph: &Graph, edge_type: EdgeType, source: &str, target: &str) -> bool {
    graph
        .edges
        .iter()
        .any(|edge| edge.edge_type == edge_type && edge.source == source && edge.target == target)
}
