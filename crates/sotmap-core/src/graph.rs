//! Graph model: node/edge tables, deterministic IDs, canonical serialization.
//!
//! This module provides the source-of-truth graph data model:
//! - [`Node`]: code entities (files, types, members) and runtime entities (values, calls)
//! - [`Edge`]: typed, directed relationships between nodes
//! - [`Graph`]: the serializable document with stable ordering
//!
//! Node IDs are content hashes of namespaced keys, so the same input always
//! maps to the same ID and distinct namespaces never collide:
//!
//! | Entity | Hashed key | ID form |
//! |--------|------------|---------|
//! | symbol | identifier string | `node:<hash>` |
//! | file | `file:` + relative path | `node:<hash>` |
//! | runtime value | `val:` + trace location key | `node:val:<hash>` |
//! | call site | `call:` + trace location key | `node:call:<hash>` |
//!
//! The serialized document sorts nodes by ID and edges by
//! `(source, type, target)`. That ordering is part of the output contract,
//! not an implementation detail.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreResult;

// ============================================================================
// Schema Version
// ============================================================================

/// Version string stamped into every serialized graph document.
pub const GRAPH_SCHEMA_VERSION: &str = "2.0";

// ============================================================================
// Node and Edge Kinds
// ============================================================================

/// Kind of a graph node.
///
/// Structural kinds come from the index; `Value` and `Call` come from the
/// optional runtime trace. Serialized names match the variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Class,
    Interface,
    Trait,
    Enum,
    Method,
    Function,
    Property,
    Const,
    Argument,
    EnumCase,
    Value,
    Call,
}

impl NodeKind {
    /// True for type-declaration kinds (class/interface/trait/enum).
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::Class | NodeKind::Interface | NodeKind::Trait | NodeKind::Enum
        )
    }

    /// True for callable kinds (method/function).
    pub fn is_callable(&self) -> bool {
        matches!(self, NodeKind::Method | NodeKind::Function)
    }

    /// True for kinds whose source extent can enclose references.
    ///
    /// Properties count: a property initializer can contain references even
    /// though the property itself is not a scope in the language sense.
    pub fn can_enclose(&self) -> bool {
        self.is_type() || self.is_callable() || matches!(self, NodeKind::Property)
    }
}

/// Type of a graph edge.
///
/// Serialized names are the snake_case forms ([`EdgeType::as_str`]); the
/// edge sort order in the output document is the lexicographic order of
/// those strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    // Structural edges (from the index)
    Contains,
    Extends,
    Implements,
    UsesTrait,
    Overrides,
    Uses,
    TypeHint,
    // Call edges (from the trace)
    Calls,
    Receiver,
    Argument,
    Produces,
    // Value edges (from the trace)
    AssignedFrom,
    TypeOf,
}

impl EdgeType {
    /// The serialized name of this edge type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Contains => "contains",
            EdgeType::Extends => "extends",
            EdgeType::Implements => "implements",
            EdgeType::UsesTrait => "uses_trait",
            EdgeType::Overrides => "overrides",
            EdgeType::Uses => "uses",
            EdgeType::TypeHint => "type_hint",
            EdgeType::Calls => "calls",
            EdgeType::Receiver => "receiver",
            EdgeType::Argument => "argument",
            EdgeType::Produces => "produces",
            EdgeType::AssignedFrom => "assigned_from",
            EdgeType::TypeOf => "type_of",
        }
    }
}

// ============================================================================
// Ranges and Locations
// ============================================================================

/// A source range with 0-based lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Range {
    /// Decode an index-encoded range list.
    ///
    /// Four elements are `[start_line, start_col, end_line, end_col]`; three
    /// elements are `[line, start_col, end_col]` on a single line. Any other
    /// length decodes to the zero range.
    pub fn from_index_list(values: &[i32]) -> Range {
        let clamp = |v: i32| v.max(0) as u32;
        match values {
            [sl, sc, el, ec] => Range {
                start_line: clamp(*sl),
                start_col: clamp(*sc),
                end_line: clamp(*el),
                end_col: clamp(*ec),
            },
            [line, sc, ec] => Range {
                start_line: clamp(*line),
                start_col: clamp(*sc),
                end_line: clamp(*line),
                end_col: clamp(*ec),
            },
            _ => Range {
                start_line: 0,
                start_col: 0,
                end_line: 0,
                end_col: 0,
            },
        }
    }

    /// Range covering a single token of `len` characters.
    pub fn at_token(line: u32, col: u32, len: u32) -> Range {
        Range {
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col + len,
        }
    }

    /// Number of lines spanned beyond the first.
    pub fn span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line)
    }
}

/// A source location attached to `uses` edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub col: u32,
}

/// Whether a node's range came from the index or from the completion
/// heuristic. Not serialized; enclosure lookup is the only consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extent {
    #[default]
    Measured,
    Estimated,
}

// ============================================================================
// Nodes
// ============================================================================

/// A node in the source-of-truth graph.
///
/// `file`, `range`, and `enclosing_range` serialize as `null` when absent;
/// the kind-specific fields (`value_kind`, `type_symbol`, `call_kind`) are
/// omitted entirely when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub fqn: String,
    pub identifier: String,
    pub file: Option<String>,
    pub range: Option<Range>,
    pub enclosing_range: Option<Range>,
    pub documentation: Vec<String>,

    /// Value nodes only: "parameter", "local", "result", "literal", "constant".
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value_kind: Option<String>,
    /// Value nodes only: identifier of the value's static type.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub type_symbol: Option<String>,
    /// Call nodes only: "method", "method_static", "constructor", "function", ...
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub call_kind: Option<String>,

    #[serde(skip)]
    pub extent: Extent,
}

impl Node {
    /// The extent used for containment: the full syntactic extent when the
    /// index supplied one, the identifier token range otherwise.
    pub fn containment_range(&self) -> Option<&Range> {
        self.enclosing_range.as_ref().or(self.range.as_ref())
    }
}

// ============================================================================
// Edges
// ============================================================================

/// An edge in the source-of-truth graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub source: String,
    pub target: String,
    /// Reference site; `uses` edges only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<Location>,
    /// 0-based call-argument position; `argument` edges only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<u32>,
}

impl Edge {
    /// Create an edge with no location or position.
    pub fn new(edge_type: EdgeType, source: impl Into<String>, target: impl Into<String>) -> Edge {
        Edge {
            edge_type,
            source: source.into(),
            target: target.into(),
            location: None,
            position: None,
        }
    }

    /// Sort key for the output contract: `(source, type, target)`.
    pub fn sort_key(&self) -> (&str, &'static str, &str) {
        (&self.source, self.edge_type.as_str(), &self.target)
    }
}

// ============================================================================
// Node ID Generation
// ============================================================================

/// First 16 hex characters of the SHA-256 digest.
fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

/// Deterministic node ID for a symbol entity.
pub fn symbol_node_id(identifier: &str) -> String {
    format!("node:{}", short_hash(identifier))
}

/// Deterministic node ID for a file entity.
pub fn file_node_id(path: &str) -> String {
    format!("node:{}", short_hash(&format!("file:{}", path)))
}

/// Deterministic node ID for a runtime value.
///
/// The `val:` namespace keeps values distinct from call sites recorded at
/// the same trace location.
pub fn value_node_id(location_key: &str) -> String {
    format!("node:val:{}", short_hash(&format!("val:{}", location_key)))
}

/// Deterministic node ID for a call site.
pub fn call_node_id(location_key: &str) -> String {
    format!("node:call:{}", short_hash(&format!("call:{}", location_key)))
}

// ============================================================================
// Graph Document
// ============================================================================

/// Run metadata stamped into the serialized document.
///
/// `generated_at` is supplied by the caller, so mapping itself stays a pure
/// function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub generated_at: String,
    pub source_index_name: String,
    pub project_root: String,
}

/// The complete source-of-truth graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub version: String,
    pub metadata: GraphMetadata,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph at the current schema version.
    pub fn new(metadata: GraphMetadata) -> Graph {
        Graph {
            version: GRAPH_SCHEMA_VERSION.to_string(),
            metadata,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Apply the output ordering contract: nodes by ID, edges by
    /// `(source, type, target)`.
    pub fn sort(&mut self) {
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        self.edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }

    /// Serialize compactly.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize with 2-space indentation.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
