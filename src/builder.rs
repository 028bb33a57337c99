//! Structural mapping from a SCIP index to the source-of-truth graph.
//!
//! [`BuildContext`] accumulates nodes, edges, and lookup tables across a
//! fixed sequence of passes:
//!
//! 1. collect per-symbol metadata (documentation, relationships, file)
//! 2. create file nodes, then symbol nodes from definitions and metadata
//! 3. estimate missing extents and build the enclosure index
//! 4. edge passes: contains, inheritance, type hints, uses, overrides
//! 5. optionally overlay a runtime trace
//!
//! Each pass only reads state produced by earlier passes, so the pipeline
//! order is load-bearing. The entry point is [`map_index`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use scip::types::Index;

use sotmap_core::enclosure::{complete_ranges, EnclosureIndex};
use sotmap_core::graph::{
    file_node_id, symbol_node_id, Edge, EdgeType, Extent, Graph, GraphMetadata, Location, Node,
    NodeKind, Range,
};
use sotmap_core::resolve::{resolve_relationship, SymbolTable};
use sotmap_core::symbol::{self, DescriptorShape, Symbol, SymbolRoles, TypeKeyword};

use crate::trace::{TraceDoc, TraceMapper};

/// Map a decoded index (and optional trace) to a sorted graph document.
pub fn map_index(index: &Index, trace: Option<&TraceDoc>, metadata: GraphMetadata) -> Graph {
    BuildContext::new(index).build(trace, metadata)
}

// ============================================================================
// Collected Records
// ============================================================================

/// One relationship row attached to a symbol.
#[derive(Debug, Clone)]
struct RelationshipRecord {
    target: String,
    is_implementation: bool,
    is_reference: bool,
    is_type_definition: bool,
}

/// Documentation and relationships from a document's symbol information.
#[derive(Debug, Clone, Default)]
struct SymbolMetadata {
    documentation: Vec<String>,
    relationships: Vec<RelationshipRecord>,
    file: String,
}

/// One occurrence row kept for the reference pass.
#[derive(Debug, Clone)]
struct OccurrenceRecord {
    identifier: String,
    file: String,
    range: Range,
    roles: SymbolRoles,
}

/// Where a symbol was defined.
#[derive(Debug, Clone)]
struct DefinitionSite {
    file: String,
    range: Range,
    enclosing_range: Option<Range>,
}

// ============================================================================
// Build Context
// ============================================================================

/// Accumulated state for one mapping run.
struct BuildContext<'a> {
    index: &'a Index,
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
    /// Symbol identifier -> node id, for every symbol node created.
    symbols: SymbolTable,
    /// Relative path -> file node id.
    files: BTreeMap<String, String>,
    /// Symbol identifier -> collected metadata; later documents win.
    metadata: BTreeMap<String, SymbolMetadata>,
    occurrences: Vec<OccurrenceRecord>,
    /// Symbol identifier -> definition site; the first definition wins.
    definitions: BTreeMap<String, DefinitionSite>,
}

impl<'a> BuildContext<'a> {
    fn new(index: &'a Index) -> BuildContext<'a> {
        BuildContext {
            index,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            symbols: SymbolTable::new(),
            files: BTreeMap::new(),
            metadata: BTreeMap::new(),
            occurrences: Vec::new(),
            definitions: BTreeMap::new(),
        }
    }

    fn build(mut self, trace: Option<&TraceDoc>, metadata: GraphMetadata) -> Graph {
        self.collect_metadata();
        self.add_file_nodes();
        self.scan_occurrences();
        self.add_symbol_nodes();

        let estimated = complete_ranges(&mut self.nodes);
        if estimated > 0 {
            tracing::debug!("estimated extents for {} single-line entities", estimated);
        }
        let enclosure = EnclosureIndex::build(self.nodes.values());

        self.add_contains_edges();
        self.add_inheritance_edges();
        self.add_type_hint_edges();
        self.add_uses_edges(&enclosure);
        self.add_override_edges();
        tracing::debug!(
            "structural passes done: {} nodes, {} edges",
            self.nodes.len(),
            self.edges.len()
        );

        if let Some(doc) = trace {
            TraceMapper::overlay(doc, &mut self.nodes, &mut self.edges, &self.symbols);
        }

        let mut graph = Graph::new(metadata);
        graph.nodes = self.nodes.into_values().collect();
        graph.edges = self.edges;
        graph.sort();
        graph
    }

    // ------------------------------------------------------------------
    // Collection passes
    // ------------------------------------------------------------------

    fn collect_metadata(&mut self) {
        for doc in &self.index.documents {
            for info in &doc.symbols {
                let relationships = info
                    .relationships
                    .iter()
                    .map(|rel| RelationshipRecord {
                        target: rel.symbol.clone(),
                        is_implementation: rel.is_implementation,
                        is_reference: rel.is_reference,
                        is_type_definition: rel.is_type_definition,
                    })
                    .collect();
                self.metadata.insert(
                    info.symbol.clone(),
                    SymbolMetadata {
                        documentation: info.documentation.clone(),
                        relationships,
                        file: doc.relative_path.clone(),
                    },
                );
            }
        }
        tracing::debug!("collected metadata for {} symbols", self.metadata.len());
    }

    fn scan_occurrences(&mut self) {
        for doc in &self.index.documents {
            for occ in &doc.occurrences {
                let roles = SymbolRoles::from_bits(occ.symbol_roles);
                let range = Range::from_index_list(&occ.range);
                self.occurrences.push(OccurrenceRecord {
                    identifier: occ.symbol.clone(),
                    file: doc.relative_path.clone(),
                    range,
                    roles,
                });

                if roles.is_definition() && !self.definitions.contains_key(&occ.symbol) {
                    let enclosing_range = if occ.enclosing_range.is_empty() {
                        None
                    } else {
                        Some(Range::from_index_list(&occ.enclosing_range))
                    };
                    self.definitions.insert(
                        occ.symbol.clone(),
                        DefinitionSite {
                            file: doc.relative_path.clone(),
                            range,
                            enclosing_range,
                        },
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Node passes
    // ------------------------------------------------------------------

    fn add_file_nodes(&mut self) {
        for doc in &self.index.documents {
            let path = &doc.relative_path;
            let node_id = file_node_id(path);
            if self.nodes.contains_key(&node_id) {
                continue;
            }
            self.nodes.insert(
                node_id.clone(),
                Node {
                    id: node_id.clone(),
                    kind: NodeKind::File,
                    name: file_basename(path),
                    fqn: path.clone(),
                    identifier: format!("file:{}", path),
                    file: Some(path.clone()),
                    range: None,
                    enclosing_range: None,
                    documentation: Vec::new(),
                    value_kind: None,
                    type_symbol: None,
                    call_kind: None,
                    extent: Extent::Measured,
                },
            );
            self.files.insert(path.clone(), node_id);
        }
    }

    /// Create one node per classified symbol, drawing from definition sites
    /// and metadata-only symbols alike.
    fn add_symbol_nodes(&mut self) {
        let identifiers: BTreeSet<String> = self
            .definitions
            .keys()
            .chain(self.metadata.keys())
            .cloned()
            .collect();

        for identifier in &identifiers {
            let Some(sym) = Symbol::parse(identifier) else {
                continue;
            };
            let Some(shape) = DescriptorShape::parse(&sym.descriptor) else {
                continue;
            };

            let docs: Vec<String> = self
                .metadata
                .get(identifier)
                .map(|meta| meta.documentation.clone())
                .unwrap_or_default();
            let parent_is_enum = matches!(shape, DescriptorShape::Member { .. })
                && self.parent_has_enum_docs(identifier);
            let kind = shape.classify(&docs, parent_is_enum);

            let (file, range, enclosing_range) = match self.definitions.get(identifier) {
                Some(site) => (
                    Some(site.file.clone()),
                    Some(site.range),
                    site.enclosing_range,
                ),
                None => (
                    self.metadata.get(identifier).map(|meta| meta.file.clone()),
                    None,
                    None,
                ),
            };

            let node_id = symbol_node_id(identifier);
            self.nodes.insert(
                node_id.clone(),
                Node {
                    id: node_id.clone(),
                    kind,
                    name: shape.display_name(),
                    fqn: shape.fqn(),
                    identifier: identifier.clone(),
                    file,
                    range,
                    enclosing_range,
                    documentation: docs,
                    value_kind: None,
                    type_symbol: None,
                    call_kind: None,
                    extent: Extent::Measured,
                },
            );
            self.symbols.insert(identifier.clone(), node_id);
        }
        tracing::debug!(
            "created {} file nodes and {} symbol nodes",
            self.files.len(),
            self.symbols.len()
        );
    }

    /// True when the symbol's parent documents itself as an enum.
    fn parent_has_enum_docs(&self, identifier: &str) -> bool {
        let Some(parent) = symbol::parent_identifier(identifier) else {
            return false;
        };
        let Some(meta) = self.metadata.get(&parent) else {
            return false;
        };
        symbol::type_keyword_from_docs(&meta.documentation) == Some(TypeKeyword::Enum)
    }

    // ------------------------------------------------------------------
    // Edge passes
    // ------------------------------------------------------------------

    /// Containment: a symbol with a derivable, resolved parent hangs under
    /// it; a symbol with no derivable parent hangs under its file. A parent
    /// that derives but resolves to nothing drops the edge entirely.
    fn add_contains_edges(&mut self) {
        for (identifier, node_id) in self.symbols.iter() {
            match symbol::parent_identifier(identifier) {
                Some(parent) => {
                    if let Some(parent_id) = self.symbols.get(&parent) {
                        self.edges
                            .push(Edge::new(EdgeType::Contains, parent_id, node_id));
                    }
                }
                None => {
                    let file = self
                        .nodes
                        .get(node_id)
                        .and_then(|node| node.file.as_deref())
                        .filter(|file| !file.is_empty());
                    if let Some(file_id) = file.and_then(|file| self.files.get(file)) {
                        self.edges
                            .push(Edge::new(EdgeType::Contains, file_id, node_id));
                    }
                }
            }
        }
    }

    /// Inheritance edges from relationship rows on type-kind symbols.
    ///
    /// Flag combinations map as: implementation-only is `implements`,
    /// implementation+reference is `uses_trait`, reference-only is
    /// `extends`. Rows with neither flag, and type-definition rows, are
    /// skipped.
    fn add_inheritance_edges(&mut self) {
        for (identifier, meta) in &self.metadata {
            let Some(source_id) = self.symbols.get(identifier) else {
                continue;
            };
            let Some(node) = self.nodes.get(source_id) else {
                continue;
            };
            if !node.kind.is_type() {
                continue;
            }

            for rel in &meta.relationships {
                if rel.is_type_definition {
                    continue;
                }
                let Some(target_id) = resolve_relationship(&self.symbols, &rel.target) else {
                    continue;
                };
                let edge_type = if rel.is_implementation && !rel.is_reference {
                    EdgeType::Implements
                } else if rel.is_implementation && rel.is_reference {
                    EdgeType::UsesTrait
                } else if rel.is_reference {
                    EdgeType::Extends
                } else {
                    continue;
                };
                self.edges.push(Edge::new(edge_type, source_id, target_id));
            }
        }
    }

    /// Type annotations: type-definition relationship rows on arguments,
    /// properties, and methods (return types).
    fn add_type_hint_edges(&mut self) {
        for (identifier, meta) in &self.metadata {
            let Some(source_id) = self.symbols.get(identifier) else {
                continue;
            };
            let Some(node) = self.nodes.get(source_id) else {
                continue;
            };
            if !matches!(
                node.kind,
                NodeKind::Argument | NodeKind::Property | NodeKind::Method
            ) {
                continue;
            }

            for rel in &meta.relationships {
                if !rel.is_type_definition {
                    continue;
                }
                if let Some(target_id) = resolve_relationship(&self.symbols, &rel.target) {
                    self.edges
                        .push(Edge::new(EdgeType::TypeHint, source_id, target_id));
                }
            }
        }
    }

    /// Reference edges from non-definition occurrences, attributed to the
    /// innermost enclosing scope (or the file when nothing encloses).
    ///
    /// Deduplicated by (source, target) with the first reference's location
    /// kept. A callable's references to its own arguments are not uses.
    fn add_uses_edges(&mut self, enclosure: &EnclosureIndex) {
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

        for occ in &self.occurrences {
            if occ.roles.is_definition() {
                continue;
            }
            let Some(target_id) = self.symbols.get(&occ.identifier) else {
                continue;
            };

            let scope = enclosure.enclosing(&occ.file, occ.range.start_line);
            let source_id = match scope {
                Some(scope) => self.symbols.get(scope),
                None => self.files.get(&occ.file).map(String::as_str),
            };
            let Some(source_id) = source_id else {
                continue;
            };

            if source_id == target_id {
                continue;
            }
            if let Some(scope) = scope {
                if occ.identifier.starts_with(scope) && self.is_argument(target_id) {
                    continue;
                }
            }

            if !seen.insert((source_id.to_string(), target_id.to_string())) {
                continue;
            }

            let mut edge = Edge::new(EdgeType::Uses, source_id, target_id);
            edge.location = Some(Location {
                file: occ.file.clone(),
                line: occ.range.start_line,
                col: occ.range.start_col,
            });
            self.edges.push(edge);
        }
    }

    fn is_argument(&self, node_id: &str) -> bool {
        self.nodes
            .get(node_id)
            .is_some_and(|node| node.kind == NodeKind::Argument)
    }

    /// Override edges: method relationship rows carrying both the
    /// implementation and reference flags point at the overridden member.
    fn add_override_edges(&mut self) {
        for (identifier, meta) in &self.metadata {
            let Some(source_id) = self.symbols.get(identifier) else {
                continue;
            };
            let Some(node) = self.nodes.get(source_id) else {
                continue;
            };
            if node.kind != NodeKind::Method {
                continue;
            }

            for rel in &meta.relationships {
                if !(rel.is_implementation && rel.is_reference) {
                    continue;
                }
                if let Some(target_id) = resolve_relationship(&self.symbols, &rel.target) {
                    self.edges
                        .push(Edge::new(EdgeType::Overrides, source_id, target_id));
                }
            }
        }
    }
}

fn file_basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// ============================================================================
// Tests
// ============================================================================
