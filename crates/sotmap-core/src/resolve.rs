//! Identifier-to-node resolution: the symbol table and fallback tiers.
//!
//! Index relationships and trace records frequently name entities in
//! slightly denormalized forms (leading slashes, missing or doubled
//! trailing punctuation). Resolution is an ordered list of strategies,
//! each returning an optional match, short-circuiting on the first hit.
//! The lists and their order are part of the public contract:
//!
//! - relationships: [`RELATIONSHIP_STRATEGIES`]
//! - trace identifiers: [`TRACE_STRATEGIES`]

use std::collections::BTreeMap;

use crate::symbol::Symbol;

// ============================================================================
// Symbol Table
// ============================================================================

/// Identifier → node-ID table with deterministic iteration order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_identifier: BTreeMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>, node_id: impl Into<String>) {
        self.by_identifier.insert(identifier.into(), node_id.into());
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.by_identifier.get(identifier).map(String::as_str)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.by_identifier.contains_key(identifier)
    }

    /// Entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_identifier
            .iter()
            .map(|(identifier, node_id)| (identifier.as_str(), node_id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }
}

// ============================================================================
// Relationship Resolution
// ============================================================================

/// One tier of relationship-target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipStrategy {
    /// The target identifier is present verbatim.
    Exact,
    /// The target, normalized of leading slashes and trailing hashes,
    /// equals a known identifier's descriptor or closes it as a `/`-rooted
    /// path suffix.
    DescriptorSuffix,
}

/// Relationship resolution tiers in application order.
pub const RELATIONSHIP_STRATEGIES: [RelationshipStrategy; 2] = [
    RelationshipStrategy::Exact,
    RelationshipStrategy::DescriptorSuffix,
];

impl RelationshipStrategy {
    /// Apply this tier alone.
    pub fn apply<'t>(&self, table: &'t SymbolTable, target: &str) -> Option<&'t str> {
        match self {
            RelationshipStrategy::Exact => table.get(target),
            RelationshipStrategy::DescriptorSuffix => {
                let clean = target.trim_start_matches('/').trim_end_matches('#');
                let rooted = format!("/{}", clean);
                for (identifier, node_id) in table.iter() {
                    let descriptor = match Symbol::parse(identifier) {
                        Some(symbol) => symbol.descriptor,
                        None => continue,
                    };
                    let descriptor = descriptor.trim_end_matches('#');
                    if descriptor == clean || descriptor.ends_with(&rooted) {
                        return Some(node_id);
                    }
                }
                None
            }
        }
    }
}

/// Resolve a relationship target, trying each tier in order.
pub fn resolve_relationship<'t>(table: &'t SymbolTable, target: &str) -> Option<&'t str> {
    RELATIONSHIP_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.apply(table, target))
}

// ============================================================================
// Trace Resolution
// ============================================================================

/// One tier of trace-identifier resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStrategy {
    /// The identifier is present verbatim.
    Exact,
    /// Trailing dots stripped: `…getId().` ⇢ `…getId()`.
    TrailingDotStripped,
    /// One trailing dot appended: `…getId()` ⇢ `…getId().`.
    TrailingDotAppended,
    /// Trailing hashes stripped: `…User#` ⇢ `…User`.
    TrailingHashStripped,
}

/// Trace resolution tiers in application order.
pub const TRACE_STRATEGIES: [TraceStrategy; 4] = [
    TraceStrategy::Exact,
    TraceStrategy::TrailingDotStripped,
    TraceStrategy::TrailingDotAppended,
    TraceStrategy::TrailingHashStripped,
];

impl TraceStrategy {
    /// Apply this tier alone.
    pub fn apply<'t>(&self, table: &'t SymbolTable, identifier: &str) -> Option<&'t str> {
        match self {
            TraceStrategy::Exact => table.get(identifier),
            TraceStrategy::TrailingDotStripped => table.get(identifier.trim_end_matches('.')),
            TraceStrategy::TrailingDotAppended => table.get(&format!("{}.", identifier)),
            TraceStrategy::TrailingHashStripped => table.get(identifier.trim_end_matches('#')),
        }
    }
}

/// Resolve a trace identifier, trying each tier in order.
pub fn resolve_trace<'t>(table: &'t SymbolTable, identifier: &str) -> Option<&'t str> {
    TRACE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.apply(table, identifier))
}

// ============================================================================
// Tests
// ============================================================================
