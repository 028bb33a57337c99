//! Spatial enclosure index and the range-completion heuristic.
//!
//! The index answers "which entity encloses file F at line L?" for
//! reference attribution. Container entities (methods, functions, types,
//! properties) are bucketed per file as line intervals; queries prefer the
//! narrowest interval and break span ties in favor of callables, so a
//! reference inside a method attributes to the method rather than its
//! class.
//!
//! Some index producers emit single-line ranges with no syntactic extent.
//! [`complete_ranges`] estimates an end line for those entities from the
//! next sibling in the same scope (or a kind-dependent default span) and
//! marks the entity's extent as estimated. Estimates are good enough for
//! enclosure lookup; they are never authoritative.

use std::collections::BTreeMap;

use crate::graph::{Extent, Node, NodeKind};
use crate::symbol::parent_identifier;

// ============================================================================
// Enclosure Index
// ============================================================================

/// A container entity's line extent within one file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Interval {
    start_line: u32,
    end_line: u32,
    identifier: String,
    kind: NodeKind,
}

impl Interval {
    fn span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line)
    }

    fn contains(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// Per-file interval index over container entities.
#[derive(Debug, Default)]
pub struct EnclosureIndex {
    by_file: BTreeMap<String, Vec<Interval>>,
}

impl EnclosureIndex {
    /// Index every container entity that has both a file and a range,
    /// preferring the full syntactic extent over the identifier token
    /// range.
    pub fn build<'a, I>(nodes: I) -> EnclosureIndex
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let mut by_file: BTreeMap<String, Vec<Interval>> = BTreeMap::new();

        for node in nodes {
            if !node.kind.can_enclose() || node.range.is_none() {
                continue;
            }
            let file = match &node.file {
                Some(file) => file,
                None => continue,
            };
            let extent = match node.containment_range() {
                Some(extent) => extent,
                None => continue,
            };
            by_file.entry(file.clone()).or_default().push(Interval {
                start_line: extent.start_line,
                end_line: extent.end_line,
                identifier: node.identifier.clone(),
                kind: node.kind,
            });
        }

        for intervals in by_file.values_mut() {
            intervals.sort_by_key(|interval| (interval.start_line, interval.span()));
        }

        let total: usize = by_file.values().map(Vec::len).sum();
        tracing::debug!("enclosure index: {} intervals across {} files", total, by_file.len());

        EnclosureIndex { by_file }
    }

    /// Identifier of the most specific container enclosing `line`, or
    /// `None` when nothing covers it (callers fall back to the file).
    ///
    /// Ranking is by `(span, kind_priority)`: callables beat equally sized
    /// non-callables, and among fully equal ranks the first indexed entity
    /// wins.
    pub fn enclosing(&self, file: &str, line: u32) -> Option<&str> {
        let intervals = self.by_file.get(file)?;

        let mut best: Option<(&Interval, (u32, u8))> = None;
        for interval in intervals {
            if !interval.contains(line) {
                continue;
            }
            let priority = if interval.kind.is_callable() { 0u8 } else { 1u8 };
            let rank = (interval.span(), priority);
            let replace = match &best {
                Some((_, best_rank)) => rank < *best_rank,
                None => true,
            };
            if replace {
                best = Some((interval, rank));
            }
        }

        best.map(|(interval, _)| interval.identifier.as_str())
    }

    /// Number of files with at least one indexed container.
    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }
}

// ============================================================================
// Range Completion
// ============================================================================

/// Sibling groups keyed by (file, immediate parent identifier); members
/// are (node id, start line) pairs.
type SiblingGroups = BTreeMap<(String, Option<String>), Vec<(String, u32)>>;

/// Estimate end lines for entities whose supplied range spans no lines and
/// that lack a syntactic extent. Returns the number of entities estimated.
///
/// Entities are grouped by (file, immediate parent) and sorted by start
/// line; an entity in need of an end line takes the line before its next
/// sibling's start (never preceding its own start), or a kind-dependent
/// default span when it is the last of its group.
pub fn complete_ranges(nodes: &mut BTreeMap<String, Node>) -> usize {
    let mut groups: SiblingGroups = BTreeMap::new();

    for (id, node) in nodes.iter() {
        let (file, range) = match (&node.file, &node.range) {
            (Some(file), Some(range)) => (file.clone(), range),
            _ => continue,
        };
        let parent = parent_identifier(&node.identifier);
        groups
            .entry((file, parent))
            .or_default()
            .push((id.clone(), range.start_line));
    }

    let mut estimated = 0;
    for members in groups.values_mut() {
        members.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));

        for idx in 0..members.len() {
            let next_start = members.get(idx + 1).map(|(_, start)| *start);
            let (id, start_line) = &members[idx];

            let node = match nodes.get_mut(id) {
                Some(node) => node,
                None => continue,
            };
            if node.enclosing_range.is_some() {
                continue;
            }
            let range = match node.range.as_mut() {
                Some(range) if range.end_line <= range.start_line => range,
                _ => continue,
            };

            range.end_line = match next_start {
                Some(next) => next.saturating_sub(1).max(*start_line),
                None => start_line + default_span(node.kind),
            };
            node.extent = Extent::Estimated;
            estimated += 1;
        }
    }

    estimated
}

/// Fallback extent for entities with no later sibling to bound them.
fn default_span(kind: NodeKind) -> u32 {
    if kind.is_callable() {
        50
    } else if kind.is_type() {
        500
    } else {
        5
    }
}

// ============================================================================
// Tests
// ============================================================================
