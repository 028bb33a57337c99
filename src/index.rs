//! SCIP index loading.
//!
//! A SCIP index is a protobuf-encoded `Index` message: run metadata plus one
//! `Document` per source file, each carrying occurrences (symbol mentions
//! with ranges and role bitmasks) and symbol information (documentation and
//! relationships). This module only decodes the file; interpretation lives
//! in [`crate::builder`].

use std::fs;
use std::path::Path;

use protobuf::Message;
use scip::types::Index;

use crate::error::MapError;

/// Read and decode a SCIP index file.
pub fn load_index(path: &Path) -> Result<Index, MapError> {
    let bytes = fs::read(path).map_err(|e| MapError::io(path, e))?;
    let index = Index::parse_from_bytes(&bytes)?;
    if index.documents.is_empty() {
        tracing::warn!("index {} contains no documents", path.display());
    }
    tracing::debug!(
        "loaded index {}: {} documents, {} external symbols",
        path.display(),
        index.documents.len(),
        index.external_symbols.len()
    );
    Ok(index)
}

/// Project root URI recorded in the index metadata, or `""` when the
/// indexer did not record one.
pub fn project_root(index: &Index) -> &str {
    &index.metadata.get_or_default().project_root
}

// ============================================================================
// Tests
// ============================================================================
