//! sotmap: SCIP to source-of-truth graph mapping
//!
//! Decodes SCIP code intelligence indexes and maps them into a canonical
//! property-graph document of code entities and their relationships, with
//! an optional runtime trace overlay for dataflow and call sites.

// Graph model and mapping primitives - re-exported from sotmap-core
pub use sotmap_core::enclosure;
pub use sotmap_core::graph;
pub use sotmap_core::resolve;
pub use sotmap_core::symbol;

// Index and trace decoding
pub mod index;
pub mod trace;

// Mapping pipeline
pub mod builder;

// Front door for the binary
pub mod cli;
pub mod error;
