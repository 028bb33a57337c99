//! Core graph model for source-of-truth mapping.
//!
//! This crate provides the index-agnostic building blocks:
//! - Graph data model: nodes, edges, deterministic IDs, canonical serialization
//! - Identifier grammar: descriptor shapes, classification, name derivations
//! - Spatial enclosure index and the range-completion heuristic
//! - Ordered resolution strategies for denormalized identifier references
//! - Error types

pub mod enclosure;
pub mod error;
pub mod graph;
pub mod resolve;
pub mod symbol;
