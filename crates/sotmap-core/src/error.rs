//! Error types for the core graph model.

use thiserror::Error;

/// Errors produced by the core graph model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Canonical serialization of the graph document failed.
    #[error("failed to serialize graph: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
