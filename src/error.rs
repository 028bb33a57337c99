//! Error types and exit codes for the mapping CLI.
//!
//! All fallible operations in this crate return [`MapError`]. The binary
//! converts the error into a JSON envelope on stderr and a stable process
//! exit code ([`MapExitCode`]), so scripted callers can dispatch on either.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use sotmap_core::error::CoreError;

// ============================================================================
// Exit Codes
// ============================================================================

/// Process exit codes reported by the CLI.
///
/// These are stable across releases: callers dispatch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MapExitCode {
    /// An input could not be decoded (corrupt index, malformed trace JSON).
    DecodeError = 2,
    /// A file could not be read or written.
    IoError = 3,
    /// Internal error (serialization failure, unexpected state).
    InternalError = 10,
}

impl MapExitCode {
    /// Numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for MapExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the mapping pipeline.
#[derive(Debug, Error)]
pub enum MapError {
    /// Filesystem failure, with the path that was being accessed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index file did not decode as a SCIP protobuf payload.
    #[error("failed to decode SCIP index: {0}")]
    IndexDecode(#[from] protobuf::Error),

    /// The trace file did not decode as a JSON trace document.
    #[error("failed to decode trace document: {0}")]
    TraceDecode(#[from] serde_json::Error),

    /// Error bubbled up from the core graph layer.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl MapError {
    /// Build a [`MapError::Io`] carrying the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> MapError {
        MapError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code category for this error.
    pub fn exit_code(&self) -> MapExitCode {
        match self {
            MapError::Io { .. } => MapExitCode::IoError,
            MapError::IndexDecode(_) | MapError::TraceDecode(_) => MapExitCode::DecodeError,
            MapError::Core(_) => MapExitCode::InternalError,
        }
    }

    /// Stable machine-readable code name for JSON error output.
    pub fn code_name(&self) -> &'static str {
        match self {
            MapError::Io { .. } => "IoError",
            MapError::IndexDecode(_) => "IndexDecodeError",
            MapError::TraceDecode(_) => "TraceDecodeError",
            MapError::Core(_) => "InternalError",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
