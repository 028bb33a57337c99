//! Command implementations behind the `sotmap` binary.
//!
//! The binary stays thin: argument parsing and process exit live in
//! `src/bin/sotmap.rs`, while the work happens here so tests can drive
//! commands without spawning a process.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use sotmap_core::graph::GraphMetadata;

use crate::builder::map_index;
use crate::error::MapError;
use crate::index::{self, load_index};
use crate::trace::load_trace;

/// Outcome of one `map` run.
#[derive(Debug)]
pub struct MapSummary {
    pub nodes: usize,
    pub edges: usize,
    /// `None` when the graph went to stdout.
    pub destination: Option<PathBuf>,
}

/// Decode the index (and optional trace), map them, and write the graph
/// document to `out` or stdout.
pub fn run_map(
    index_path: &Path,
    trace_path: Option<&Path>,
    out: Option<&Path>,
    pretty: bool,
) -> Result<MapSummary, MapError> {
    let index = load_index(index_path)?;
    let trace = trace_path.map(load_trace).transpose()?;

    let metadata = GraphMetadata {
        generated_at: format_timestamp(SystemTime::now()),
        source_index_name: index_file_name(index_path),
        project_root: index::project_root(&index).to_string(),
    };
    let graph = map_index(&index, trace.as_ref(), metadata);

    let summary = MapSummary {
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        destination: out.map(Path::to_path_buf),
    };

    let rendered = if pretty {
        graph.to_json_pretty()?
    } else {
        graph.to_json()?
    };

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|err| MapError::io(parent, err))?;
            }
            fs::write(path, rendered.as_bytes()).map_err(|err| MapError::io(path, err))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .map_err(|err| MapError::io("stdout", err))?;
        }
    }

    tracing::info!(
        "mapped {} nodes and {} edges from {}",
        summary.nodes,
        summary.edges,
        index_path.display()
    );
    Ok(summary)
}

/// UTC second precision, e.g. `2025-06-01T12:00:00Z`.
fn format_timestamp(now: SystemTime) -> String {
    let now: DateTime<Utc> = now.into();
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn index_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Tests
// ============================================================================
