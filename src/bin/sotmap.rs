//! `sotmap` binary: map SCIP code intelligence into a source-of-truth
//! graph document.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use sotmap::cli::run_map;
use sotmap::error::MapError;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "sotmap", version, about = "Map SCIP indexes into a source-of-truth graph")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Log verbosity for diagnostics on stderr.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Map a SCIP index, with an optional runtime trace overlay.
    Map {
        /// Path to the SCIP index file.
        #[arg(long)]
        index: PathBuf,

        /// Runtime trace document to overlay on the structural graph.
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Write the graph document here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Indent the JSON output.
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let envelope = serde_json::json!({
                "error": {
                    "code": err.code_name(),
                    "message": err.to_string(),
                }
            });
            eprintln!("{}", envelope);
            ExitCode::from(err.exit_code().code())
        }
    }
}

fn execute(cli: Cli) -> Result<(), MapError> {
    match cli.command {
        Command::Map {
            index,
            trace,
            out,
            pretty,
        } => {
            run_map(&index, trace.as_deref(), out.as_deref(), pretty)?;
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

// ============================================================================
// Tests
// ============================================================================
