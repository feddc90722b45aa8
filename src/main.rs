//! Binary entry point for the recurl CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Preview converting a C++ tree to Python (text summary)
//! recurl convert c-to-python src/
//!
//! # Show the changes as a unified diff
//! recurl convert python-to-typescript app.py --format diff
//!
//! # Write the results (app.py -> app.ts)
//! recurl convert python-to-typescript app.py --apply
//!
//! # Convert a JSON outline and print the converted outline
//! recurl convert add-annotations tree.json --outline --format json
//!
//! # List converters
//! recurl list
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use recurl::cli::{run_convert, ConvertRequest, ConvertRun};
use recurl::diff::generate_unified_diff;
use recurl::error::{OutputErrorCode, RecurlError};
use recurl::output::{emit_response, ErrorResponse, ListResponse};
use recurl::registry::converters;

// ============================================================================
// CLI Structure
// ============================================================================

/// Lexical transcoders between brace and indentation syntaxes.
#[derive(Parser, Debug)]
#[command(
    name = "recurl",
    version,
    about = "Convert source between brace and indentation syntaxes"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
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

/// Output format for the convert command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ConvertFormat {
    /// Human-readable text summary (default).
    #[default]
    Text,
    /// Full JSON response.
    Json,
    /// Unified diff of the changed units.
    Diff,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run a converter over files, directories or outlines.
    ///
    /// Nothing is written unless --apply is given.
    Convert {
        /// Converter name (see `recurl list`).
        converter: String,
        /// Input files or directories (JSON outlines with --outline).
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// JSON converter configuration (types, class list, ivars, ...).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Treat each path as a JSON outline.
        #[arg(long)]
        outline: bool,
        /// Write the converted output.
        #[arg(long)]
        apply: bool,
        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: ConvertFormat,
    },
    /// List the available converters.
    List,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(code) => code,
        Err(err @ RecurlError::ConversionFailed { .. }) => {
            // The partial response is already on stdout
            tracing::error!("{}", err);
            ExitCode::from(err.error_code().code())
        }
        Err(err) => {
            // Errors go to stdout as JSON, like every other response
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<ExitCode, RecurlError> {
    match cli.command {
        Command::Convert {
            converter,
            paths,
            config,
            outline,
            apply,
            format,
        } => {
            let request = ConvertRequest {
                converter,
                paths,
                config,
                outline,
                apply,
            };
            execute_convert(&request, format)
        }
        Command::List => {
            emit(&ListResponse::new(converters()))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn execute_convert(request: &ConvertRequest, format: ConvertFormat) -> Result<ExitCode, RecurlError> {
    let run = run_convert(request)?;
    match format {
        ConvertFormat::Json => emit(&run.response)?,
        ConvertFormat::Diff => {
            let mut stdout = io::stdout();
            write!(stdout, "{}", generate_unified_diff(&run.changes))
                .map_err(|e| RecurlError::internal(format!("failed to write output: {}", e)))?;
        }
        ConvertFormat::Text => output_convert_summary(&run),
    }

    if run.response.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(RecurlError::ConversionFailed {
            count: run.response.failures.len(),
        })
    }
}

fn emit<T: serde::Serialize>(response: &T) -> Result<(), RecurlError> {
    emit_response(response, &mut io::stdout())
        .map_err(|e| RecurlError::internal(format!("failed to write output: {}", e)))
}

/// Output a human-readable summary of a conversion.
fn output_convert_summary(run: &ConvertRun) {
    let response = &run.response;
    let summary = &response.summary;

    match &response.files_written {
        Some(files) => println!(
            "Converted with {}: {} file(s) written",
            response.converter,
            files.len()
        ),
        None => println!("Dry run: would convert with {}", response.converter),
    }
    println!(
        "  {} file(s), {} node(s) visited, {} changed",
        summary.files, summary.nodes, summary.changed
    );
    for unit in &response.units {
        println!(
            "    {} ({} -> {} lines)",
            unit.headline, unit.lines_before, unit.lines_after
        );
    }
    if let Some(files) = &response.files_written {
        for file in files {
            println!("  Wrote {}", file);
        }
    }
    if !response.failures.is_empty() {
        println!("  Failures:");
        for failure in &response.failures {
            println!("    - {}: {}", failure.headline, failure.message);
        }
    }
}
