//! CLI front end for the harvest pipeline. A thin wrapper over
//! `dispatch::read_events` — every real decision (format detection,
//! severity filtering, row projection) lives in the library; this binary
//! only parses arguments, wires up logging, and shapes the process exit
//! code.

use std::process::ExitCode;

use clap::Parser;
use devlog_harvest::{read_events, OutputRow, ReadOptions, Registries, SeverityLevel};

/// Normalize a CI/CD, lint, test, application-log, or audit transcript
/// into the unified validation-event schema.
#[derive(Debug, Parser)]
#[command(name = "devlog-harvest", version, about)]
struct Cli {
    /// File path to read, or literal content when the path does not exist.
    source: String,

    /// Source dialect, or "auto" to detect it from content.
    #[arg(long, default_value = "auto")]
    format: String,

    /// Drop events below this severity (debug, info, warning, error, critical).
    #[arg(long, default_value = "debug")]
    severity_threshold: String,

    /// Return an empty result instead of failing on a malformed root shape.
    #[arg(long)]
    ignore_errors: bool,

    /// Emit pretty-printed JSON instead of one compact row per line.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let severity_threshold = match SeverityLevel::from_str_opt(&cli.severity_threshold) {
        Some(level) => level,
        None => {
            eprintln!(
                "error: invalid --severity-threshold '{}', expected one of: debug, info, warning, error, critical",
                cli.severity_threshold
            );
            return ExitCode::FAILURE;
        }
    };

    let opts = ReadOptions {
        severity_threshold,
        ignore_errors: cli.ignore_errors,
    };

    let mut registries = Registries::bootstrap();
    let events = match read_events(&mut registries, &cli.source, &cli.format, &opts) {
        Ok(events) => events,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let rows: Vec<OutputRow> = events.iter().map(|e| e.to_output_row()).collect();

    let result = if cli.pretty {
        serde_json::to_writer_pretty(std::io::stdout(), &rows)
    } else {
        for row in &rows {
            if let Err(err) = serde_json::to_writer(std::io::stdout(), row) {
                eprintln!("error: failed to serialize row: {err}");
                return ExitCode::FAILURE;
            }
            println!();
        }
        Ok(())
    };

    if let Err(err) = result {
        eprintln!("error: failed to serialize output: {err}");
        return ExitCode::FAILURE;
    }

    tracing::debug!(count = rows.len(), "wrote rows");
    ExitCode::SUCCESS
}
