mod config;
mod export;
mod parser;
mod reader;
mod record;
mod render;
mod stats;

use clap::{Parser, Subcommand};
use parser::ParserKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Watches request logs produced by an LLM gateway: live tail, one-shot
/// statistics report, JSONL export, bounded-tail preview, and a dry-run
/// line validator.
#[derive(Parser, Debug)]
#[command(name = "llmwatch", version, about)]
struct Cli {
    /// Config file path (default: llmwatch.toml; the default may be absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file to read (overrides config)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Line contract to apply (overrides config)
    #[arg(long, value_enum)]
    parser: Option<ParserKind>,

    /// Extra logging (per-line parse diagnostics)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the log and render each record as it is appended
    Tail {
        /// Seconds to wait between polls (overrides config)
        #[arg(long)]
        poll_interval: Option<f64>,
    },
    /// Read the whole log once and print a statistics report
    Report,
    /// Write every parsed record to a JSONL file
    Export {
        /// Destination file (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Parse and render only the last COUNT lines of the log
    Head {
        /// Number of trailing lines to take
        #[arg(value_name = "COUNT", value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
    },
    /// Count how many lines the active parser would accept
    DryRun,
}

fn init_logging(level: &str, verbose: bool) {
    let directive = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("llmwatch.toml"));
    let explicit = cli.config.is_some();
    let config = match config::load(&config_path, explicit) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.observer.log_level, cli.verbose);
    tracing::debug!(?cli, "parsed CLI arguments");

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Merge CLI overrides into the loaded config and dispatch the selected
/// mode. Every mode is an independent unit of work: it either completes or
/// surfaces one error line.
async fn run(cli: Cli, mut config: config::WatchConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(source) = cli.source {
        config.observer.source = source;
    }
    if let Some(kind) = cli.parser {
        config.observer.parser = kind;
    }

    let parser = parser::make_parser(config.observer.parser);
    let source = config.observer.source.clone();
    tracing::debug!(contract = parser.name(), source = %source.display(), "dispatching");

    match cli.command {
        Command::Tail { poll_interval } => {
            if let Some(secs) = poll_interval {
                config.observer.poll_interval_secs = secs;
            }
            let poll = config.observer.poll_interval()?;

            // The follow loop has no natural termination; Ctrl-C wins the
            // race and drops the reader, releasing the file handle.
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, stopping tail");
                }
                result = reader::follow(&source, parser.as_ref(), poll, |record| {
                    println!("{}", render::record_line(record));
                }) => {
                    result?;
                }
            }
        }
        Command::Report => {
            let summary = reader::ingest_batch(&source, parser.as_ref())?;
            print!("{}", render::summary_text(&summary));
        }
        Command::Export { out } => {
            let dest = out.unwrap_or_else(|| config.export.path.clone());
            let count = export::export_jsonl(&source, parser.as_ref(), &dest)?;
            println!("Exported {count} records to {}.", dest.display());
        }
        Command::Head { count } => {
            let records = reader::head_records(&source, parser.as_ref(), count as usize)?;
            for record in &records {
                println!("{}", render::record_line(record));
            }
        }
        Command::DryRun => {
            let report = reader::dry_run(&source, parser.as_ref())?;
            println!(
                "Scanned {} lines: {} valid, {} skipped.",
                report.total_lines,
                report.valid,
                report.total_lines - report.valid
            );
        }
    }

    Ok(())
}
