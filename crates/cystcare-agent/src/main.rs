//! Cystcare: ovarian cyst care-template generator.
//! Entry point for the `cystcare` binary.

mod commands;
mod config;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cystcare_common::error::Result as CareResult;

#[derive(Debug, Parser)]
#[command(
    name = "cystcare",
    version,
    about = "Treatment recommendation, risk, cost and supply check for ovarian cyst patients",
    long_about = "cystcare runs the care-template pipeline over patient records.\n\n\
        Commands:\n  \
        template    Full care template for one patient\n  \
        predict     Treatment prediction with per-label probabilities\n  \
        risk        Guideline risk assessment (no model needed)\n  \
        validate    Check a record without running the pipeline\n  \
        batch       One care template per line of a JSONL file\n  \
        model-info  Model type, features and treatment classes of the bundle"
)]
struct Cli {
    /// Path to cystcare.toml (defaults to CYSTCARE_CONFIG, then ./cystcare.toml)
    #[arg(short, long, global = true, env = "CYSTCARE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the full care template
    Template(InputArgs),
    /// Predict the treatment plan
    Predict(InputArgs),
    /// Score guideline risk factors
    Risk(InputArgs),
    /// Validate a patient record
    Validate(InputArgs),
    /// Process a JSONL file of patient records
    Batch(BatchArgs),
    /// Describe the configured model bundle
    ModelInfo,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Patient record as JSON (`-` for stdin)
    input: PathBuf,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// One patient record per line
    input: PathBuf,

    /// Concurrent workers (overrides batch.workers)
    #[arg(long)]
    workers: Option<usize>,
}

fn finish<T: Serialize>(result: CareResult<T>) -> anyhow::Result<ExitCode> {
    let (json, ok) = commands::render(result, true)?;
    println!("{json}");
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;

    // Initialise structured logging on stderr; stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("Cystcare {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Risk(args) => {
            let input = commands::read_input(&args.input)?;
            finish(commands::offline_pipeline().assess_risk(&input))
        }
        Command::Validate(args) => {
            let input = commands::read_input(&args.input)?;
            let report = commands::offline_pipeline().validate(&input);
            let valid = report.valid;
            finish(Ok(report))?;
            Ok(if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::ModelInfo => finish(commands::model_info(&config.model.bundle_path)),
        Command::Predict(args) => {
            let input = commands::read_input(&args.input)?;
            finish(commands::boot(&config.sources()).and_then(|p| p.predict(&input)))
        }
        Command::Template(args) => {
            let input = commands::read_input(&args.input)?;
            finish(commands::boot(&config.sources()).and_then(|p| p.generate_template(&input)))
        }
        Command::Batch(args) => {
            let lines = commands::read_lines(&args.input)?;
            let workers = args.workers.unwrap_or(config.batch.workers);
            let (outputs, booted) = match commands::boot(&config.sources()) {
                Ok(pipeline) => {
                    info!("Processing {} lines with {} workers", lines.len(), workers);
                    (commands::run_batch(pipeline, lines, workers).await, true)
                }
                Err(e) => (commands::fail_batch(lines, &e), false),
            };
            for line in &outputs {
                println!("{line}");
            }
            Ok(if booted { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
