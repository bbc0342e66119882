//! Groundwork CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load `groundwork.toml` and apply flag overrides.
//! 2. **Wire observability**: install the `tracing-subscriber` stack, with an
//!    OpenTelemetry OTLP exporter when an endpoint is configured.
//! 3. **Construct workers**: build the five research stages from a recorded
//!    transcript and hand the assembled graph to `PipelineExecutor`.
//! 4. **Deliver**: print the cited report, or write every run artefact as JSON.

mod config;
mod telemetry;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nodes::{research_pipeline, PipelineExecutor, Transcript};
use tracing::info;

use crate::config::{GroundworkConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "groundwork", version, about = "Grounded research report pipeline")]
struct Cli {
    /// Configuration file; defaults to ./groundwork.toml when present.
    #[arg(long, global = true, env = "GROUNDWORK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the research pipeline over a recorded transcript.
    Run(RunArgs),
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Transcript JSON: initial state plus scripted responses per stage.
    #[arg(long)]
    transcript: PathBuf,

    /// Overrides `pipeline.max_search_iterations`.
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Overrides `telemetry.log_format`.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Write all run artefacts as JSON here instead of printing the report.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = GroundworkConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => run(args, config).await,
    }
}

async fn run(args: RunArgs, mut config: GroundworkConfig) -> anyhow::Result<()> {
    if let Some(max_iterations) = args.max_iterations {
        config.pipeline.max_search_iterations = max_iterations;
    }
    if let Some(log_format) = args.log_format {
        config.telemetry.log_format = log_format;
    }

    let _telemetry = telemetry::init(&config.telemetry)?;
    let budget = config.iteration_budget()?;

    let text = tokio::fs::read_to_string(&args.transcript)
        .await
        .with_context(|| format!("failed to read transcript {}", args.transcript.display()))?;
    let transcript = Transcript::from_json(&text)
        .with_context(|| format!("invalid transcript {}", args.transcript.display()))?;
    info!(
        transcript = %args.transcript.display(),
        max_search_iterations = budget.get(),
        "Loaded transcript"
    );

    let executor = PipelineExecutor::new(research_pipeline(transcript.research_workers(), budget)?);
    let artifacts = executor.execute(transcript.initial_state()?).await?;

    match args.output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&artifacts)?;
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(output = %path.display(), run_id = %artifacts.run_id, "Run artefacts written");
        }
        None => match artifacts.final_report {
            Some(report) => println!("{report}"),
            None => anyhow::bail!("pipeline finished without a final report"),
        },
    }

    Ok(())
}
