mod artifacts;
mod cli;
mod config;
mod errors;
mod input;
mod llm_client;
mod models;
mod pipeline;
mod render;
mod state;
mod tailoring;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Args;
use crate::config::Config;
use crate::errors::AppError;
use crate::pipeline::{RunRequest, RunSummary};
use crate::render::renderer_for;
use crate::state::{openai_backend, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            println!("{}", summary.report.summary());
            println!("\nArtifacts:");
            for path in [
                &summary.paths.analysis,
                &summary.paths.markdown,
                &summary.paths.document,
                &summary.paths.report,
            ] {
                println!("  {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code().clamp(1, 255) as u8)
        }
    }
}

async fn run(args: Args) -> Result<RunSummary, AppError> {
    // Resolve configuration first: a missing credential stops the run here.
    let config = Config::from_env(args.config_overrides())?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume-tailor v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "LLM client configured (model: {}, max refinements: {})",
        config.model, config.max_refinements
    );

    let renderer = Arc::from(renderer_for(args.format));
    let state = AppState::from_config(config, openai_backend, renderer, args.decision_policy())?;

    let request = RunRequest {
        resume: args.resume,
        job_description: args.job_description,
        output: args.output,
    };
    pipeline::run(&state, &request).await
}
