use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use excel_runner::cli::{Cli, Command};
use excel_runner::commands;
use excel_runner::config::RunnerConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "excel_runner=debug"
    } else {
        "excel_runner=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => RunnerConfig::load_from(path)?,
        None => RunnerConfig::load()?,
    };
    if let Some(base) = cli.api_base {
        config.api_base = base;
    }

    match &cli.command {
        Command::Run(args) => commands::run(&config, args).await,
        Command::Watch { job_id } => commands::watch(&config, job_id).await,
        Command::Examples { output } => commands::examples(&config, output).await,
    }
}
