//! Runwatch CLI
//!
//! Command-line interface for running agents on the agent service and
//! waiting for their runs to finish.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "runwatch")]
#[command(about = "Run agents and wait for their runs to finish", long_about = None)]
struct Cli {
    /// Project endpoint of the agent service
    #[arg(long, env = "RUNWATCH_ENDPOINT")]
    endpoint: String,

    /// Bearer token sent with every request
    #[arg(long, env = "RUNWATCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Value of the api-version query parameter
    #[arg(
        long,
        env = "RUNWATCH_API_VERSION",
        default_value = runwatch_client::DEFAULT_API_VERSION
    )]
    api_version: String,

    /// Timeout for each HTTP request, in seconds
    #[arg(
        long,
        env = "RUNWATCH_REQUEST_TIMEOUT_SECS",
        default_value_t = config::DEFAULT_REQUEST_TIMEOUT.as_secs()
    )]
    request_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runwatch_cli=info,runwatch_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        endpoint: cli.endpoint,
        token: cli.token,
        api_version: cli.api_version,
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
