//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod agent;
mod ask;
mod run;
mod thread;

pub use agent::AgentCommands;
pub use ask::AskArgs;
pub use run::RunCommands;
pub use thread::ThreadCommands;

use anyhow::Result;
use clap::{Args, Subcommand};
use runwatch_client::{PollConfig, PollError, RunPoller, StatusSource, TaskResult};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create an agent, ask it one question, print the answer and clean up
    Ask(AskArgs),
    /// Agent management
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Thread and message management
    Thread {
        #[command(subcommand)]
        command: ThreadCommands,
    },
    /// Run lifecycle
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Ask(args) => ask::handle_ask(args, config).await,
        Commands::Agent { command } => agent::handle_agent_command(command, config).await,
        Commands::Thread { command } => thread::handle_thread_command(command, config).await,
        Commands::Run { command } => run::handle_run_command(command, config).await,
    }
}

/// Polling options shared by commands that wait for a run
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Delay between status queries, in milliseconds
    #[arg(long, default_value_t = 1000, allow_negative_numbers = true)]
    pub poll_interval_ms: i64,

    /// Give up after this many milliseconds
    #[arg(long, default_value_t = 600_000, allow_negative_numbers = true)]
    pub max_wait_ms: i64,

    /// Wait without a time limit
    #[arg(long)]
    pub no_max_wait: bool,
}

impl PollArgs {
    /// Converts the flags into a poll configuration
    pub fn poll_config(&self) -> Result<PollConfig, PollError> {
        let max_wait_ms = (!self.no_max_wait).then_some(self.max_wait_ms);
        PollConfig::from_millis(self.poll_interval_ms, max_wait_ms)
    }
}

/// Parse a `--tool` value into an agent tool definition
///
/// A bare name such as `code_interpreter` or `file_search` becomes
/// `{"type": "<name>"}`. Anything starting with `{` is taken as the full
/// JSON definition and must carry a string `type`.
pub fn parse_tool(raw: &str) -> Result<serde_json::Value, String> {
    let raw = raw.trim();

    if raw.starts_with('{') {
        let tool: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| format!("invalid tool JSON: {}", e))?;
        if !tool.get("type").is_some_and(serde_json::Value::is_string) {
            return Err("tool JSON needs a string \"type\" field".to_string());
        }
        return Ok(tool);
    }

    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "expected a tool type such as code_interpreter, or a JSON object, got '{}'",
            raw
        ));
    }

    Ok(serde_json::json!({ "type": raw }))
}

/// Waits for a run, giving up as soon as `token` is cancelled
///
/// A status query still in flight is dropped on cancellation instead of
/// being waited out.
pub async fn await_run<S>(
    poller: RunPoller,
    source: &S,
    handle: &S::Handle,
    token: CancellationToken,
) -> Result<TaskResult, PollError>
where
    S: StatusSource + ?Sized,
{
    let poller = poller.with_cancellation(token.clone());

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            info!("Stopped waiting for {}", handle);
            Err(PollError::Cancelled {
                task_id: handle.to_string(),
            })
        }
        outcome = poller.await_completion(source, handle) => outcome,
    }
}

/// Returns a token that is cancelled on the first Ctrl-C
///
/// Waits racing the token through [`await_run`] stop at once, which lets
/// callers still clean up.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, no longer waiting for the run");
            child.cancel();
        }
    });

    token
}
