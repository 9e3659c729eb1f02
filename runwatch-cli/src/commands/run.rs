//! Run command handlers
//!
//! Starting runs, inspecting them, and waiting for them to finish.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use runwatch_client::{AgentsClient, PollError, RunHandle, RunPoller, RunSpec, TaskService};
use runwatch_core::domain::run::{Run, RunStatus, RunStep};
use runwatch_core::dto::run::ToolOutput;
use tracing::warn;

use super::{PollArgs, await_run, cancel_on_ctrl_c};
use crate::config::Config;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Start a run of an agent on a thread
    Start {
        /// Thread ID
        thread_id: String,

        /// Agent ID
        agent_id: String,

        /// Override the agent's instructions for this run
        #[arg(short, long)]
        instructions: Option<String>,

        /// Wait for the run to finish
        #[arg(short, long)]
        wait: bool,

        #[command(flatten)]
        poll: PollArgs,
    },
    /// Show the current state of a run
    Status {
        /// Thread ID
        thread_id: String,

        /// Run ID
        run_id: String,
    },
    /// Wait for a run to finish
    Wait {
        /// Thread ID
        thread_id: String,

        /// Run ID
        run_id: String,

        /// Delete the run's thread once the run has finished
        #[arg(long)]
        delete: bool,

        #[command(flatten)]
        poll: PollArgs,
    },
    /// Cancel a run
    Cancel {
        /// Thread ID
        thread_id: String,

        /// Run ID
        run_id: String,
    },
    /// List the steps a run has taken
    Steps {
        /// Thread ID
        thread_id: String,

        /// Run ID
        run_id: String,
    },
    /// Answer the tool calls a run is waiting on
    SubmitToolOutputs {
        /// Thread ID
        thread_id: String,

        /// Run ID
        run_id: String,

        /// Tool output as CALL_ID=OUTPUT (repeatable)
        #[arg(short, long = "output", value_parser = parse_tool_output, required = true)]
        outputs: Vec<ToolOutput>,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        RunCommands::Start {
            thread_id,
            agent_id,
            instructions,
            wait,
            poll,
        } => {
            let poll_config = poll.poll_config()?;
            let mut spec = RunSpec::new(thread_id, agent_id);
            spec.instructions = instructions;

            let handle = client.submit(spec).await.context("Failed to start run")?;
            println!("{} Started run {}", "✓".green(), handle.run_id.cyan());

            if wait {
                wait_for_run(&client, &handle, RunPoller::new(poll_config)).await?;
            }
            Ok(())
        }
        RunCommands::Status { thread_id, run_id } => {
            let run = client.get_run(&thread_id, &run_id).await?;
            print_run_details(&run);
            Ok(())
        }
        RunCommands::Wait {
            thread_id,
            run_id,
            delete,
            poll,
        } => {
            let poll_config = poll.poll_config()?;
            let handle = RunHandle::new(thread_id, run_id);
            wait_then_delete(&client, &handle, RunPoller::new(poll_config), delete).await
        }
        RunCommands::Cancel { thread_id, run_id } => {
            let run = client.cancel_run(&thread_id, &run_id).await?;
            println!(
                "{} Cancellation requested, run is {}",
                "✓".green(),
                colorize_status(&run.status)
            );
            Ok(())
        }
        RunCommands::Steps { thread_id, run_id } => {
            let steps = client.list_run_steps(&thread_id, &run_id).await?;
            if steps.is_empty() {
                println!("{}", "No steps recorded for this run.".yellow());
            } else {
                for step in &steps {
                    print_step(step);
                }
            }
            Ok(())
        }
        RunCommands::SubmitToolOutputs {
            thread_id,
            run_id,
            outputs,
        } => {
            let run = client
                .submit_tool_outputs(&thread_id, &run_id, outputs)
                .await?;
            println!(
                "{} Tool outputs submitted, run is {}",
                "✓".green(),
                colorize_status(&run.status)
            );
            Ok(())
        }
    }
}

/// Wait for a run, then optionally delete its thread
///
/// A failed delete is logged and never replaces the wait outcome.
async fn wait_then_delete(
    client: &AgentsClient,
    handle: &RunHandle,
    poller: RunPoller,
    delete: bool,
) -> Result<()> {
    let outcome = wait_for_run(client, handle, poller).await;

    if delete {
        match client.delete(handle).await {
            Ok(()) => println!("{} Deleted thread {}", "✓".green(), handle.thread_id.cyan()),
            Err(e) => warn!("Failed to delete thread {}: {}", handle.thread_id, e),
        }
    }

    outcome
}

/// Poll a run until it finishes and report the outcome
async fn wait_for_run(client: &AgentsClient, handle: &RunHandle, poller: RunPoller) -> Result<()> {
    match await_run(poller, client, handle, cancel_on_ctrl_c()).await {
        Ok(result) => {
            println!(
                "{} Run {} completed after {} poll(s)",
                "✓".green(),
                handle.run_id.cyan(),
                result.polls
            );
            Ok(())
        }
        Err(PollError::RemoteFailure { detail, .. }) => {
            println!("{} Run error: {}", "✗".red(), detail.red());
            anyhow::bail!("run {} failed", handle.run_id)
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse a `CALL_ID=OUTPUT` pair
fn parse_tool_output(raw: &str) -> Result<ToolOutput, String> {
    match raw.split_once('=') {
        Some((call_id, output)) if !call_id.is_empty() => Ok(ToolOutput {
            tool_call_id: call_id.to_string(),
            output: output.to_string(),
        }),
        _ => Err(format!("expected CALL_ID=OUTPUT, got '{}'", raw)),
    }
}

fn print_run_details(run: &Run) {
    println!("{}", "Run Details:".bold());
    println!("  ID:        {}", run.id.cyan());
    println!("  Thread:    {}", run.thread_id.dimmed());
    println!("  Agent:     {}", run.assistant_id.dimmed());
    println!("  Status:    {}", colorize_status(&run.status));
    println!("  Created:   {}", run.created_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(started) = run.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(finished) = run.completed_at.or(run.failed_at) {
        println!("  Finished:  {}", finished.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = run.started_at {
            let seconds = finished.signed_duration_since(started).num_seconds();
            println!("  Duration:  {}s", seconds);
        }
    }

    if let Some(usage) = run.usage {
        println!(
            "  Tokens:    {} prompt / {} completion",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    if let Some(error) = &run.last_error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.to_string().red());
    }

    if let Some(action) = &run.required_action {
        println!("\n{}", "Waiting on:".bold());
        let calls = action
            .submit_tool_outputs
            .as_ref()
            .map(|s| s.tool_calls.as_slice())
            .unwrap_or_default();
        for call in calls {
            match &call.function {
                Some(function) => println!(
                    "  {} {} {}({})",
                    "▸".cyan(),
                    call.id.dimmed(),
                    function.name,
                    function.arguments
                ),
                None => println!("  {} {} ({})", "▸".cyan(), call.id.dimmed(), call.kind),
            }
        }
    }
}

fn print_step(step: &RunStep) {
    println!(
        "  {} {} {} [{}]",
        "▸".cyan(),
        step.created_at.format("%H:%M:%S").to_string().dimmed(),
        step.kind,
        step.status
    );
}

/// Colorize run status for display
fn colorize_status(status: &RunStatus) -> colored::ColoredString {
    let status_str = status.as_str();
    match status {
        RunStatus::Queued => status_str.yellow(),
        RunStatus::InProgress | RunStatus::Cancelling => status_str.cyan(),
        RunStatus::RequiresAction => status_str.magenta(),
        RunStatus::Completed => status_str.green(),
        RunStatus::Failed | RunStatus::Expired | RunStatus::Incomplete => status_str.red(),
        RunStatus::Cancelled => status_str.dimmed(),
    }
}
