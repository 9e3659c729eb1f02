//! One-shot ask command
//!
//! Creates an agent and a thread, posts the prompt, runs the agent, waits
//! for the run to finish and prints the conversation. The thread and agent
//! are deleted afterwards whatever the outcome, unless `--keep` is given.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use runwatch_client::{AgentsClient, PollConfig, PollError, RunPoller, RunSpec, TaskService};
use runwatch_core::dto::SortOrder;
use runwatch_core::dto::agent::CreateAgent;
use runwatch_core::dto::message::CreateMessage;
use tracing::warn;

use super::thread::print_conversation;
use super::{PollArgs, await_run, cancel_on_ctrl_c, parse_tool};
use crate::config::Config;

/// Arguments of the ask command
#[derive(Args)]
pub struct AskArgs {
    /// Prompt sent as the user message
    pub prompt: String,

    /// Model deployment the agent runs on
    #[arg(short, long, env = "RUNWATCH_MODEL")]
    pub model: String,

    /// Agent display name
    #[arg(short, long, default_value = "runwatch-agent")]
    pub name: String,

    /// Agent instructions
    #[arg(short, long, default_value = "You are a helpful agent")]
    pub instructions: String,

    /// Tool type (code_interpreter, file_search, ...) or JSON definition (repeatable)
    #[arg(long = "tool", value_parser = parse_tool)]
    pub tools: Vec<serde_json::Value>,

    /// Keep the agent and thread instead of deleting them
    #[arg(long)]
    pub keep: bool,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Handle the ask command
pub async fn handle_ask(args: AskArgs, config: &Config) -> Result<()> {
    let poll_config = args.poll.poll_config()?;
    let client = config.client()?;

    let agent = client
        .create_agent(
            CreateAgent::new(&args.model)
                .with_name(&args.name)
                .with_instructions(&args.instructions)
                .with_tools(args.tools.iter().cloned()),
        )
        .await
        .context("Failed to create agent")?;
    println!("Created agent, agent ID: {}", agent.id.cyan());

    let outcome = match client.create_thread().await {
        Ok(thread) => {
            println!("Created thread, thread ID: {}", thread.id.cyan());
            let outcome = converse(&client, &agent.id, &thread.id, &args.prompt, poll_config).await;

            if args.keep {
                println!("Kept thread {}", thread.id.cyan());
            } else if let Err(e) = client.delete_thread(&thread.id).await {
                warn!("Failed to delete thread {}: {}", thread.id, e);
            } else {
                println!("Deleted thread");
            }

            outcome
        }
        Err(e) => Err(e).context("Failed to create thread"),
    };

    if args.keep {
        println!("Kept agent {}", agent.id.cyan());
    } else if let Err(e) = client.delete_agent(&agent.id).await {
        warn!("Failed to delete agent {}: {}", agent.id, e);
    } else {
        println!("Deleted agent");
    }

    outcome
}

/// Post the prompt, run the agent and print what came back
async fn converse(
    client: &AgentsClient,
    agent_id: &str,
    thread_id: &str,
    prompt: &str,
    poll_config: PollConfig,
) -> Result<()> {
    let message = client
        .create_message(thread_id, CreateMessage::user(prompt))
        .await
        .context("Failed to post message")?;
    println!("Created message, message ID: {}", message.id.cyan());

    let handle = client
        .submit(RunSpec::new(thread_id, agent_id))
        .await
        .context("Failed to start run")?;
    println!("Created run, run ID: {}", handle.run_id.cyan());

    let poller = RunPoller::new(poll_config);
    let failure = match await_run(poller, client, &handle, cancel_on_ctrl_c()).await {
        Ok(result) => {
            println!("Run completed after {} poll(s)", result.polls);
            None
        }
        Err(PollError::RemoteFailure { detail, .. }) => {
            println!("{} {}", "Run error:".red().bold(), detail.red());
            Some(detail)
        }
        Err(e) => return Err(e.into()),
    };

    print_conversation(client, thread_id, SortOrder::Ascending).await?;

    match failure {
        Some(detail) => anyhow::bail!("run {} failed: {}", handle.run_id, detail),
        None => Ok(()),
    }
}
