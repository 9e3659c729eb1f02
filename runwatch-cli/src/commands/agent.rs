//! Agent command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use runwatch_core::domain::agent::Agent;
use runwatch_core::dto::agent::CreateAgent;

use super::parse_tool;
use crate::config::Config;

/// Agent subcommands
#[derive(Subcommand)]
pub enum AgentCommands {
    /// Create a new agent
    Create {
        /// Model deployment the agent runs on
        #[arg(short, long, env = "RUNWATCH_MODEL")]
        model: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// System instructions
        #[arg(short, long)]
        instructions: Option<String>,

        /// Tool type (code_interpreter, file_search, ...) or JSON definition (repeatable)
        #[arg(long = "tool", value_parser = parse_tool)]
        tools: Vec<serde_json::Value>,
    },
    /// List agents
    List,
    /// Get agent details
    Get {
        /// Agent ID
        id: String,
    },
    /// Delete an agent
    Delete {
        /// Agent ID
        id: String,
    },
}

/// Handle agent commands
pub async fn handle_agent_command(command: AgentCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        AgentCommands::Create {
            model,
            name,
            instructions,
            tools,
        } => {
            let mut req = CreateAgent::new(model).with_tools(tools);
            req.name = name;
            req.instructions = instructions;

            let agent = client
                .create_agent(req)
                .await
                .context("Failed to create agent")?;
            println!("{} Created agent {}", "✓".green(), agent.id.cyan());
            Ok(())
        }
        AgentCommands::List => {
            let agents = client.list_agents().await?;
            if agents.is_empty() {
                println!("{}", "No agents found.".yellow());
            } else {
                println!("{}", format!("Found {} agent(s):", agents.len()).bold());
                println!();
                for agent in &agents {
                    print_agent_summary(agent);
                }
            }
            Ok(())
        }
        AgentCommands::Get { id } => {
            let agent = client.get_agent(&id).await?;
            print_agent_details(&agent);
            Ok(())
        }
        AgentCommands::Delete { id } => {
            let status = client.delete_agent(&id).await?;
            if status.deleted {
                println!("{} Deleted agent {}", "✓".green(), id.cyan());
            } else {
                println!("{}", format!("Agent {} was not deleted.", id).yellow());
            }
            Ok(())
        }
    }
}

fn print_agent_summary(agent: &Agent) {
    println!("  {} Agent {}", "▸".cyan(), agent.id.bold());
    if let Some(name) = &agent.name {
        println!("    Name:    {}", name);
    }
    println!("    Model:   {}", agent.model.dimmed());
    println!(
        "    Created: {}",
        agent
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

fn print_agent_details(agent: &Agent) {
    println!("{}", "Agent Details:".bold());
    println!("  ID:      {}", agent.id.cyan());
    println!("  Name:    {}", agent.name.as_deref().unwrap_or("-"));
    println!("  Model:   {}", agent.model);
    println!("  Created: {}", agent.created_at.format("%Y-%m-%d %H:%M:%S"));

    let tools: Vec<&str> = agent.tool_types().collect();
    if !tools.is_empty() {
        println!("  Tools:   {}", tools.join(", "));
    }

    if let Some(instructions) = &agent.instructions {
        println!("\n{}", "Instructions:".bold());
        println!("{}", instructions);
    }
}
