//! Thread command handlers
//!
//! Creating and deleting threads, and reading their messages.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use runwatch_client::AgentsClient;
use runwatch_core::domain::message::{Message, MessageRole};
use runwatch_core::dto::SortOrder;

use crate::config::Config;

/// Thread subcommands
#[derive(Subcommand)]
pub enum ThreadCommands {
    /// Create an empty thread
    Create,
    /// Delete a thread with its messages and runs
    Delete {
        /// Thread ID
        id: String,
    },
    /// Print the messages of a thread
    Messages {
        /// Thread ID
        id: String,

        /// Newest first
        #[arg(long)]
        desc: bool,
    },
}

/// Handle thread commands
pub async fn handle_thread_command(command: ThreadCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        ThreadCommands::Create => {
            let thread = client.create_thread().await?;
            println!("{} Created thread {}", "✓".green(), thread.id.cyan());
            Ok(())
        }
        ThreadCommands::Delete { id } => {
            client.delete_thread(&id).await?;
            println!("{} Deleted thread {}", "✓".green(), id.cyan());
            Ok(())
        }
        ThreadCommands::Messages { id, desc } => {
            let order = if desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            print_conversation(&client, &id, order).await
        }
    }
}

/// Print every message of a thread
pub async fn print_conversation(client: &AgentsClient, thread_id: &str, order: SortOrder) -> Result<()> {
    let messages = client.list_messages(thread_id, order).await?;

    if messages.is_empty() {
        println!("{}", "No messages in this thread.".yellow());
        return Ok(());
    }

    println!("{}", "─".repeat(80).dimmed());
    for message in &messages {
        print_message(message);
    }
    println!("{}", "─".repeat(80).dimmed());

    Ok(())
}

fn print_message(message: &Message) {
    let role = match message.role {
        MessageRole::User => "user".cyan(),
        MessageRole::Assistant => "assistant".green(),
    };

    if let Some(text) = message.last_text() {
        println!("{}: {}", role.bold(), text);
    }

    for file_id in message.image_file_ids() {
        println!("  {} image file {}", "▸".dimmed(), file_id.dimmed());
    }
}
