//! Assistant chat.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::error::ensure_success;
use crate::output::{print_response, OutputFormat};

use super::CommandContext;

/// Chat with the assistant.
#[derive(Debug, Args)]
pub struct AgentCommand {
    #[command(subcommand)]
    command: AgentSubcommand,
}

#[derive(Debug, Subcommand)]
enum AgentSubcommand {
    /// Send one message. Continues the last conversation unless told otherwise.
    Chat {
        message: String,

        /// Conversation to continue.
        #[arg(long, conflicts_with = "new")]
        session_id: Option<String>,

        /// Start a fresh conversation.
        #[arg(long)]
        new: bool,
    },
}

/// Reply text, if the assistant sent one under a known key.
fn reply_text(data: &Value) -> Option<&str> {
    ["reply", "answer", "content", "message"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .or_else(|| data.as_str())
}

impl AgentCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            AgentSubcommand::Chat {
                message,
                session_id,
                new,
            } => chat(ctx, &message, session_id, new).await,
        }
    }
}

async fn chat(
    ctx: CommandContext,
    message: &str,
    session_id: Option<String>,
    new: bool,
) -> Result<()> {
    ctx.require_auth()?;

    let session_id = match (session_id, new) {
        (Some(id), _) => Some(id),
        (None, true) => None,
        (None, false) => ctx.state.chat_session(),
    };

    let gateway = ctx.gateway()?;
    let response = gateway.agent().chat(message, session_id.as_deref()).await?;
    let response = ensure_success(response)?;

    if let Some(id) = response.data.get("sessionId").and_then(Value::as_str) {
        ctx.state.set_chat_session(id)?;
    }

    match (ctx.format, reply_text(&response.data)) {
        (OutputFormat::Table, Some(text)) => println!("{}", text),
        _ => print_response(&response, ctx.format),
    }
    Ok(())
}
