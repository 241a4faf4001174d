//! Forum commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::error::ensure_success;
use crate::output::print_response;

use super::CommandContext;

/// Forum posts and comments.
#[derive(Debug, Args)]
pub struct ForumCommand {
    #[command(subcommand)]
    command: ForumSubcommand,
}

#[derive(Debug, Subcommand)]
enum ForumSubcommand {
    /// List posts.
    Posts {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        category: Option<String>,
    },

    /// Show one post.
    Post { id: i64 },

    /// Publish a post.
    CreatePost(CreatePostArgs),

    /// List comments on a post.
    Comments {
        post_id: i64,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Comment on a post, or reply to a comment.
    Comment {
        post_id: i64,
        content: String,
        #[arg(long)]
        parent_id: Option<i64>,
    },
}

#[derive(Debug, Args, Serialize)]
struct CreatePostArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    content: String,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
}

impl ForumCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let gateway = ctx.gateway()?;
        let forum = gateway.forum();

        let response = match self.command {
            ForumSubcommand::Posts {
                page,
                limit,
                category,
            } => forum.get_posts(page, limit, category.as_deref()).await?,
            ForumSubcommand::Post { id } => forum.get_post_detail(id).await?,
            ForumSubcommand::CreatePost(args) => {
                ctx.require_auth()?;
                forum.create_post(&args).await?
            }
            ForumSubcommand::Comments {
                post_id,
                page,
                limit,
            } => forum.get_comments(post_id, page, limit).await?,
            ForumSubcommand::Comment {
                post_id,
                content,
                parent_id,
            } => {
                ctx.require_auth()?;
                forum.create_comment(post_id, &content, parent_id).await?
            }
        };

        print_response(&ensure_success(response)?, ctx.format);
        Ok(())
    }
}
