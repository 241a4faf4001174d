//! Content commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::error::ensure_success;
use crate::output::print_response;

use super::CommandContext;

/// Carousel, news and agricultural information.
#[derive(Debug, Args)]
pub struct ContentCommand {
    #[command(subcommand)]
    command: ContentSubcommand,
}

#[derive(Debug, Subcommand)]
enum ContentSubcommand {
    /// Home page carousel.
    Carousel,

    /// List news.
    News {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Show one news item and count the read.
    Read {
        id: i64,

        /// Do not bump the read counter.
        #[arg(long)]
        no_count: bool,
    },

    /// List agricultural information in a category.
    Info {
        category: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

/// Content type sent with read counts for news items.
const NEWS_KIND: &str = "news";

impl ContentCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let gateway = ctx.gateway()?;
        let content = gateway.content();

        let response = match self.command {
            ContentSubcommand::Carousel => content.get_carousel().await?,
            ContentSubcommand::News { page, limit } => content.get_news(page, limit).await?,
            ContentSubcommand::Read { id, no_count } => {
                let detail = content.get_news_detail(id).await?;
                if !no_count && detail.success {
                    // A failed counter bump must not hide the article.
                    if let Err(e) = content.increment_read_count(id, NEWS_KIND).await {
                        tracing::warn!(id, error = %e, "Failed to count read");
                    }
                }
                detail
            }
            ContentSubcommand::Info {
                category,
                page,
                limit,
            } => content.get_information(&category, page, limit).await?,
        };

        print_response(&ensure_success(response)?, ctx.format);
        Ok(())
    }
}
