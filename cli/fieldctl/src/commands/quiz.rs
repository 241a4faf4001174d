//! Quiz commands, backed by the answer service.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::error::ensure_success;
use crate::output::print_response;

use super::CommandContext;

/// Quiz questions, points and leaderboard.
#[derive(Debug, Args)]
pub struct QuizCommand {
    #[command(subcommand)]
    command: QuizSubcommand,
}

#[derive(Debug, Subcommand)]
enum QuizSubcommand {
    /// Draw questions.
    Questions {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Answer a question.
    Submit { question_id: i64, answer: String },

    /// Show accumulated points.
    Points {
        #[arg(long)]
        user_id: Option<i64>,
    },

    /// Show the leaderboard (daily, weekly or total).
    Leaderboard {
        #[arg(long, default_value = "daily")]
        kind: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Show past answers.
    History {
        #[arg(long)]
        user_id: Option<i64>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

impl QuizCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let gateway = ctx.gateway()?;
        let answer = gateway.answer();

        let response = match self.command {
            QuizSubcommand::Questions {
                category,
                difficulty,
                limit,
            } => {
                answer
                    .get_questions(category.as_deref(), difficulty.as_deref(), limit)
                    .await?
            }
            QuizSubcommand::Submit {
                question_id,
                answer: user_answer,
            } => {
                ctx.require_auth()?;
                answer.submit_answer(question_id, &user_answer).await?
            }
            QuizSubcommand::Points { user_id } => {
                answer.get_user_points(ctx.user_id(user_id)?).await?
            }
            QuizSubcommand::Leaderboard { kind, limit } => {
                answer.get_leaderboard(&kind, limit).await?
            }
            QuizSubcommand::History {
                user_id,
                page,
                limit,
            } => {
                answer
                    .get_answer_history(ctx.user_id(user_id)?, page, limit)
                    .await?
            }
        };

        print_response(&ensure_success(response)?, ctx.format);
        Ok(())
    }
}
