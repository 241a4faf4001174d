//! CLI commands.

mod agent;
mod auth;
mod content;
mod env;
mod forum;
mod quiz;
mod user;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fieldlink_client::{ApiError, EnvName, EnvironmentResolver, Gateway, Session};
use serde_json::{Map, Value};

use crate::config::LocalState;
use crate::error::CliError;
use crate::output::OutputFormat;

/// fieldctl - Talk to the fieldlink platform backends.
#[derive(Debug, Parser)]
#[command(name = "fieldctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Backend environment for this run (development, testing, production).
    ///
    /// Takes precedence over the saved override.
    #[arg(long, global = true, env = "FIELDLINK_ENV")]
    env: Option<EnvName>,

    /// Directory holding the session store.
    #[arg(long, global = true, env = "FIELDLINK_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in, register and inspect the current session.
    Auth(auth::AuthCommand),

    /// Show or switch the backend environment.
    Env(env::EnvCommand),

    /// Profile, avatar and region lookups.
    User(user::UserCommand),

    /// Carousel, news and agricultural information.
    Content(content::ContentCommand),

    /// Forum posts and comments.
    Forum(forum::ForumCommand),

    /// Quiz questions, points and leaderboard.
    Quiz(quiz::QuizCommand),

    /// Chat with the assistant.
    Agent(agent::AgentCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let state = LocalState::open(self.state_dir.as_deref())?;
        let resolver = EnvironmentResolver::new(state.session())
            .with_override(self.env.map(|env| env.to_string()));

        let ctx = CommandContext {
            state: state.clone(),
            resolver,
            format: OutputFormat::parse(&self.format),
        };

        let result = match self.command {
            Commands::Auth(cmd) => cmd.run(ctx).await,
            Commands::Env(cmd) => cmd.run(ctx).await,
            Commands::User(cmd) => cmd.run(ctx).await,
            Commands::Content(cmd) => cmd.run(ctx).await,
            Commands::Forum(cmd) => cmd.run(ctx).await,
            Commands::Quiz(cmd) => cmd.run(ctx).await,
            Commands::Agent(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("fieldctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        };

        if let Err(e) = &result {
            forget_expired_user(&state, e);
        }
        result
    }
}

/// On session expiry the library drops the token; drop the CLI's
/// per-user keys with it so both logout paths leave the same state.
///
/// Returns whether the error was a session expiry.
fn forget_expired_user(state: &LocalState, err: &anyhow::Error) -> bool {
    let expired = err
        .downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_session_expired);
    if expired {
        if let Err(e) = state.clear_user() {
            tracing::warn!(error = %e, "Failed to clear local user state");
        }
    }
    expired
}

/// Shared command context.
pub struct CommandContext {
    pub state: LocalState,
    pub resolver: EnvironmentResolver,
    pub format: OutputFormat,
}

impl CommandContext {
    pub fn session(&self) -> Session {
        self.state.session()
    }

    /// Gateway for the resolved environment.
    pub fn gateway(&self) -> Result<Gateway> {
        Ok(Gateway::from_resolver(&self.resolver, self.session())?)
    }

    /// Fail early when no token is stored.
    pub fn require_auth(&self) -> Result<()> {
        if self.session().is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotAuthenticated.into())
        }
    }

    /// Prefer the flag, then the id saved at login.
    pub fn user_id(&self, flag: Option<i64>) -> Result<i64> {
        flag.or_else(|| self.state.user_id())
            .ok_or_else(|| CliError::MissingUserId.into())
    }
}

/// Parse a `key=value` pair. Values that read as JSON keep their type.
pub(crate) fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Collect `--set` pairs into one JSON object; later keys win.
pub(crate) fn fields_object(fields: Vec<(String, Value)>) -> Value {
    Value::Object(fields.into_iter().collect::<Map<String, Value>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn env_flag_rejects_unknown_names() {
        let parsed = Cli::try_parse_from(["fieldctl", "--env", "staging", "version"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from(["fieldctl", "--env", "testing", "version"]).unwrap();
        assert_eq!(cli.env, Some(EnvName::Testing));
    }

    #[test]
    fn expired_session_clears_local_user_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = LocalState::open(Some(dir.path())).unwrap();
        state.set_user_id(42).unwrap();
        state.set_chat_session("chat-1").unwrap();

        let err = anyhow::Error::new(ApiError::SessionExpired {
            message: "登录已过期，请重新登录".to_string(),
            redirect_to: "/login".to_string(),
        });
        assert!(forget_expired_user(&state, &err));

        let reopened = LocalState::open(Some(dir.path())).unwrap();
        assert_eq!(reopened.user_id(), None);
        assert_eq!(reopened.chat_session(), None);
    }

    #[test]
    fn other_errors_keep_local_user_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = LocalState::open(Some(dir.path())).unwrap();
        state.set_user_id(42).unwrap();

        let err = anyhow::Error::new(ApiError::Server {
            message: "服务器错误，请稍后重试".to_string(),
        });
        assert!(!forget_expired_user(&state, &err));
        assert_eq!(state.user_id(), Some(42));
    }

    #[test]
    fn field_values_keep_json_types() {
        assert_eq!(parse_field("age=30").unwrap(), ("age".to_string(), json!(30)));
        assert_eq!(
            parse_field("nickname=老王").unwrap(),
            ("nickname".to_string(), json!("老王"))
        );
        assert_eq!(
            parse_field("tags=[\"wheat\"]").unwrap(),
            ("tags".to_string(), json!(["wheat"]))
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn later_fields_win() {
        let object = fields_object(vec![
            ("a".to_string(), json!(1)),
            ("a".to_string(), json!(2)),
        ]);
        assert_eq!(object, json!({ "a": 2 }));
    }
}
