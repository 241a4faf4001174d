//! Authentication commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use fieldlink_client::facade::RegisterForm;
use fieldlink_client::ApiResponse;
use serde::Serialize;
use serde_json::Value;

use crate::error::ensure_success;
use crate::output::{print_info, print_response, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Authentication commands.
#[derive(Debug, Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Send a verification code to a phone number.
    Captcha {
        #[arg(long)]
        phone: String,
    },

    /// Log in with phone, password and verification code.
    Login(LoginArgs),

    /// Log in with phone and verification code only.
    QuickLogin {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        captcha: String,
    },

    /// Create an account.
    Register(RegisterArgs),

    /// Forget the stored token.
    Logout,

    /// Show current authentication status.
    Status,

    /// Show the logged-in user's info.
    Whoami,
}

#[derive(Debug, Args)]
struct LoginArgs {
    #[arg(long)]
    phone: String,

    #[arg(long, env = "FIELDLINK_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long)]
    captcha: String,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    phone: String,

    #[arg(long, env = "FIELDLINK_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long)]
    captcha: String,

    #[arg(long)]
    nickname: Option<String>,

    /// URL returned by `fieldctl user avatar upload --temp`.
    #[arg(long)]
    avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusView {
    authenticated: bool,
    user_id: Option<i64>,
    env: String,
    store: String,
}

impl AuthCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            AuthSubcommand::Captcha { phone } => captcha(ctx, &phone).await,
            AuthSubcommand::Login(args) => login(ctx, args).await,
            AuthSubcommand::QuickLogin { phone, captcha } => {
                quick_login(ctx, &phone, &captcha).await
            }
            AuthSubcommand::Register(args) => register(ctx, args).await,
            AuthSubcommand::Logout => logout(ctx),
            AuthSubcommand::Status => status(ctx),
            AuthSubcommand::Whoami => whoami(ctx).await,
        }
    }
}

/// Token and user id out of a login response body.
///
/// The user id is read from `userId` or `user.id` when present.
fn login_identity(data: &Value) -> Option<(String, Option<i64>)> {
    let token = data.get("token")?.as_str().filter(|t| !t.is_empty())?;
    let user_id = data
        .get("userId")
        .or_else(|| data.pointer("/user/id"))
        .and_then(Value::as_i64);
    Some((token.to_string(), user_id))
}

fn store_login(ctx: &CommandContext, response: &ApiResponse) -> Result<()> {
    let (token, user_id) = login_identity(&response.data)
        .context("Login succeeded but the response carried no token")?;

    ctx.session().set_token(&token)?;
    if let Some(user_id) = user_id {
        ctx.state.set_user_id(user_id)?;
    }

    match ctx.format {
        OutputFormat::Json => {
            print_single(&serde_json::json!({ "ok": true, "userId": user_id }))
        }
        OutputFormat::Table => print_success("Logged in successfully."),
    }
    Ok(())
}

async fn captcha(ctx: CommandContext, phone: &str) -> Result<()> {
    let gateway = ctx.gateway()?;
    let response = ensure_success(gateway.user().get_captcha(phone).await?)?;

    match ctx.format {
        OutputFormat::Json => print_response(&response, ctx.format),
        OutputFormat::Table => print_success(&format!("Verification code sent to {phone}.")),
    }
    Ok(())
}

async fn login(ctx: CommandContext, args: LoginArgs) -> Result<()> {
    let gateway = ctx.gateway()?;
    let response = gateway
        .user()
        .login(&args.phone, &args.password, &args.captcha)
        .await?;
    store_login(&ctx, &ensure_success(response)?)
}

async fn quick_login(ctx: CommandContext, phone: &str, captcha: &str) -> Result<()> {
    let gateway = ctx.gateway()?;
    let response = gateway.user().quick_login(phone, captcha).await?;
    store_login(&ctx, &ensure_success(response)?)
}

async fn register(ctx: CommandContext, args: RegisterArgs) -> Result<()> {
    let form = RegisterForm {
        phone: args.phone,
        password: args.password,
        captcha: args.captcha,
        nickname: args.nickname,
        avatar_url: args.avatar_url,
    };

    let gateway = ctx.gateway()?;
    let response = ensure_success(gateway.user().register(&form).await?)?;

    match ctx.format {
        OutputFormat::Json => print_response(&response, ctx.format),
        OutputFormat::Table => {
            print_success("Account created.");
            print_info("Run `fieldctl auth login` to start a session.");
        }
    }
    Ok(())
}

fn logout(ctx: CommandContext) -> Result<()> {
    ctx.state.clear_user()?;
    print_success("Logged out successfully.");
    Ok(())
}

fn status(ctx: CommandContext) -> Result<()> {
    let view = StatusView {
        authenticated: ctx.session().is_authenticated(),
        user_id: ctx.state.user_id(),
        env: ctx.resolver.current_env().to_string(),
        store: ctx.state.path().display().to_string(),
    };

    if ctx.format == OutputFormat::Json {
        print_single(&view);
        return Ok(());
    }

    if view.authenticated {
        println!("{} Authenticated", "Status:".green().bold());
        if let Some(user_id) = view.user_id {
            println!("  User ID: {}", user_id);
        }
    } else {
        println!("{} Not authenticated", "Status:".red().bold());
        println!("\nRun {} to log in.", "fieldctl auth login".cyan());
    }
    println!("  Environment: {}", view.env);
    println!("  Store: {}", view.store);

    Ok(())
}

async fn whoami(ctx: CommandContext) -> Result<()> {
    ctx.require_auth()?;
    let gateway = ctx.gateway()?;
    let response = ensure_success(gateway.user().get_user_info().await?)?;

    if let Some(user_id) = response.data.get("id").and_then(Value::as_i64) {
        ctx.state.set_user_id(user_id)?;
    }

    print_response(&response, ctx.format);
    Ok(())
}
