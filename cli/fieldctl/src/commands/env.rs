//! Environment commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use fieldlink_client::{EnvName, EnvironmentConfig, PoolOptions, Service};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Show or switch the backend environment.
#[derive(Debug, Args)]
pub struct EnvCommand {
    #[command(subcommand)]
    command: EnvSubcommand,
}

#[derive(Debug, Subcommand)]
enum EnvSubcommand {
    /// Show the active environment and its service URLs.
    Show,

    /// List the known environments.
    List,

    /// Save an environment override for later runs.
    Set {
        /// development, testing or production.
        name: String,
    },

    /// Remove the saved override.
    Clear,
}

#[derive(Debug, Serialize, Tabled)]
struct ServiceRow {
    service: String,
    base_url: String,
    timeout: String,
}

#[derive(Debug, Serialize, Tabled)]
struct EnvRow {
    name: String,
    user_api: String,
    debug: bool,
    active: bool,
}

fn service_rows(config: &EnvironmentConfig) -> Vec<ServiceRow> {
    let options = PoolOptions::default();
    Service::ALL
        .iter()
        .map(|service| ServiceRow {
            service: service.to_string(),
            base_url: config.base_url(*service).to_string(),
            timeout: format!("{}s", options.timeout_for(*service).as_secs()),
        })
        .collect()
}

impl EnvCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            EnvSubcommand::Show => show(ctx),
            EnvSubcommand::List => list(ctx),
            EnvSubcommand::Set { name } => set(ctx, &name),
            EnvSubcommand::Clear => clear(ctx),
        }
    }
}

fn show(ctx: CommandContext) -> Result<()> {
    let config = ctx.resolver.resolve();

    match ctx.format {
        OutputFormat::Json => print_single(&*config),
        OutputFormat::Table => {
            println!("env: {}", config.env_name);
            println!("debug: {}", config.debug);
            println!(
                "saved override: {}",
                ctx.session().env_override().as_deref().unwrap_or("-")
            );
            print_output(&service_rows(&config), ctx.format);
        }
    }

    Ok(())
}

fn list(ctx: CommandContext) -> Result<()> {
    let active = ctx.resolver.current_env();
    let rows: Vec<EnvRow> = EnvName::ALL
        .iter()
        .map(|name| {
            let config = EnvironmentConfig::for_env(*name);
            EnvRow {
                name: name.to_string(),
                user_api: config.user_api,
                debug: config.debug,
                active: *name == active,
            }
        })
        .collect();

    print_output(&rows, ctx.format);
    Ok(())
}

fn set(ctx: CommandContext, name: &str) -> Result<()> {
    let env = ctx.resolver.set_env(name)?;
    let effective = ctx.resolver.current_env();

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "saved": env,
            "effective": effective,
        })),
        OutputFormat::Table => {
            print_success(&format!("Environment set to {env}."));
            if effective != env {
                print_info(&format!(
                    "An explicit override keeps this run on {effective}."
                ));
            }
        }
    }

    Ok(())
}

fn clear(ctx: CommandContext) -> Result<()> {
    ctx.session().clear_env_override()?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "ok": true })),
        OutputFormat::Table => print_success("Cleared saved environment override."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_cover_every_service_with_its_timeout() {
        let rows = service_rows(&EnvironmentConfig::for_env(EnvName::Testing));
        assert_eq!(rows.len(), Service::ALL.len());

        let agent = rows.iter().find(|r| r.service == "agent-service").unwrap();
        assert_eq!(agent.base_url, "http://192.168.103.25:8085");
        assert_eq!(agent.timeout, "60s");

        let user = rows.iter().find(|r| r.service == "user-service").unwrap();
        assert_eq!(user.timeout, "10s");
    }
}
