//! Profile, avatar and region commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::error::ensure_success;
use crate::output::print_response;

use super::{fields_object, parse_field, CommandContext};

/// Profile, avatar and region commands.
#[derive(Debug, Args)]
pub struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Debug, Subcommand)]
enum UserSubcommand {
    /// Show a user's public profile.
    Profile {
        /// Defaults to the logged-in user.
        #[arg(long)]
        user_id: Option<i64>,
    },

    /// Update profile fields.
    UpdateProfile(FieldsArgs),

    /// Complete the user info after registration.
    FillInfo(FieldsArgs),

    /// Show editable user info with its option lists.
    EditInfo,

    /// List gender options.
    Genders,

    /// List provinces.
    Provinces,

    /// List the cities of a province.
    Cities { province_id: i64 },

    /// List the districts of a city.
    Districts { city_id: i64 },

    /// Avatar uploads.
    Avatar(AvatarCommand),
}

#[derive(Debug, Args)]
struct FieldsArgs {
    /// Field to send, as key=value. Repeatable.
    #[arg(long = "set", value_parser = parse_field, required = true)]
    fields: Vec<(String, Value)>,
}

#[derive(Debug, Args)]
struct AvatarCommand {
    #[command(subcommand)]
    command: AvatarSubcommand,
}

#[derive(Debug, Subcommand)]
enum AvatarSubcommand {
    /// Upload an image as the avatar.
    Upload {
        file: PathBuf,

        /// Upload to temporary storage, e.g. before registering.
        #[arg(long)]
        temp: bool,
    },

    /// Delete temporary avatars by URL.
    DeleteTemp {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

impl UserCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let gateway = ctx.gateway()?;
        let user = gateway.user();

        let response = match self.command {
            UserSubcommand::Profile { user_id } => {
                let user_id = ctx.user_id(user_id)?;
                user.get_profile(user_id).await?
            }
            UserSubcommand::UpdateProfile(args) => {
                ctx.require_auth()?;
                user.update_profile(&fields_object(args.fields)).await?
            }
            UserSubcommand::FillInfo(args) => {
                ctx.require_auth()?;
                user.fill_user_info(&fields_object(args.fields)).await?
            }
            UserSubcommand::EditInfo => {
                ctx.require_auth()?;
                user.get_edit_user_info().await?
            }
            UserSubcommand::Genders => user.get_gender_options().await?,
            UserSubcommand::Provinces => user.get_provinces().await?,
            UserSubcommand::Cities { province_id } => user.get_cities(province_id).await?,
            UserSubcommand::Districts { city_id } => user.get_districts(city_id).await?,
            UserSubcommand::Avatar(cmd) => match cmd.command {
                AvatarSubcommand::Upload { file, temp } => {
                    let (name, bytes) = read_image(&file).await?;
                    if temp {
                        user.upload_temp_avatar(&name, bytes).await?
                    } else {
                        ctx.require_auth()?;
                        user.update_avatar(&name, bytes).await?
                    }
                }
                AvatarSubcommand::DeleteTemp { urls } => match urls.as_slice() {
                    [url] => user.delete_temp_avatar(url).await?,
                    _ => user.delete_temp_avatar_batch(&urls).await?,
                },
            },
        };

        print_response(&ensure_success(response)?, ctx.format);
        Ok(())
    }
}

async fn read_image(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {:?}", path))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    Ok((name, bytes))
}
