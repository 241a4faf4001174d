//! Error handling and display for the CLI.

use colored::Colorize;
use fieldlink_client::{ApiError, ApiResponse};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Not authenticated. Run `fieldctl auth login` to authenticate.")]
    NotAuthenticated,

    /// A 2xx response whose body said `success: false`.
    #[error("{message}")]
    Rejected { code: Option<i64>, message: String },

    #[error("No user id known. Pass --user-id or log in again.")]
    MissingUserId,
}

impl CliError {
    fn rejected(response: &ApiResponse) -> Self {
        Self::Rejected {
            code: response.code,
            message: response
                .message
                .clone()
                .unwrap_or_else(|| "Request was not successful".to_string()),
        }
    }
}

/// Turn a `success: false` body into an error.
pub fn ensure_success(response: ApiResponse) -> Result<ApiResponse, CliError> {
    if response.success {
        Ok(response)
    } else {
        Err(CliError::rejected(&response))
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(api_err) = err.downcast_ref::<ApiError>() {
        match api_err {
            ApiError::SessionExpired { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: Your session has expired. Run `fieldctl auth login`.".yellow()
                );
            }
            ApiError::AuthMisconfigured { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: A public endpoint rejected the call. Check the backend auth settings."
                        .yellow()
                );
            }
            ApiError::Timeout { .. } | ApiError::Network { status: None, .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: Check your network connection and `fieldctl env show`.".yellow()
                );
            }
            _ => {}
        }
        if let Some(status) = api_err.status() {
            eprintln!("HTTP status: {}", status);
        }
        return;
    }

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::NotAuthenticated => {
                eprintln!(
                    "\n{}",
                    "Hint: Run `fieldctl auth login` to authenticate.".yellow()
                );
            }
            CliError::Rejected {
                code: Some(code), ..
            } => {
                eprintln!("\nBackend code: {}", code);
            }
            _ => {}
        }
    }
}
