//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{CheckCommandHandler, SendCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// Execute a CLI command with the given settings
///
/// # Arguments
/// * `cli` - Parsed CLI arguments
/// * `settings` - Merged and validated settings
///
/// # Errors
/// Returns errors from command handlers or validation failures
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Commands::Send { message, title, .. } => {
            SendCommandHandler::new(settings)
                .execute(message, title.as_deref())
                .await?;
            Ok(())
        }
        Commands::Check => CheckCommandHandler::new(settings).execute(),
    }
}

/// Validate command arguments before execution
fn validate_command_args(cli: &Cli) -> AppResult<()> {
    if let Err(msg) = cli.validate() {
        return Err(AppError::Validation {
            field: "cli_arguments".to_string(),
            reason: msg,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parser::Cli;
    use clap::Parser;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.xmpp.sender = Some("bot@example.com".to_string());
        config.xmpp.password = Some("secret".to_string());
        config.xmpp.recipient = Some("alice@example.com".to_string());
        config
    }

    #[tokio::test]
    async fn test_execute_check() {
        let cli = Cli::try_parse_from(["xmpp-notify", "check"]).unwrap();

        let result = execute_command(&cli, create_valid_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_check_invalid_config() {
        let cli = Cli::try_parse_from(["xmpp-notify", "check"]).unwrap();

        let result = execute_command(&cli, Settings::default()).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_validate_conflicting_args() {
        let cli = Cli {
            command: Commands::Check,
            config: None,
            env: None,
            verbose: true,
            quiet: true,
        };

        let result = validate_command_args(&cli);
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}
