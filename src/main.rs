use std::process::ExitCode;

use clap::Parser;
use xmpp_notify::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_and_merge_config(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_logger_from_settings(&settings) {
        eprintln!("Logger initialization error: {:#}", e);
        return ExitCode::from(2);
    }

    tracing::debug!(
        version = xmpp_notify::pkg_version(),
        application = %settings.application.name,
        "starting"
    );

    match execute_command(&cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_delivery_failure() => {
            eprintln!("{}", e);
            ExitCode::from(3)
        }
        Err(e) => {
            tracing::error!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
