//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Send one-shot Jabber (XMPP) notifications
#[derive(Parser, Debug)]
#[command(name = "xmpp-notify")]
#[command(about = "Send one-shot Jabber (XMPP) notifications")]
#[command(long_about = "
xmpp-notify delivers a single text notification to a Jabber address. Each
invocation opens one encrypted connection, authenticates, sends one chat
message and disconnects.

The sender account, password and default recipient come from the layered
configuration (config/default.toml, config/{environment}.toml,
config/local.toml and XMPP_NOTIFY_* environment variables).

EXAMPLES:
    # Send a notification to the configured recipient
    xmpp-notify send \"Back door opened\" --title Security

    # Send to someone else
    xmpp-notify send \"All clear\" --recipient bob@example.com

    # Use a specific configuration file
    xmpp-notify --config /etc/xmpp-notify/notify.toml send \"Disk almost full\"

    # Check the configuration without connecting
    xmpp-notify check
")]
#[command(version = crate::build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered configuration
    /// directory. Environment variable overrides still apply.
    ///
    /// Example: --config /etc/xmpp-notify/notify.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` overlay is loaded.
    ///
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Shows the session state transitions and protocol steps.
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one notification
    ///
    /// Exits with a non-zero status when the message could not be delivered.
    ///
    /// Examples:
    ///   xmpp-notify send "Back door opened" --title Security
    ///   xmpp-notify send "All clear" --recipient bob@example.com
    Send {
        /// Message body; may be empty
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// Title prepended as "TITLE: MESSAGE"
        #[arg(short, long)]
        title: Option<String>,

        /// Recipient address, overriding `xmpp.recipient`
        #[arg(short, long, value_name = "JID", value_parser = super::validation::validate_address)]
        recipient: Option<String>,

        /// Server `host` or `host:port`, overriding the sender's domain
        #[arg(long, value_name = "HOST[:PORT]", value_parser = super::validation::validate_server)]
        server: Option<String>,

        /// Log level override
        ///
        /// Takes precedence over --verbose/--quiet and the configuration file.
        ///
        /// Available levels: error, warn, info, debug, trace
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,
    },
    /// Validate configuration and exit without connecting
    ///
    /// Prints a summary of the effective settings with the password
    /// redacted. Returns exit code 0 if valid, non-zero if invalid.
    Check,
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate CLI argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        if let Commands::Send {
            title: Some(title), ..
        } = &self.command
            && title.contains('\n')
        {
            return Err("Title must be a single line".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
