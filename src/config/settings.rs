//! Configuration settings structures for xmpp-notify
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "xmpp-notify".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_resource() -> String {
    crate::xmpp::DEFAULT_RESOURCE.to_string()
}

fn default_port() -> u16 {
    crate::xmpp::DEFAULT_PORT
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_disconnect_timeout() -> u64 {
    5
}

fn default_roster_timeout() -> u64 {
    5
}

fn default_max_concurrent_sessions() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/xmpp-notify.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// XMPP Configuration
// ============================================================================

/// Jabber account and delivery session configuration
///
/// The three credential keys are optional here so that an absent key is
/// reported by validation with its name, rather than as a parse failure.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmppSettings {
    /// Sending account, e.g. `bot@example.com`
    #[serde(default)]
    pub sender: Option<String>,

    /// Password of the sending account
    #[serde(default)]
    pub password: Option<String>,

    /// Address that receives every notification
    #[serde(default)]
    pub recipient: Option<String>,

    /// Resource appended to the sender for each session
    #[serde(default = "default_resource")]
    pub resource: String,

    /// Server host to connect to instead of the sender's domain
    #[serde(default)]
    pub server: Option<String>,

    /// Client-to-server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound in seconds on connecting and authenticating
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Upper bound in seconds on waiting for the server to close the stream
    #[serde(default = "default_disconnect_timeout")]
    pub disconnect_timeout: u64,

    /// Upper bound in seconds on the best-effort roster fetch
    #[serde(default = "default_roster_timeout")]
    pub roster_timeout: u64,

    /// Whether to fetch the roster before sending
    #[serde(default = "default_true")]
    pub fetch_roster: bool,

    /// Maximum number of sessions open at the same time
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,
}

impl XmppSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_secs(self.disconnect_timeout)
    }

    pub fn roster_timeout(&self) -> Duration {
        Duration::from_secs(self.roster_timeout)
    }
}

impl Default for XmppSettings {
    fn default() -> Self {
        Self {
            sender: None,
            password: None,
            recipient: None,
            resource: default_resource(),
            server: None,
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            disconnect_timeout: default_disconnect_timeout(),
            roster_timeout: default_roster_timeout(),
            fetch_roster: default_true(),
            max_concurrent_sessions: default_max_concurrent_sessions(),
        }
    }
}

impl std::fmt::Debug for XmppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmppSettings")
            .field("sender", &self.sender)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("recipient", &self.recipient)
            .field("resource", &self.resource)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .field("disconnect_timeout", &self.disconnect_timeout)
            .field("roster_timeout", &self.roster_timeout)
            .field("fetch_roster", &self.fetch_roster)
            .field("max_concurrent_sessions", &self.max_concurrent_sessions)
            .finish()
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::ValidationError {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self.parse_format()?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format).map_err(
            |e| ConfigError::ValidationError {
                field: "logger.file".to_string(),
                message: e.to_string(),
            },
        )
    }

    /// Parse the format string into LogFormat enum
    pub(crate) fn parse_format(&self) -> Result<LogFormat, ConfigError> {
        self.format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })
    }
}

// ============================================================================
// Root Settings
// ============================================================================

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Jabber account and session configuration
    #[serde(default)]
    pub xmpp: XmppSettings,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xmpp_defaults() {
        let xmpp = XmppSettings::default();
        assert_eq!(xmpp.resource, "home-assistant");
        assert_eq!(xmpp.port, 5222);
        assert_eq!(xmpp.connect_timeout(), Duration::from_secs(30));
        assert!(xmpp.fetch_roster);
        assert!(xmpp.sender.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let xmpp = XmppSettings {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", xmpp);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[xmpp]\nsender = \"bot@example.com\"\nconnect_timeout = 10\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.xmpp.sender.as_deref(), Some("bot@example.com"));
        assert_eq!(settings.xmpp.connect_timeout, 10);
        assert_eq!(settings.xmpp.resource, "home-assistant");
        assert_eq!(settings.logger.level, "info");
        assert_eq!(settings.application.name, "xmpp-notify");
    }

    #[test]
    fn test_logger_settings_into_config() {
        let config = LoggerSettings::default().into_logger_config().unwrap();
        assert_eq!(config.level, "info");
        assert!(config.console.enabled);
        assert_eq!(config.file.format, LogFormat::Json);
    }

    #[test]
    fn test_logger_settings_invalid_format() {
        let mut settings = LoggerSettings::default();
        settings.file.format = "xml".to_string();
        let err = settings.into_logger_config().unwrap_err();
        assert_eq!(err.field(), Some("logger.file.format"));
    }
}
