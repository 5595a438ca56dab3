//! Configuration validation logic
//!
//! Every rule reports the dotted key it concerns so the operator can find
//! the offending line in the TOML files or the matching environment variable.

use crate::config::error::ConfigError;
use crate::config::settings::{FileSettings, LoggerSettings, Settings, XmppSettings};
use crate::xmpp::Jid;

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Returns the value when present and not blank
fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ConfigError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::missing(field)),
    }
}

impl XmppSettings {
    /// Validate the account and session configuration
    ///
    /// # Validation Rules
    /// - `sender`, `password` and `recipient` must be present and non-empty
    /// - `sender` and `recipient` must be valid Jabber addresses
    /// - `resource` must not be empty
    /// - Port, timeouts and the concurrency cap must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sender = required(&self.sender, "xmpp.sender")?;
        required(&self.password, "xmpp.password")?;
        let recipient = required(&self.recipient, "xmpp.recipient")?;

        let sender_jid = Jid::parse(sender)
            .map_err(|e| ConfigError::invalid_value("xmpp.sender", e.to_string()))?;
        if sender_jid.node().is_none() {
            return Err(ConfigError::invalid_value(
                "xmpp.sender",
                "Sender must be an account address of the form user@domain.",
            ));
        }

        Jid::parse(recipient)
            .map_err(|e| ConfigError::invalid_value("xmpp.recipient", e.to_string()))?;

        if self.resource.trim().is_empty() {
            return Err(ConfigError::missing("xmpp.resource"));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "xmpp.port",
                "Port must be between 1 and 65535.",
            ));
        }

        if self.server.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::validation(
                "xmpp.server",
                "Server override must not be empty; remove the key to use the sender's domain.",
            ));
        }

        let timeouts = [
            ("xmpp.connect_timeout", self.connect_timeout),
            ("xmpp.disconnect_timeout", self.disconnect_timeout),
            ("xmpp.roster_timeout", self.roster_timeout),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::validation(
                    field,
                    "Timeout must be greater than 0 seconds.",
                ));
            }
        }

        if self.max_concurrent_sessions == 0 {
            return Err(ConfigError::validation(
                "xmpp.max_concurrent_sessions",
                "At least one concurrent session must be allowed.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        self.parse_format()?;
        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - At least one of console and file output must be enabled
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate all configuration settings, returning the first error found
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.xmpp.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_xmpp() -> XmppSettings {
        XmppSettings {
            sender: Some("bot@example.com".to_string()),
            password: Some("secret".to_string()),
            recipient: Some("alice@example.com".to_string()),
            ..Default::default()
        }
    }

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } | ConfigError::InvalidValue { field, .. } => {
                field
            }
            other => panic!("Expected a field error, got {:?}", other),
        }
    }

    #[test]
    fn test_xmpp_settings_valid() {
        assert!(valid_xmpp().validate().is_ok());
    }

    #[test]
    fn test_xmpp_settings_default_is_missing_sender() {
        let err = XmppSettings::default().validate().unwrap_err();
        assert_eq!(field_of(err), "xmpp.sender");
    }

    #[test]
    fn test_blank_password_is_missing() {
        let xmpp = XmppSettings {
            password: Some("   ".to_string()),
            ..valid_xmpp()
        };
        assert_eq!(field_of(xmpp.validate().unwrap_err()), "xmpp.password");
    }

    #[test]
    fn test_sender_without_node_rejected() {
        let xmpp = XmppSettings {
            sender: Some("example.com".to_string()),
            ..valid_xmpp()
        };
        assert_eq!(field_of(xmpp.validate().unwrap_err()), "xmpp.sender");
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let xmpp = XmppSettings {
            recipient: Some("alice@".to_string()),
            ..valid_xmpp()
        };
        assert_eq!(field_of(xmpp.validate().unwrap_err()), "xmpp.recipient");
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let xmpp = XmppSettings {
            connect_timeout: 0,
            ..valid_xmpp()
        };
        assert_eq!(field_of(xmpp.validate().unwrap_err()), "xmpp.connect_timeout");

        let xmpp = XmppSettings {
            roster_timeout: 0,
            ..valid_xmpp()
        };
        assert_eq!(field_of(xmpp.validate().unwrap_err()), "xmpp.roster_timeout");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let xmpp = XmppSettings {
            max_concurrent_sessions: 0,
            ..valid_xmpp()
        };
        assert_eq!(
            field_of(xmpp.validate().unwrap_err()),
            "xmpp.max_concurrent_sessions"
        );
    }

    #[test]
    fn test_empty_server_override_rejected() {
        let xmpp = XmppSettings {
            server: Some(String::new()),
            ..valid_xmpp()
        };
        assert_eq!(field_of(xmpp.validate().unwrap_err()), "xmpp.server");
    }

    #[test]
    fn test_logger_invalid_level() {
        let logger = LoggerSettings {
            level: "verbose".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(logger.validate().unwrap_err()), "logger.level");
    }

    #[test]
    fn test_logger_requires_an_output() {
        let mut logger = LoggerSettings::default();
        logger.console.enabled = false;
        assert_eq!(field_of(logger.validate().unwrap_err()), "logger");
    }

    #[test]
    fn test_logger_file_enabled_requires_path() {
        let mut logger = LoggerSettings::default();
        logger.file.enabled = true;
        logger.file.path = " ".to_string();
        assert_eq!(field_of(logger.validate().unwrap_err()), "logger.file.path");
    }

    #[test]
    fn test_settings_validate_checks_xmpp_first() {
        let settings = Settings::default();
        assert_eq!(field_of(settings.validate().unwrap_err()), "xmpp.sender");
    }

    proptest! {
        /// Removing any subset of credential keys reports the first missing key
        #[test]
        fn property_missing_credentials_are_reported(
            drop_sender in any::<bool>(),
            drop_password in any::<bool>(),
            drop_recipient in any::<bool>(),
            blank in any::<bool>(),
        ) {
            prop_assume!(drop_sender || drop_password || drop_recipient);

            let gone = || if blank { Some(String::new()) } else { None };
            let mut xmpp = valid_xmpp();
            if drop_sender { xmpp.sender = gone(); }
            if drop_password { xmpp.password = gone(); }
            if drop_recipient { xmpp.recipient = gone(); }

            let expected = if drop_sender {
                "xmpp.sender"
            } else if drop_password {
                "xmpp.password"
            } else {
                "xmpp.recipient"
            };

            let err = xmpp.validate().unwrap_err();
            prop_assert_eq!(err.field(), Some(expected));
        }
    }
}
