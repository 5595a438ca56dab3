//! Check command handler
//!
//! Validates the configuration and prints a summary without connecting.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::services::notifications::XmppNotificationService;
use crate::xmpp::ConnectOptions;

/// Handler for the check command
pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    /// Create a new check command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validate configuration and print a summary
    pub fn execute(&self) -> AppResult<()> {
        for line in self.summary()? {
            println!("{}", line);
        }
        println!("Configuration check completed successfully - ready to send");
        Ok(())
    }

    /// Summary lines; the password is never included
    pub fn summary(&self) -> AppResult<Vec<String>> {
        let xmpp = &self.config.xmpp;
        let service = XmppNotificationService::from_settings(xmpp)?;

        let options = ConnectOptions {
            server: xmpp.server.clone(),
            port: xmpp.port,
        };
        let (host, port) = options.target(service.credentials().sender().domain());

        Ok(vec![
            "✓ Configuration is valid".to_string(),
            format!("✓ Sender: {} (password set)", service.session_jid()),
            format!("✓ Recipient: {}", service.credentials().recipient()),
            format!("✓ Server: {}:{} (STARTTLS, IPv4)", host, port),
            format!(
                "✓ Timeouts: connect {}s, roster {}s, disconnect {}s",
                xmpp.connect_timeout, xmpp.roster_timeout, xmpp.disconnect_timeout
            ),
            format!(
                "✓ Concurrent sessions: up to {}",
                xmpp.max_concurrent_sessions
            ),
            format!("✓ Log level: {}", self.config.logger.level),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.xmpp.sender = Some("bot@example.com".to_string());
        settings.xmpp.password = Some("hunter2".to_string());
        settings.xmpp.recipient = Some("alice@example.com".to_string());
        settings
    }

    #[test]
    fn test_summary_redacts_password() {
        let summary = CheckCommandHandler::new(valid_settings()).summary().unwrap();
        let text = summary.join("\n");

        assert!(!text.contains("hunter2"));
        assert!(text.contains("bot@example.com/home-assistant"));
        assert!(text.contains("example.com:5222"));
    }

    #[test]
    fn test_summary_uses_server_override() {
        let mut settings = valid_settings();
        settings.xmpp.server = Some("xmpp.example.net:5223".to_string());

        let summary = CheckCommandHandler::new(settings).summary().unwrap();
        assert!(summary.iter().any(|l| l.contains("xmpp.example.net:5223")));
    }

    #[test]
    fn test_check_fails_on_missing_password() {
        let mut settings = valid_settings();
        settings.xmpp.password = None;

        assert!(CheckCommandHandler::new(settings).execute().is_err());
    }
}
