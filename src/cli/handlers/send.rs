//! Send command handler
//!
//! Delivers one notification using the merged configuration.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::services::notifications::{DeliveryReport, XmppNotificationService};

/// Handler for the send command
pub struct SendCommandHandler {
    config: Settings,
}

impl SendCommandHandler {
    /// Create a new send command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the send command
    ///
    /// # Errors
    /// - Configuration errors if the account settings are incomplete
    /// - `DeliveryFailed` if the message could not be delivered
    pub async fn execute(&self, message: &str, title: Option<&str>) -> AppResult<DeliveryReport> {
        let service = XmppNotificationService::from_settings(&self.config.xmpp)?;

        let report = service.send_message(message, title).await?;
        println!(
            "✓ Delivered to {} in {} ms (session {})",
            report.recipient, report.duration_ms, report.session_id
        );

        Ok(report)
    }
}
