//! Core notification provider trait and types.
//!
//! The host's notification registry talks to every backend through
//! [`NotificationProvider`], so the Jabber backend can sit next to others
//! with the same shape.

use crate::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message to be sent via notification provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Message title/subject (optional; prepended to the body)
    pub title: Option<String>,
    /// Message body/content (may be empty)
    pub body: String,
}

impl NotificationMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: body.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Result of a notification send attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    /// Whether send was successful
    pub success: bool,
    /// Error message when the send failed
    pub response: Option<String>,
    /// Time taken for the operation in milliseconds
    pub duration_ms: u64,
}

/// Trait for notification providers
///
/// Uses `async_trait` to support async methods with dynamic dispatch.
/// All providers must be Send + Sync for use in async contexts.
///
/// # Example Implementation
/// ```ignore
/// use async_trait::async_trait;
///
/// pub struct LogProvider;
///
/// #[async_trait]
/// impl NotificationProvider for LogProvider {
///     async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
///         tracing::info!(body = %message.body, "notification");
///         Ok(NotificationResult { success: true, response: None, duration_ms: 0 })
///     }
///
///     fn name(&self) -> &'static str {
///         "log"
///     }
/// }
/// ```
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Sends a notification message
    ///
    /// Delivery failures are reported in the returned [`NotificationResult`];
    /// an `Err` means the provider itself could not attempt the send.
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult>;

    /// Returns the provider name for logging/debugging
    fn name(&self) -> &'static str;

    /// Validates provider configuration (optional, default no-op)
    async fn validate_config(&self) -> AppResult<()> {
        Ok(())
    }
}
