//! Jabber (XMPP) notification provider.
//!
//! [`XmppNotificationService`] holds the account credentials for the life
//! of the backend and runs one [`DeliverySession`] per notification. Each
//! session opens its own connection, so concurrent sends share nothing
//! but the read-only credentials and the concurrency cap.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use super::session::{DeliveryReport, DeliverySession, SessionOptions};
use crate::config::XmppSettings;
use crate::error::{AppError, AppResult};
use crate::xmpp::{ConnectOptions, Connector, DEFAULT_RESOURCE, Jid, XmppConnector};

/// Account used to send and the address notifications go to
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    sender: Jid,
    password: String,
    recipient: Jid,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl Credentials {
    /// Fails with a configuration error naming the first empty field, or a
    /// validation error for an address that does not parse
    pub fn new(sender: &str, password: &str, recipient: &str) -> AppResult<Self> {
        let sender = sender.trim();
        let recipient = recipient.trim();

        if sender.is_empty() {
            return Err(AppError::missing_key("sender"));
        }
        if password.is_empty() {
            return Err(AppError::missing_key("password"));
        }
        if recipient.is_empty() {
            return Err(AppError::missing_key("recipient"));
        }

        let sender_jid = parse_address("sender", sender)?;
        if sender_jid.node().is_none() {
            return Err(AppError::Validation {
                field: "sender".to_string(),
                reason: "sender must be an account address of the form user@domain".to_string(),
            });
        }

        Ok(Self {
            sender: sender_jid,
            password: password.to_string(),
            recipient: parse_address("recipient", recipient)?,
        })
    }

    pub fn sender(&self) -> &Jid {
        &self.sender
    }

    pub fn recipient(&self) -> &Jid {
        &self.recipient
    }
}

fn parse_address(field: &str, address: &str) -> AppResult<Jid> {
    Jid::parse(address).map_err(|e| AppError::Validation {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Notification backend delivering each message over a fresh Jabber session
///
/// # Example
/// ```ignore
/// let credentials = Credentials::new("bot@example.com", "secret", "alice@example.com")?;
/// let service = XmppNotificationService::new(credentials);
/// service.send_message("Back door opened", Some("Security")).await?;
/// ```
pub struct XmppNotificationService<K = XmppConnector> {
    credentials: Credentials,
    resource: String,
    connector: K,
    options: SessionOptions,
    permits: Arc<Semaphore>,
}

impl<K> fmt::Debug for XmppNotificationService<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmppNotificationService")
            .field("credentials", &self.credentials)
            .field("resource", &self.resource)
            .field("options", &self.options)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

/// Default cap on sessions running at once
pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 4;

impl XmppNotificationService {
    /// Creates a service connecting to the sender's domain with default options
    pub fn new(credentials: Credentials) -> Self {
        Self::with_connector(
            credentials,
            XmppConnector::default(),
            SessionOptions::default(),
            DEFAULT_MAX_CONCURRENT_SESSIONS,
        )
    }

    /// Builds the service from the `[xmpp]` configuration section
    ///
    /// Settings are validated first, so a missing key fails here and the
    /// service is never returned.
    pub fn from_settings(settings: &XmppSettings) -> AppResult<Self> {
        settings.validate()?;

        let credentials = Credentials::new(
            settings.sender.as_deref().unwrap_or_default(),
            settings.password.as_deref().unwrap_or_default(),
            settings.recipient.as_deref().unwrap_or_default(),
        )?;
        let connector = XmppConnector::new(ConnectOptions {
            server: settings.server.clone(),
            port: settings.port,
        });

        Ok(Self::with_connector(
            credentials,
            connector,
            SessionOptions::from(settings),
            settings.max_concurrent_sessions,
        )
        .with_resource(&settings.resource))
    }
}

impl<K: Connector> XmppNotificationService<K> {
    pub fn with_connector(
        credentials: Credentials,
        connector: K,
        options: SessionOptions,
        max_concurrent_sessions: usize,
    ) -> Self {
        Self {
            credentials,
            resource: DEFAULT_RESOURCE.to_string(),
            connector,
            options,
            permits: Arc::new(Semaphore::new(max_concurrent_sessions.max(1))),
        }
    }

    /// Replaces the resource appended to the sender
    pub fn with_resource(mut self, resource: &str) -> Self {
        if !resource.trim().is_empty() {
            self.resource = resource.trim().to_string();
        }
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Full address each session logs in as
    pub fn session_jid(&self) -> Jid {
        self.credentials.sender.with_resource(&self.resource)
    }

    /// `"{title}: {body}"` when a non-empty title is given, otherwise `body`
    pub fn format_payload(body: &str, title: Option<&str>) -> String {
        match title {
            Some(title) if !title.is_empty() => format!("{}: {}", title, body),
            _ => body.to_string(),
        }
    }

    /// Delivers one notification and waits until its session has closed
    ///
    /// Every failure is returned as [`AppError::DeliveryFailed`]; none
    /// panics, and no connection is left open.
    pub async fn send_message(&self, message: &str, title: Option<&str>) -> AppResult<DeliveryReport> {
        let payload = Self::format_payload(message, title);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal { source: e.into() })?;

        let client = self
            .connector
            .client(self.session_jid(), &self.credentials.password);
        let session = DeliverySession::new(
            client,
            self.credentials.recipient.clone(),
            payload,
            self.options,
        );

        match session.run().await {
            Ok(report) => {
                info!(
                    session_id = %report.session_id,
                    recipient = %report.recipient,
                    duration_ms = report.duration_ms,
                    "notification delivered"
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    recipient = %self.credentials.recipient,
                    kind = e.kind(),
                    error = %e,
                    "notification delivery failed"
                );
                Err(e.into())
            }
        }
    }

    /// Blocking variant of [`send_message`](Self::send_message) for hosts
    /// without an async runtime
    ///
    /// Runs the send on a private current-thread runtime. Calling it from
    /// inside a runtime returns an error instead of blocking that runtime.
    pub fn send_message_blocking(&self, message: &str, title: Option<&str>) -> AppResult<DeliveryReport> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(AppError::Internal {
                source: anyhow::anyhow!(
                    "send_message_blocking called from within an async runtime; use send_message"
                ),
            });
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppError::Internal { source: e.into() })?;

        runtime.block_on(self.send_message(message, title))
    }
}

#[async_trait]
impl<K: Connector> NotificationProvider for XmppNotificationService<K> {
    /// Failed deliveries come back as an unsuccessful result, not an error,
    /// so one bad send never disturbs the caller's loop
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let start = Instant::now();

        match self.send_message(&message.body, message.title.as_deref()).await {
            Ok(report) => Ok(NotificationResult {
                success: true,
                response: None,
                duration_ms: report.duration_ms,
            }),
            Err(e) if e.is_delivery_failure() => Ok(NotificationResult {
                success: false,
                response: Some(e.to_string()),
                duration_ms: start.elapsed().as_millis() as u64,
            }),
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &'static str {
        "xmpp"
    }

    /// Checks that the account and recipient still describe a sendable pair
    async fn validate_config(&self) -> AppResult<()> {
        if self.credentials.sender.to_bare() == self.credentials.recipient.to_bare() {
            warn!(address = %self.credentials.recipient, "sender and recipient are the same account");
        }
        if self.credentials.password.is_empty() {
            return Err(AppError::missing_key("password"));
        }
        Ok(())
    }
}
