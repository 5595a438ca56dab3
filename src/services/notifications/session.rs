//! One-shot delivery session.
//!
//! A [`DeliverySession`] owns one protocol connection for one message:
//!
//! ```text
//! Created -> Connecting -> Authenticated -> Sent -> Closed
//!                 |
//!                 +-> AuthFailed -> Closed
//! ```
//!
//! Every path out of `Connecting` tears the connection down before `run`
//! returns, and the only path that writes a message is the first
//! `Ready` signal received while `Connecting`.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, timeout};
use tracing::{Instrument, debug, field, info, info_span, warn};
use uuid::Uuid;

use crate::config::XmppSettings;
use crate::error::DeliveryError;
use crate::xmpp::{ChatMessage, CloseMode, Jid, ProtocolClient, SessionSignal, XmppError};

/// Lifecycle of a delivery session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Connecting,
    Authenticated,
    Sent,
    AuthFailed,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Connecting => "connecting",
            SessionState::Authenticated => "authenticated",
            SessionState::Sent => "sent",
            SessionState::AuthFailed => "auth_failed",
            SessionState::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time bounds and optional steps of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Bound on connect, TLS and authentication together
    pub connect_timeout: Duration,
    /// Bound on the best-effort roster fetch
    pub roster_timeout: Duration,
    /// How long a graceful close waits for the server
    pub disconnect_timeout: Duration,
    pub fetch_roster: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            roster_timeout: Duration::from_secs(5),
            disconnect_timeout: Duration::from_secs(5),
            fetch_roster: true,
        }
    }
}

impl From<&XmppSettings> for SessionOptions {
    fn from(settings: &XmppSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            roster_timeout: settings.roster_timeout(),
            disconnect_timeout: settings.disconnect_timeout(),
            fetch_roster: settings.fetch_roster,
        }
    }
}

/// Outcome of a session that delivered its message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub session_id: Uuid,
    pub recipient: String,
    pub final_state: SessionState,
    pub messages_sent: u32,
    pub duration_ms: u64,
}

/// A single-use session delivering one message over one connection.
///
/// `run` consumes the session, so a finished session cannot be driven again.
pub struct DeliverySession<C> {
    id: Uuid,
    client: C,
    recipient: Jid,
    payload: String,
    options: SessionOptions,
    state: SessionState,
    messages_sent: u32,
}

impl<C> fmt::Debug for DeliverySession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliverySession")
            .field("id", &self.id)
            .field("recipient", &self.recipient)
            .field("state", &self.state)
            .field("messages_sent", &self.messages_sent)
            .finish_non_exhaustive()
    }
}

impl<C: ProtocolClient> DeliverySession<C> {
    /// Builds a session around an unconnected client; performs no I/O
    pub fn new(client: C, recipient: Jid, payload: String, options: SessionOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            recipient,
            payload,
            options,
            state: SessionState::Created,
            messages_sent: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the session to `Closed`
    ///
    /// Returns once the connection has been torn down, whatever the outcome.
    pub async fn run(mut self) -> Result<DeliveryReport, DeliveryError> {
        let span = info_span!(
            "delivery",
            session_id = %self.id,
            recipient = %self.recipient,
            final_state = field::Empty,
        );
        let started = Instant::now();

        let result = async {
            let signal = self.establish().await?;
            self.handle_signal(signal).await
        }
        .instrument(span.clone())
        .await;

        span.record("final_state", self.state.as_str());
        let duration_ms = started.elapsed().as_millis() as u64;

        result.map(|()| DeliveryReport {
            session_id: self.id,
            recipient: self.recipient.to_string(),
            final_state: self.state,
            messages_sent: self.messages_sent,
            duration_ms,
        })
    }

    /// Connects and authenticates, bounded by the connect timeout
    async fn establish(&mut self) -> Result<SessionSignal, DeliveryError> {
        self.transition(SessionState::Connecting);

        let after = self.options.connect_timeout;
        match timeout(after, self.client.establish()).await {
            Ok(Ok(signal)) => Ok(signal),
            Ok(Err(e)) => {
                warn!(error = %e, "connection failed");
                self.teardown(CloseMode::Abort).await;
                Err(DeliveryError::from(e))
            }
            Err(_) => {
                warn!(timeout_secs = after.as_secs(), "connection timed out");
                self.teardown(CloseMode::Abort).await;
                Err(DeliveryError::Timeout {
                    phase: "connect",
                    after,
                })
            }
        }
    }

    /// Applies a signal from the protocol layer
    ///
    /// Only the first signal received while connecting has an effect; any
    /// later or repeated signal is ignored.
    pub(crate) async fn handle_signal(
        &mut self,
        signal: SessionSignal,
    ) -> Result<(), DeliveryError> {
        if self.state != SessionState::Connecting {
            debug!(state = %self.state, ?signal, "ignoring signal");
            return Ok(());
        }

        match signal {
            SessionSignal::Ready { bound_jid } => {
                self.transition(SessionState::Authenticated);
                debug!(jid = %bound_jid, "authenticated");
                self.deliver().await
            }
            SessionSignal::AuthFailed { condition } => {
                self.transition(SessionState::AuthFailed);
                warn!(%condition, "authentication rejected");
                self.teardown(CloseMode::Graceful(self.options.disconnect_timeout))
                    .await;
                Err(DeliveryError::Authentication { condition })
            }
        }
    }

    async fn deliver(&mut self) -> Result<(), DeliveryError> {
        if let Err(e) = self.client.send_presence().await {
            return Err(self.abort(e).await);
        }

        if self.options.fetch_roster {
            self.resolve_roster().await;
        }

        let message = ChatMessage {
            to: self.recipient.clone(),
            body: std::mem::take(&mut self.payload),
        };
        if let Err(e) = self.client.send_message(&message).await {
            return Err(self.abort(e).await);
        }
        self.messages_sent += 1;
        self.transition(SessionState::Sent);
        info!("message sent");

        self.teardown(CloseMode::Graceful(self.options.disconnect_timeout))
            .await;
        Ok(())
    }

    /// Best-effort; failures never block the send
    async fn resolve_roster(&mut self) {
        match timeout(self.options.roster_timeout, self.client.fetch_roster()).await {
            Ok(Ok(contacts)) => {
                let listed = contacts
                    .iter()
                    .any(|jid| jid.to_bare() == self.recipient.to_bare());
                debug!(contacts = contacts.len(), recipient_listed = listed, "roster received");
            }
            Ok(Err(e)) => warn!(error = %e, "roster fetch failed"),
            Err(_) => warn!(
                timeout_secs = self.options.roster_timeout.as_secs(),
                "roster fetch timed out"
            ),
        }
    }

    async fn abort(&mut self, error: XmppError) -> DeliveryError {
        warn!(error = %error, state = %self.state, "session aborted");
        self.teardown(CloseMode::Abort).await;
        DeliveryError::from(error)
    }

    /// Releases the connection and moves to `Closed`; safe to call twice
    async fn teardown(&mut self, mode: CloseMode) {
        if self.state.is_terminal() {
            return;
        }

        // The graceful wait is bounded by the client; this bounds the TLS shutdown too
        let bound = self.options.disconnect_timeout.saturating_mul(2);
        match timeout(bound, self.client.disconnect(mode)).await {
            Ok(Ok(())) => debug!(?mode, "disconnected"),
            Ok(Err(e)) => debug!(error = %e, "disconnect reported an error"),
            Err(_) => debug!("disconnect timed out; dropping connection"),
        }
        self.transition(SessionState::Closed);
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "session state");
        self.state = next;
    }
}
