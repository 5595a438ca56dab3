//! The seam between the delivery session and the wire protocol.

use std::time::Duration;

use async_trait::async_trait;

use super::{ConnectOptions, Jid, XmppClient, XmppError};

/// Outcome of session establishment, reported exactly once per connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// Authenticated and bound; stanzas may now be sent
    Ready { bound_jid: Jid },
    /// The server rejected the credentials
    AuthFailed { condition: String },
}

/// A one-to-one `chat` message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub to: Jid,
    pub body: String,
}

/// How to end a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Send the closing tag and wait up to the given time for the server's
    Graceful(Duration),
    /// Send the closing tag and drop the transport immediately
    Abort,
}

/// Client side of one protocol connection.
///
/// Implementations own their transport exclusively. `disconnect` must be
/// safe to call in any state, including before or after a failed
/// `establish`, and more than once.
#[async_trait]
pub trait ProtocolClient: Send {
    /// Connects, secures and authenticates the connection
    ///
    /// Resolves once authentication has either produced a usable session or
    /// been rejected. Any other failure is an error.
    async fn establish(&mut self) -> Result<SessionSignal, XmppError>;

    /// Announces availability
    async fn send_presence(&mut self) -> Result<(), XmppError>;

    /// Fetches the contact list
    async fn fetch_roster(&mut self) -> Result<Vec<Jid>, XmppError>;

    async fn send_message(&mut self, message: &ChatMessage) -> Result<(), XmppError>;

    async fn disconnect(&mut self, mode: CloseMode) -> Result<(), XmppError>;
}

/// Creates one protocol client per delivery session
pub trait Connector: Send + Sync {
    type Client: ProtocolClient + 'static;

    /// Builds an unconnected client for `jid`; performs no I/O
    fn client(&self, jid: Jid, password: &str) -> Self::Client;
}

/// Connector producing real network clients
#[derive(Debug, Clone, Default)]
pub struct XmppConnector {
    options: ConnectOptions,
}

impl XmppConnector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }
}

impl Connector for XmppConnector {
    type Client = XmppClient;

    fn client(&self, jid: Jid, password: &str) -> XmppClient {
        XmppClient::new(jid, password, self.options.clone())
    }
}
