//! Minimal Jabber (XMPP) client for one-shot sends.
//!
//! Only the client-to-server subset needed to deliver a single message is
//! implemented: STARTTLS, SASL PLAIN, resource binding, presence, roster
//! fetch, a `chat` message and stream close. The delivery session talks to
//! it through [`ProtocolClient`], so the state machine never sees XML.

mod client;
mod element;
mod error;
mod jid;
mod protocol;
pub mod stanza;
mod stream;

pub use client::{ConnectOptions, XmppClient};
pub use element::Element;
pub use error::XmppError;
pub use jid::Jid;
pub use protocol::{ChatMessage, CloseMode, Connector, ProtocolClient, SessionSignal, XmppConnector};
pub use stream::{StreamEvent, XmlStream};

/// Resource appended to the sender for every session
pub const DEFAULT_RESOURCE: &str = "home-assistant";

/// Standard client-to-server port
pub const DEFAULT_PORT: u16 = 5222;

pub mod ns {
    pub const CLIENT: &str = "jabber:client";
    pub const STREAM: &str = "http://etherx.jabber.org/streams";
    pub const TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";
    pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
    pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";
    pub const SESSION: &str = "urn:ietf:params:xml:ns:xmpp-session";
    pub const ROSTER: &str = "jabber:iq:roster";
}
