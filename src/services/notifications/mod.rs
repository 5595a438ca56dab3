//! Notification delivery over Jabber (XMPP).
//!
//! [`XmppNotificationService`] is the entry point the host calls once per
//! event. It formats the payload and runs a single-use
//! [`DeliverySession`] that connects, sends one message and disconnects.
//! The service also implements the host's [`NotificationProvider`] trait so
//! it can be registered next to other backends.

mod provider;
mod session;
mod xmpp_provider;

#[cfg(test)]
pub(crate) mod testing;

pub use provider::{NotificationMessage, NotificationProvider, NotificationResult};
pub use session::{DeliveryReport, DeliverySession, SessionOptions, SessionState};
pub use xmpp_provider::{Credentials, DEFAULT_MAX_CONCURRENT_SESSIONS, XmppNotificationService};
