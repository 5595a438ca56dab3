use crate::xmpp::XmppError;
use std::time::Duration;
use thiserror::Error;

/// Why a single delivery session ended without sending its message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Network, name resolution, TLS or stream failure
    #[error("connection error: {reason}")]
    Connection { reason: String },

    /// The server rejected the credentials
    #[error("authentication rejected: {condition}")]
    Authentication { condition: String },

    /// A bounded phase of the session did not complete in time
    #[error("{phase} timed out after {}s", .after.as_secs())]
    Timeout {
        phase: &'static str,
        after: Duration,
    },
}

impl DeliveryError {
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Short label used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::Connection { .. } => "connection",
            DeliveryError::Authentication { .. } => "authentication",
            DeliveryError::Timeout { .. } => "timeout",
        }
    }
}

/// Everything the protocol client reports as an error is a connection
/// failure; rejected credentials arrive as a signal instead
impl From<XmppError> for DeliveryError {
    fn from(error: XmppError) -> Self {
        DeliveryError::connection(error.to_string())
    }
}
