use thiserror::Error;

/// Errors raised by the protocol client
#[derive(Error, Debug)]
pub enum XmppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid address '{address}': {reason}")]
    InvalidJid { address: String, reason: &'static str },

    #[error("could not resolve server: {0}")]
    Resolve(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The server ended the stream with `<stream:error>`
    #[error("stream error: {condition}")]
    Stream { condition: String },

    #[error("stream closed by server")]
    Closed,

    #[error("not connected")]
    NotConnected,
}

impl XmppError {
    pub(crate) fn xml(error: impl std::fmt::Display) -> Self {
        Self::Xml(error.to_string())
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}
