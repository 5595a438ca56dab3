//! xmpp-notify library
//!
//! One-shot Jabber (XMPP) notification delivery: a notification service
//! the host calls once per event, which runs a single-use delivery session
//! per message.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod services;
pub mod xmpp;

pub use error::{AppError, AppResult, DeliveryError};
pub use services::notifications::{Credentials, NotificationMessage, XmppNotificationService};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
