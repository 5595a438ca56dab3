//! Service layer.
//!
//! Services hold configured backends and expose the operations the host
//! calls; the binary and library users share them.

pub mod notifications;

pub use notifications::{NotificationProvider, XmppNotificationService};
