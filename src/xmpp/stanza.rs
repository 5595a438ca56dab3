//! Outbound XML fragments.
//!
//! Everything the client writes is built here so escaping happens in one place.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;

use super::{Jid, ns};

pub const STREAM_CLOSE: &str = "</stream:stream>";
pub const PRESENCE: &str = "<presence/>";

pub fn stream_header(domain: &str) -> String {
    format!(
        "<?xml version='1.0'?><stream:stream to='{}' version='1.0' xml:lang='en' xmlns='{}' xmlns:stream='{}'>",
        escape(domain),
        ns::CLIENT,
        ns::STREAM
    )
}

pub fn starttls() -> String {
    format!("<starttls xmlns='{}'/>", ns::TLS)
}

/// SASL PLAIN initial response: authzid empty, authcid and password
pub fn sasl_plain(username: &str, password: &str) -> String {
    let token = STANDARD.encode(format!("\0{}\0{}", username, password));
    format!(
        "<auth xmlns='{}' mechanism='PLAIN'>{}</auth>",
        ns::SASL,
        token
    )
}

pub fn bind_request(id: &str, resource: &str) -> String {
    format!(
        "<iq type='set' id='{}'><bind xmlns='{}'><resource>{}</resource></bind></iq>",
        escape(id),
        ns::BIND,
        escape(resource)
    )
}

pub fn session_request(id: &str) -> String {
    format!(
        "<iq type='set' id='{}'><session xmlns='{}'/></iq>",
        escape(id),
        ns::SESSION
    )
}

pub fn roster_request(id: &str) -> String {
    format!(
        "<iq type='get' id='{}'><query xmlns='{}'/></iq>",
        escape(id),
        ns::ROSTER
    )
}

pub fn chat_message(id: &str, from: &Jid, to: &Jid, body: &str) -> String {
    format!(
        "<message type='chat' id='{}' from='{}' to='{}'><body>{}</body></message>",
        escape(id),
        escape(&from.to_string()),
        escape(&to.to_string()),
        escape(body)
    )
}
