use std::fmt;
use std::str::FromStr;

use super::XmppError;

const MAX_PART_LEN: usize = 1023;

/// A Jabber address: `[node@]domain[/resource]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Jid {
    node: Option<String>,
    domain: String,
    resource: Option<String>,
}

impl Jid {
    pub fn parse(address: &str) -> Result<Self, XmppError> {
        let invalid = |reason| XmppError::InvalidJid {
            address: address.to_string(),
            reason,
        };

        if address.is_empty() {
            return Err(invalid("address is empty"));
        }
        if address.chars().any(char::is_whitespace) {
            return Err(invalid("address contains whitespace"));
        }

        // The resource may itself contain '@' or '/', so split it off first
        let (bare, resource) = match address.split_once('/') {
            Some((bare, resource)) => (bare, Some(resource)),
            None => (address, None),
        };
        let (node, domain) = match bare.split_once('@') {
            Some((node, domain)) => (Some(node), domain),
            None => (None, bare),
        };
        // A trailing dot names the same domain; strip it before checking
        let domain = domain.trim_end_matches('.');

        if node.is_some_and(str::is_empty) {
            return Err(invalid("local part is empty"));
        }
        if domain.is_empty() {
            return Err(invalid("domain is empty"));
        }
        if domain.contains('@') {
            return Err(invalid("domain contains '@'"));
        }
        if resource.is_some_and(str::is_empty) {
            return Err(invalid("resource is empty"));
        }
        let parts = [node, Some(domain), resource];
        if parts.iter().flatten().any(|p| p.len() > MAX_PART_LEN) {
            return Err(invalid("part exceeds 1023 bytes"));
        }

        Ok(Self {
            node: node.map(str::to_string),
            domain: domain.to_lowercase(),
            resource: resource.map(str::to_string),
        })
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn is_bare(&self) -> bool {
        self.resource.is_none()
    }

    /// The address without its resource
    pub fn to_bare(&self) -> Jid {
        Jid {
            resource: None,
            ..self.clone()
        }
    }

    /// The bare address with `resource` attached, replacing any existing one
    pub fn with_resource(&self, resource: &str) -> Jid {
        Jid {
            resource: Some(resource.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(node) = &self.node {
            write!(f, "{}@", node)?;
        }
        f.write_str(&self.domain)?;
        if let Some(resource) = &self.resource {
            write!(f, "/{}", resource)?;
        }
        Ok(())
    }
}

impl FromStr for Jid {
    type Err = XmppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jid::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_jid() {
        let jid = Jid::parse("bot@Example.COM/home-assistant").unwrap();
        assert_eq!(jid.node(), Some("bot"));
        assert_eq!(jid.domain(), "example.com");
        assert_eq!(jid.resource(), Some("home-assistant"));
        assert_eq!(jid.to_string(), "bot@example.com/home-assistant");
    }

    #[test]
    fn test_parse_domain_only() {
        let jid = Jid::parse("example.com").unwrap();
        assert_eq!(jid.node(), None);
        assert!(jid.is_bare());
    }

    #[test]
    fn test_resource_may_contain_separators() {
        let jid = Jid::parse("bot@example.com/a@b/c").unwrap();
        assert_eq!(jid.resource(), Some("a@b/c"));
        assert_eq!(jid.domain(), "example.com");
    }

    #[test]
    fn test_with_resource_replaces_existing() {
        let jid = Jid::parse("bot@example.com/phone").unwrap();
        assert_eq!(
            jid.with_resource("home-assistant").to_string(),
            "bot@example.com/home-assistant"
        );
        assert_eq!(jid.to_bare().to_string(), "bot@example.com");
    }

    #[test]
    fn test_trailing_dot_is_stripped() {
        let jid = Jid::parse("bot@example.com.").unwrap();
        assert_eq!(jid.domain(), "example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        for address in [
            "",
            "@example.com",
            "bot@",
            "bot@.",
            ".",
            "bot@example.com/",
            "a b@c",
            "a@b@c",
        ] {
            assert!(
                matches!(Jid::parse(address), Err(XmppError::InvalidJid { .. })),
                "{:?} should be rejected",
                address
            );
        }
    }
}
