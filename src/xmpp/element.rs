/// An owned XML element received from the server.
///
/// Names are local names (prefix stripped); attribute keys are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Name of the first child, which carries the condition in SASL
    /// failures and stream errors
    pub fn condition(&self) -> String {
        self.children
            .iter()
            .find(|c| c.name != "text")
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "undefined-condition".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_skips_text() {
        let failure = Element::new("failure")
            .with_child(Element::new("text"))
            .with_child(Element::new("not-authorized"));
        assert_eq!(failure.condition(), "not-authorized");
        assert_eq!(Element::new("failure").condition(), "undefined-condition");
    }

    #[test]
    fn test_attr_lookup() {
        let iq = Element::new("iq").with_attr("type", "result").with_attr("id", "b1");
        assert_eq!(iq.attr("type"), Some("result"));
        assert_eq!(iq.attr("to"), None);
    }
}
