//! Namespace-aware XML element tree.
//!
//! Stanzas are parsed into an owned [`Element`] tree where every element
//! carries its resolved namespace URI. Prefixes are not retained; the writer
//! re-emits default namespace declarations wherever the namespace changes.

mod parser;
mod query;
mod writer;

pub use parser::parse;
pub use query::{NamespaceTable, Query, DISCO_NAMESPACES, ROSTER_NAMESPACES};
pub use writer::to_xml;

use std::fmt;

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Child element.
    Element(Element),
    /// Character data, unescaped.
    Text(String),
}

/// An XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    ns: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element in the given namespace.
    pub fn new(name: impl Into<String>, ns: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ns: ns.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text appender.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.append_text(text);
        self
    }

    /// Parse an element from XML text.
    pub fn parse(input: &str) -> Result<Self, crate::XmlError> {
        parse(input)
    }

    /// Local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI (empty when unqualified).
    pub fn ns(&self) -> &str {
        &self.ns
    }

    /// Check local name and namespace together.
    pub fn is(&self, name: &str, ns: &str) -> bool {
        self.name == name && self.ns == ns
    }

    /// Attribute value by name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(idx).1)
    }

    /// All child nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Mutable child elements in document order.
    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child with the given name and namespace.
    pub fn get_child(&self, name: &str, ns: &str) -> Option<&Element> {
        self.children().find(|c| c.is(name, ns))
    }

    /// Whether a child with the given name and namespace exists.
    pub fn has_child(&self, name: &str, ns: &str) -> bool {
        self.get_child(name, ns).is_some()
    }

    /// Append a child element and return a reference to it.
    pub fn append_child(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!("just pushed an element"),
        }
    }

    /// Append character data, merging with a trailing text node.
    pub fn append_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Node::Text(text));
        }
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// This element followed by all descendant elements, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = to_xml(self).map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

/// Pre-order iterator over an element and its descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        // Reverse so the first child is visited first.
        let children: Vec<&Element> = next.children().collect();
        self.stack.extend(children.into_iter().rev());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let item = Element::new("item", "jabber:iq:roster")
            .with_attr("jid", "a@gw")
            .with_child(Element::new("group", "jabber:iq:roster").with_text("Friends"));

        assert!(item.is("item", "jabber:iq:roster"));
        assert_eq!(item.attr("jid"), Some("a@gw"));
        assert_eq!(
            item.get_child("group", "jabber:iq:roster").map(|g| g.text()),
            Some("Friends".to_string())
        );
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut el = Element::new("x", "").with_attr("a", "1");
        el.set_attr("a", "2");
        assert_eq!(el.attrs().count(), 1);
        assert_eq!(el.attr("a"), Some("2"));
        assert_eq!(el.remove_attr("a"), Some("2".to_string()));
        assert!(el.attr("a").is_none());
    }

    #[test]
    fn test_descendants_document_order() {
        let tree = Element::new("a", "")
            .with_child(Element::new("b", "").with_child(Element::new("c", "")))
            .with_child(Element::new("d", ""));

        let names: Vec<&str> = tree.descendants().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_append_text_merges() {
        let mut el = Element::new("body", "");
        el.append_text("hello ");
        el.append_text("world");
        assert_eq!(el.nodes().len(), 1);
        assert_eq!(el.text(), "hello world");
    }
}
