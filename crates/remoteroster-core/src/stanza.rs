//! Stanza envelope.

use crate::error::XmlError;
use crate::jid::Jid;
use crate::ns;
use crate::xml::Element;
use std::fmt;

/// Top-level stanza kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StanzaKind {
    Iq,
    Message,
    Presence,
    /// Anything else on the stream.
    Other,
}

/// Info/query stanza type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IqType {
    Get,
    Set,
    Result,
    Error,
}

impl IqType {
    /// Wire value of the `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Result => "result",
            Self::Error => "error",
        }
    }

    /// Parse the `type` attribute.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "get" => Some(Self::Get),
            "set" => Some(Self::Set),
            "result" => Some(Self::Result),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for IqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One protocol stanza.
///
/// Addresses are read from the root element on demand, so mutating the
/// payload never leaves them stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    root: Element,
}

impl Stanza {
    /// Wrap a parsed root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a stanza from XML text.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        Element::parse(input).map(Self::new)
    }

    /// Build an info/query stanza in the client namespace.
    pub fn iq(iq_type: IqType, from: Option<&Jid>, to: Option<&Jid>) -> Self {
        let mut root = Element::new("iq", ns::JABBER_CLIENT).with_attr("type", iq_type.as_str());
        if let Some(from) = from {
            root.set_attr("from", from.to_string());
        }
        if let Some(to) = to {
            root.set_attr("to", to.to_string());
        }
        Self { root }
    }

    /// Builder-style id setter.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.root.set_attr("id", id);
        self
    }

    /// Builder-style payload setter.
    pub fn with_payload(mut self, payload: Element) -> Self {
        self.root.append_child(payload);
        self
    }

    /// Stanza kind from the root element name.
    pub fn kind(&self) -> StanzaKind {
        match self.root.name() {
            "iq" => StanzaKind::Iq,
            "message" => StanzaKind::Message,
            "presence" => StanzaKind::Presence,
            _ => StanzaKind::Other,
        }
    }

    /// Info/query type, when this is an `iq` with a known type.
    pub fn iq_type(&self) -> Option<IqType> {
        if self.kind() != StanzaKind::Iq {
            return None;
        }
        self.root.attr("type").and_then(IqType::parse)
    }

    /// Sender address. Absent or unparsable addresses read as `None`.
    pub fn sender(&self) -> Option<Jid> {
        self.root.attr("from").and_then(|s| Jid::parse(s).ok())
    }

    /// Recipient address. Absent or unparsable addresses read as `None`.
    pub fn recipient(&self) -> Option<Jid> {
        self.root.attr("to").and_then(|s| Jid::parse(s).ok())
    }

    /// Stanza id.
    pub fn id(&self) -> Option<&str> {
        self.root.attr("id")
    }

    /// The root element.
    pub fn element(&self) -> &Element {
        &self.root
    }

    /// First child element.
    pub fn payload(&self) -> Option<&Element> {
        self.root.children().next()
    }

    /// Mutable first child element.
    pub fn payload_mut(&mut self) -> Option<&mut Element> {
        self.root.children_mut().next()
    }

    /// Build the result answering this request: addresses swapped, same id,
    /// no payload.
    pub fn result_for(request: &Stanza) -> Stanza {
        let mut root = Element::new("iq", request.root.ns()).with_attr("type", "result");
        if let Some(id) = request.id() {
            root.set_attr("id", id);
        }
        if let Some(to) = request.root.attr("to") {
            root.set_attr("from", to);
        }
        if let Some(from) = request.root.attr("from") {
            root.set_attr("to", from);
        }
        Stanza { root }
    }

    /// Serialize to XML text.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        crate::xml::to_xml(&self.root)
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

impl From<Element> for Stanza {
    fn from(root: Element) -> Self {
        Self::new(root)
    }
}
