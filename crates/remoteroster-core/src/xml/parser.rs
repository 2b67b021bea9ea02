//! Parsing stanza text into an element tree.

use super::Element;
use crate::error::XmlError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// Nesting limit for untrusted input.
const MAX_DEPTH: usize = 128;

/// Parse a single XML element (with any leading declaration or comments).
pub fn parse(input: &str) -> Result<Element, XmlError> {
    let mut reader = NsReader::from_str(input);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let ns = namespace_uri(resolved)?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(XmlError::TrailingContent);
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::malformed("element nesting too deep"));
                }
                stack.push(element_from_start(&start, ns)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(XmlError::TrailingContent);
                }
                let element = element_from_start(&start, ns)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::malformed("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                match stack.last_mut() {
                    Some(parent) => parent.append_text(text.into_owned()),
                    None if root.is_some() => return Err(XmlError::TrailingContent),
                    None => return Err(XmlError::malformed("text outside root element")),
                }
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| XmlError::malformed(e.to_string()))?
                    .to_string();
                match stack.last_mut() {
                    Some(parent) => parent.append_text(text),
                    None => return Err(XmlError::malformed("CDATA outside root element")),
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::malformed("unclosed element"));
    }
    root.ok_or(XmlError::Empty)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => {
            parent.append_child(element);
        }
        None => *root = Some(element),
    }
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<String, XmlError> {
    match resolved {
        ResolveResult::Bound(ns) => std::str::from_utf8(ns.as_ref())
            .map(str::to_string)
            .map_err(|e| XmlError::malformed(e.to_string())),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(XmlError::UnboundPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

fn element_from_start(start: &BytesStart<'_>, ns: String) -> Result<Element, XmlError> {
    let local = start.local_name();
    let name = std::str::from_utf8(local.as_ref()).map_err(|e| XmlError::malformed(e.to_string()))?;
    let mut element = Element::new(name, ns);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::malformed(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| XmlError::malformed(e.to_string()))?;
        // Namespace declarations are folded into element namespaces.
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr.unescape_value()?;
        element.set_attr(key, value.into_owned());
    }

    Ok(element)
}
