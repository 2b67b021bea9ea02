//! Serializing an element tree back to XML text.

use super::{Element, Node};
use crate::error::XmlError;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serialize an element, declaring namespaces where they change.
pub fn to_xml(element: &Element) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element, "")?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    inherited_ns: &str,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name());
    if element.ns() != inherited_ns {
        start.push_attribute(("xmlns", element.ns()));
    }
    for (key, value) in element.attrs() {
        start.push_attribute((key, value));
    }

    if element.nodes().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for node in element.nodes() {
        match node {
            Node::Element(child) => write_element(writer, child, element.ns())?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name())))?;
    Ok(())
}
