//! [`XmlDocument`] to bytes

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use super::{XmlDocument, XmlError, XmlNode};

pub(crate) fn serialize(document: &XmlDocument) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new(Vec::new());

    if let Some(decl) = &document.declaration {
        let event = BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        );
        writer
            .write_event(Event::Decl(event))
            .map_err(|e| XmlError::Write(e.to_string()))?;
    }

    for node in &document.nodes {
        write_node(&mut writer, node)?;
    }

    Ok(writer.into_inner())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), XmlError> {
    let result = match node {
        XmlNode::Element(element) => {
            let mut start = BytesStart::new(element.name.as_str());
            for (key, value) in &element.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            if element.children.is_empty() {
                writer.write_event(Event::Empty(start))
            } else {
                writer
                    .write_event(Event::Start(start))
                    .map_err(|e| XmlError::Write(e.to_string()))?;
                for child in &element.children {
                    write_node(writer, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
            }
        }
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))),
        XmlNode::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
        }
        XmlNode::ProcessingInstruction(text) => {
            writer.write_event(Event::PI(BytesPI::new(text.as_str())))
        }
    };
    result.map_err(|e| XmlError::Write(e.to_string()))
}
