//! quick-xml event stream to [`XmlDocument`]

use quick_xml::Reader;
use quick_xml::events::{BytesDecl, BytesStart, Event};

use super::{XmlDeclaration, XmlDocument, XmlElement, XmlError, XmlNode};

pub(crate) fn parse(bytes: &[u8]) -> Result<XmlDocument, XmlError> {
    let mut reader = Reader::from_reader(bytes);
    // Whitespace inside w:t is content
    reader.config_mut().trim_text(false);

    let mut document = XmlDocument::default();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::Malformed {
                position,
                message: e.to_string(),
            })?;

        match event {
            Event::Decl(ref decl) => {
                document.declaration = Some(read_declaration(decl, position)?);
            }
            Event::Start(ref start) => {
                stack.push(read_element(start, position)?);
            }
            Event::Empty(ref start) => {
                let element = read_element(start, position)?;
                attach(&mut stack, &mut document, XmlNode::Element(element));
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Unbalanced(format!("unexpected end tag at byte {position}")))?;
                attach(&mut stack, &mut document, XmlNode::Element(element));
            }
            Event::Text(ref text) => {
                let text = text.unescape().map_err(|e| XmlError::Malformed {
                    position,
                    message: e.to_string(),
                })?;
                attach(&mut stack, &mut document, XmlNode::Text(text.into_owned()));
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                attach(&mut stack, &mut document, XmlNode::CData(text));
            }
            Event::Comment(comment) => {
                let text = String::from_utf8_lossy(&comment.into_inner()).into_owned();
                attach(&mut stack, &mut document, XmlNode::Comment(text));
            }
            Event::PI(ref pi) => {
                let text = String::from_utf8_lossy(pi).into_owned();
                attach(&mut stack, &mut document, XmlNode::ProcessingInstruction(text));
            }
            // OOXML parts never carry a DTD
            Event::DocType(_) => {}
            Event::Eof => break,
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Unbalanced(format!(
            "element <{}> is never closed",
            open.name
        )));
    }

    Ok(document)
}

fn attach(stack: &mut [XmlElement], document: &mut XmlDocument, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document.nodes.push(node),
    }
}

fn read_element(start: &BytesStart<'_>, position: u64) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed {
            position,
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| XmlError::Malformed {
            position,
            message: e.to_string(),
        })?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>, position: u64) -> Result<XmlDeclaration, XmlError> {
    let malformed = |message: String| XmlError::Malformed { position, message };

    let version = decl.version().map_err(|e| malformed(e.to_string()))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|e| malformed(e.to_string()))?;
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|e| malformed(e.to_string()))?;

    Ok(XmlDeclaration {
        version: String::from_utf8_lossy(&version).into_owned(),
        encoding: encoding.map(|value| String::from_utf8_lossy(&value).into_owned()),
        standalone: standalone.map(|value| String::from_utf8_lossy(&value).into_owned()),
    })
}
