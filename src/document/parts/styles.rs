//! `word/styles.xml`

use crate::error::PersistenceError;
use crate::xml::{STYLE_ORDER, XmlDocument, XmlElement, XmlNode};

pub const STYLES_PART: &str = "word/styles.xml";

#[derive(Debug, Clone)]
pub struct StylesPart {
    pub name: String,
    xml: XmlDocument,
    dirty: bool,
}

impl StylesPart {
    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self, PersistenceError> {
        let name = name.into();
        let xml = XmlDocument::parse(bytes).map_err(|source| PersistenceError::Xml {
            part: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            xml,
            dirty: false,
        })
    }

    fn styles(&self) -> impl Iterator<Item = &XmlElement> {
        self.xml
            .root()
            .into_iter()
            .flat_map(|root| root.elements())
            .filter(|el| el.local_name() == "style")
    }

    pub fn style_ids(&self) -> Vec<String> {
        self.styles()
            .filter_map(|el| el.attr_local("styleId"))
            .map(str::to_string)
            .collect()
    }

    pub fn find_style(&self, style_id: &str) -> Option<&XmlElement> {
        self.styles()
            .find(|el| el.attr_local("styleId") == Some(style_id))
    }

    /// Display name (`w:name`) of a style
    pub fn style_name(&self, style_id: &str) -> Option<String> {
        self.find_style(style_id)
            .and_then(|el| el.child("name"))
            .and_then(|name| name.attr_local("val"))
            .map(str::to_string)
    }

    /// Resolve a style reference given either its id or its display name
    pub fn resolve_style_id(&self, id_or_name: &str) -> Option<String> {
        if self.find_style(id_or_name).is_some() {
            return Some(id_or_name.to_string());
        }
        self.styles()
            .find(|el| {
                el.child("name")
                    .and_then(|name| name.attr_local("val"))
                    .is_some_and(|val| val.eq_ignore_ascii_case(id_or_name))
            })
            .and_then(|el| el.attr_local("styleId"))
            .map(str::to_string)
    }

    /// Mutable access to a paragraph style definition, created (based on
    /// `Normal`) when missing. Marks the part dirty.
    pub fn ensure_paragraph_style(&mut self, style_id: &str) -> Option<&mut XmlElement> {
        self.dirty = true;
        let root = self.xml.root_mut()?;
        let position = root.children.iter().position(|node| {
            matches!(node, XmlNode::Element(el)
                if el.local_name() == "style" && el.attr_local("styleId") == Some(style_id))
        });

        let index = match position {
            Some(index) => index,
            None => {
                let mut style = XmlElement::new(root.qualify("style"));
                style.set_attr(root.qualify("type"), "paragraph");
                style.set_attr(root.qualify("styleId"), style_id);
                let mut name = XmlElement::new(root.qualify("name"));
                name.set_attr(root.qualify("val"), style_id);
                style.children.push(XmlNode::Element(name));
                if style_id != "Normal" {
                    let mut based_on = XmlElement::new(root.qualify("basedOn"));
                    based_on.set_attr(root.qualify("val"), "Normal");
                    style.children.push(XmlNode::Element(based_on));
                }
                style.ensure_child("qFormat", STYLE_ORDER);
                root.children.push(XmlNode::Element(style));
                root.children.len() - 1
            }
        };
        root.children[index].as_element_mut()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        self.xml.to_bytes().map_err(|source| PersistenceError::Xml {
            part: self.name.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &[u8] = br#"<w:styles xmlns:w="urn:w"><w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/></w:style></w:styles>"#;

    #[test]
    fn resolves_ids_and_display_names() {
        let styles = StylesPart::parse(STYLES_PART, STYLES).unwrap();
        assert_eq!(styles.style_ids(), vec!["Normal", "Heading1"]);
        assert_eq!(styles.resolve_style_id("Heading1").as_deref(), Some("Heading1"));
        assert_eq!(styles.resolve_style_id("Heading 1").as_deref(), Some("Heading1"));
        assert_eq!(styles.style_name("Heading1").as_deref(), Some("heading 1"));
        assert!(styles.resolve_style_id("Caption").is_none());
    }

    #[test]
    fn ensure_paragraph_style_creates_missing_definitions() {
        let mut styles = StylesPart::parse(STYLES_PART, STYLES).unwrap();
        assert!(!styles.is_dirty());
        let style = styles.ensure_paragraph_style("Heading2").unwrap();
        assert_eq!(style.attr("w:type"), Some("paragraph"));
        assert_eq!(
            style.child("basedOn").and_then(|b| b.attr("w:val")),
            Some("Normal")
        );
        assert!(styles.is_dirty());
        assert!(styles.find_style("Heading2").is_some());

        // existing styles are returned as-is
        styles.ensure_paragraph_style("Normal").unwrap();
        assert_eq!(styles.style_ids().len(), 3);
    }
}
