//! `word/fontTable.xml`

use crate::error::PersistenceError;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const FONT_TABLE_PART: &str = "word/fontTable.xml";

#[derive(Debug, Clone)]
pub struct FontTablePart {
    pub name: String,
    xml: XmlDocument,
    dirty: bool,
}

impl FontTablePart {
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

    pub fn font_names(&self) -> Vec<String> {
        self.xml
            .root()
            .into_iter()
            .flat_map(|root| root.elements())
            .filter(|el| el.local_name() == "font")
            .filter_map(|el| el.attr_local("name"))
            .map(str::to_string)
            .collect()
    }

    pub fn has_font(&self, name: &str) -> bool {
        self.font_names()
            .iter()
            .any(|font| font.eq_ignore_ascii_case(name))
    }

    /// Declare a font when it is not in the table yet; returns true when added
    pub fn ensure_font(&mut self, name: &str) -> bool {
        if self.has_font(name) {
            return false;
        }
        let Some(root) = self.xml.root_mut() else {
            return false;
        };
        let font = XmlElement::new(root.qualify("font")).with_attr(root.qualify("name"), name);
        root.children.push(XmlNode::Element(font));
        self.dirty = true;
        true
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

    #[test]
    fn ensure_font_is_idempotent() {
        let mut fonts = FontTablePart::parse(
            FONT_TABLE_PART,
            br#"<w:fonts xmlns:w="urn:w"><w:font w:name="Calibri"/><w:font w:name="Symbol"/></w:fonts>"#,
        )
        .unwrap();
        assert!(fonts.has_font("calibri"));
        assert!(!fonts.ensure_font("Symbol"));
        assert!(!fonts.is_dirty());

        assert!(fonts.ensure_font("Arial"));
        assert!(!fonts.ensure_font("Arial"));
        assert_eq!(fonts.font_names(), vec!["Calibri", "Symbol", "Arial"]);
        assert!(fonts.is_dirty());
    }
}
