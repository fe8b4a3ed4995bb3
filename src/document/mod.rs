//! Parsed view of a Word package
//!
//! A [`WordDocument`] parses the parts that processing touches (main body,
//! headers, footers, styles, numbering, font table) and leaves every other part
//! as raw bytes in the underlying [`Package`]. Only parts that were modified are
//! re-serialized on save.

mod loader;
pub mod parts;
pub mod relationships;

pub use loader::verify_readable;
pub use parts::{
    ContentKind, ContentPart, FontTablePart, NumberingLevel, NumberingPart, ParagraphContext,
    StylesPart,
};
pub use relationships::{Relationship, RelationshipSet, TargetMode, rels_for_part, resolve_target};

use crate::package::Package;

#[derive(Debug, Clone)]
pub struct WordDocument {
    package: Package,
    /// Main document part first, then headers and footers in relationship order
    content: Vec<ContentPart>,
    styles: Option<StylesPart>,
    numbering: Option<NumberingPart>,
    font_table: Option<FontTablePart>,
}

impl WordDocument {
    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn main(&self) -> &ContentPart {
        &self.content[0]
    }

    pub fn main_mut(&mut self) -> &mut ContentPart {
        &mut self.content[0]
    }

    pub fn content_parts(&self) -> &[ContentPart] {
        &self.content
    }

    pub fn content_parts_mut(&mut self) -> &mut [ContentPart] {
        &mut self.content
    }

    pub fn content_part(&self, name: &str) -> Option<&ContentPart> {
        self.content.iter().find(|part| part.name == name)
    }

    pub fn styles(&self) -> Option<&StylesPart> {
        self.styles.as_ref()
    }

    pub fn styles_mut(&mut self) -> Option<&mut StylesPart> {
        self.styles.as_mut()
    }

    pub fn numbering(&self) -> Option<&NumberingPart> {
        self.numbering.as_ref()
    }

    pub fn numbering_mut(&mut self) -> Option<&mut NumberingPart> {
        self.numbering.as_mut()
    }

    pub fn font_table(&self) -> Option<&FontTablePart> {
        self.font_table.as_ref()
    }

    pub fn font_table_mut(&mut self) -> Option<&mut FontTablePart> {
        self.font_table.as_mut()
    }

    /// Disjoint borrows of the content parts and the numbering part
    pub fn content_and_numbering_mut(
        &mut self,
    ) -> (&mut [ContentPart], Option<&mut NumberingPart>) {
        (&mut self.content, self.numbering.as_mut())
    }

    /// Whether any parsed part has pending modifications
    pub fn is_modified(&self) -> bool {
        self.content
            .iter()
            .any(|part| part.is_dirty() || part.relationships.is_dirty())
            || self.styles.as_ref().is_some_and(StylesPart::is_dirty)
            || self.numbering.as_ref().is_some_and(NumberingPart::is_dirty)
            || self.font_table.as_ref().is_some_and(FontTablePart::is_dirty)
    }
}

#[cfg(test)]
impl WordDocument {
    /// A single-part document wrapping `body` in `w:document/w:body`
    pub(crate) fn from_body(body: &str) -> Self {
        Self::with_parts(body, &[])
    }

    pub(crate) fn with_parts(body: &str, extra: &[(&str, &str)]) -> Self {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><w:body>{body}</w:body></w:document>"#
        );
        let mut package = Package::new();
        package.set_part(crate::package::MAIN_DOCUMENT_PART, xml.into_bytes());
        for (name, content) in extra {
            package.set_part(*name, content.as_bytes().to_vec());
        }
        Self::load(package).unwrap()
    }

    pub(crate) fn body(&self) -> &crate::xml::XmlElement {
        self.main()
            .root()
            .and_then(|root| root.child("body"))
            .unwrap()
    }
}
