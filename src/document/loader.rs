//! Loading a [`WordDocument`] from a package and committing it back
//!
//! Loading:
//! 1. Parses the main document part and its relationships
//! 2. Follows header/footer relationships to their content parts
//! 3. Locates styles, numbering and font table through relationships, falling
//!    back to their conventional part names
//!
//! Committing writes back only the parts that were modified.

use tracing::debug;

use super::WordDocument;
use super::parts::{
    ContentKind, ContentPart, FONT_TABLE_PART, FontTablePart, NUMBERING_PART, NumberingPart,
    STYLES_PART, StylesPart,
};
use super::relationships::{
    REL_TYPE_FONT_TABLE, REL_TYPE_FOOTER, REL_TYPE_HEADER, REL_TYPE_NUMBERING, REL_TYPE_STYLES,
    RelationshipSet, TargetMode, rels_for_part, resolve_target,
};
use crate::error::PersistenceError;
use crate::package::{MAIN_DOCUMENT_PART, Package};

impl WordDocument {
    pub fn load(package: Package) -> Result<Self, PersistenceError> {
        let main_bytes = package
            .part(MAIN_DOCUMENT_PART)
            .ok_or_else(|| PersistenceError::MissingPart(MAIN_DOCUMENT_PART.to_string()))?;
        let main_rels = load_relationships(&package, MAIN_DOCUMENT_PART)?;

        let mut extra_parts = Vec::new();
        for rel in main_rels.iter() {
            if rel.target_mode == TargetMode::External {
                continue;
            }
            let kind = match rel.rel_type.as_str() {
                REL_TYPE_HEADER => ContentKind::Header,
                REL_TYPE_FOOTER => ContentKind::Footer,
                _ => continue,
            };
            let name = resolve_target(MAIN_DOCUMENT_PART, &rel.target);
            if extra_parts.iter().any(|(existing, _)| *existing == name) {
                continue;
            }
            extra_parts.push((name, kind));
        }

        let styles_name = related_part(&package, &main_rels, REL_TYPE_STYLES, STYLES_PART);
        let numbering_name =
            related_part(&package, &main_rels, REL_TYPE_NUMBERING, NUMBERING_PART);
        let fonts_name = related_part(&package, &main_rels, REL_TYPE_FONT_TABLE, FONT_TABLE_PART);

        let mut content = vec![ContentPart::parse(
            MAIN_DOCUMENT_PART,
            ContentKind::Body,
            main_bytes,
            main_rels,
        )?];

        for (name, kind) in extra_parts {
            let Some(bytes) = package.part(&name) else {
                debug!(event = "document.load.missing_part", part = %name);
                continue;
            };
            let relationships = load_relationships(&package, &name)?;
            content.push(ContentPart::parse(name, kind, bytes, relationships)?);
        }

        let styles = styles_name
            .and_then(|name| package.part(&name).map(|bytes| StylesPart::parse(name, bytes)))
            .transpose()?;
        let numbering = numbering_name
            .and_then(|name| {
                package
                    .part(&name)
                    .map(|bytes| NumberingPart::parse(name, bytes))
            })
            .transpose()?;
        let font_table = fonts_name
            .and_then(|name| {
                package
                    .part(&name)
                    .map(|bytes| FontTablePart::parse(name, bytes))
            })
            .transpose()?;

        debug!(
            event = "document.load.parsed",
            content_parts = content.len(),
            has_styles = styles.is_some(),
            has_numbering = numbering.is_some(),
            has_font_table = font_table.is_some()
        );

        Ok(Self {
            package,
            content,
            styles,
            numbering,
            font_table,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        Self::load(Package::from_bytes(bytes)?)
    }

    /// A package with every modified part re-serialized
    pub fn commit(&self) -> Result<Package, PersistenceError> {
        let mut package = self.package.clone();

        for part in &self.content {
            if part.is_dirty() {
                package.set_part(part.name.clone(), part.to_bytes()?);
            }
            if part.relationships.is_dirty() {
                package.set_part(
                    part.relationships.part_name().to_string(),
                    part.relationships.to_bytes()?,
                );
            }
        }
        if let Some(styles) = self.styles.as_ref().filter(|p| p.is_dirty()) {
            package.set_part(styles.name.clone(), styles.to_bytes()?);
        }
        if let Some(numbering) = self.numbering.as_ref().filter(|p| p.is_dirty()) {
            package.set_part(numbering.name.clone(), numbering.to_bytes()?);
        }
        if let Some(fonts) = self.font_table.as_ref().filter(|p| p.is_dirty()) {
            package.set_part(fonts.name.clone(), fonts.to_bytes()?);
        }

        Ok(package)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        self.commit()?.to_bytes()
    }
}

fn load_relationships(package: &Package, part: &str) -> Result<RelationshipSet, PersistenceError> {
    let rels_name = rels_for_part(part);
    match package.part(&rels_name) {
        Some(bytes) => RelationshipSet::parse(rels_name, bytes),
        None => Ok(RelationshipSet::empty(rels_name)),
    }
}

fn related_part(
    package: &Package,
    rels: &RelationshipSet,
    rel_type: &str,
    fallback: &str,
) -> Option<String> {
    rels.by_type(rel_type)
        .map(|rel| resolve_target(MAIN_DOCUMENT_PART, &rel.target))
        .find(|name| package.has_part(name))
        .or_else(|| package.has_part(fallback).then(|| fallback.to_string()))
}

/// Re-read produced bytes with `docx-rs`.
///
/// Only inputs that `docx-rs` itself can read are held to this check, so
/// documents using features it does not support never fail here.
pub fn verify_readable(original: &[u8], output: &[u8]) -> Result<(), PersistenceError> {
    if docx_rs::read_docx(original).is_err() {
        debug!(event = "document.verify.skipped", reason = "input not readable by docx-rs");
        return Ok(());
    }
    docx_rs::read_docx(output)
        .map(|_| ())
        .map_err(|e| PersistenceError::Verification(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_with(parts: &[(&str, &str)]) -> Package {
        let mut package = Package::new();
        for (name, body) in parts {
            package.set_part(*name, body.as_bytes().to_vec());
        }
        package
    }

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p></w:body></w:document>"#;

    const DOC_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="/word/footer1.xml"/></Relationships>"#;

    #[test]
    fn discovers_headers_footers_and_styles() {
        let package = package_with(&[
            (MAIN_DOCUMENT_PART, DOC),
            ("word/_rels/document.xml.rels", DOC_RELS),
            ("word/header1.xml", r#"<w:hdr xmlns:w="urn:w"><w:p/></w:hdr>"#),
            ("word/footer1.xml", r#"<w:ftr xmlns:w="urn:w"><w:p/></w:ftr>"#),
            ("word/styles.xml", r#"<w:styles xmlns:w="urn:w"/>"#),
        ]);
        let doc = WordDocument::load(package).unwrap();

        let names: Vec<_> = doc.content_parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![MAIN_DOCUMENT_PART, "word/header1.xml", "word/footer1.xml"]);
        assert_eq!(doc.content_parts()[1].kind, ContentKind::Header);
        assert_eq!(
            doc.content_parts()[1].relationships.part_name(),
            "word/_rels/header1.xml.rels"
        );
        assert!(doc.styles().is_some());
        assert!(doc.numbering().is_none());
    }

    #[test]
    fn commit_without_changes_keeps_original_bytes() {
        let package = package_with(&[(MAIN_DOCUMENT_PART, DOC)]);
        let doc = WordDocument::load(package.clone()).unwrap();
        assert!(!doc.is_modified());
        assert_eq!(doc.commit().unwrap(), package);
    }

    #[test]
    fn commit_rewrites_dirty_parts() {
        let package = package_with(&[(MAIN_DOCUMENT_PART, DOC)]);
        let mut doc = WordDocument::load(package).unwrap();
        doc.main_mut().mark_dirty();
        let committed = doc.commit().unwrap();
        let reparsed = WordDocument::load(committed).unwrap();
        assert_eq!(reparsed.main().xml, doc.main().xml);
    }

    #[test]
    fn missing_main_part_is_reported() {
        let err = WordDocument::load(Package::new()).unwrap_err();
        assert!(matches!(err, PersistenceError::MissingPart(_)));
    }
}
