//! Content parts: the main body, headers and footers
//!
//! These helpers are shared by every pass that reads or rewrites paragraph text.

use serde::Serialize;

use crate::document::relationships::RelationshipSet;
use crate::error::PersistenceError;
use crate::xml::{ElementKind, XmlDocument, XmlElement, XmlNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    Body,
    Header,
    Footer,
}

/// A parsed content part together with its relationships
#[derive(Debug, Clone)]
pub struct ContentPart {
    pub name: String,
    pub kind: ContentKind,
    pub xml: XmlDocument,
    pub relationships: RelationshipSet,
    dirty: bool,
}

impl ContentPart {
    pub fn parse(
        name: impl Into<String>,
        kind: ContentKind,
        bytes: &[u8],
        relationships: RelationshipSet,
    ) -> Result<Self, PersistenceError> {
        let name = name.into();
        let xml = XmlDocument::parse(bytes).map_err(|source| PersistenceError::Xml {
            part: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            kind,
            xml,
            relationships,
            dirty: false,
        })
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.xml.root()
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.xml.root_mut()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
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

/// Where a paragraph sits in the part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParagraphContext {
    pub in_table: bool,
}

/// Visit every top-level paragraph of a content tree (body, cells, content controls).
///
/// Paragraphs nested inside drawings (text boxes) are not visited.
pub fn for_each_paragraph(
    root: &XmlElement,
    visit: &mut impl FnMut(&XmlElement, ParagraphContext),
) {
    fn recurse(
        el: &XmlElement,
        ctx: ParagraphContext,
        visit: &mut impl FnMut(&XmlElement, ParagraphContext),
    ) {
        for child in el.elements() {
            match child.kind() {
                ElementKind::Paragraph => visit(child, ctx),
                ElementKind::Table => recurse(child, ParagraphContext { in_table: true }, visit),
                ElementKind::Drawing | ElementKind::Picture | ElementKind::Object => {}
                _ => recurse(child, ctx, visit),
            }
        }
    }
    recurse(root, ParagraphContext::default(), visit);
}

pub fn for_each_paragraph_mut(
    root: &mut XmlElement,
    visit: &mut impl FnMut(&mut XmlElement, ParagraphContext),
) {
    fn recurse(
        el: &mut XmlElement,
        ctx: ParagraphContext,
        visit: &mut impl FnMut(&mut XmlElement, ParagraphContext),
    ) {
        for child in el.elements_mut() {
            match child.kind() {
                ElementKind::Paragraph => visit(child, ctx),
                ElementKind::Table => recurse(child, ParagraphContext { in_table: true }, visit),
                ElementKind::Drawing | ElementKind::Picture | ElementKind::Object => {}
                _ => recurse(child, ctx, visit),
            }
        }
    }
    recurse(root, ParagraphContext::default(), visit);
}

/// Runs of a paragraph or hyperlink in document order, descending into run
/// containers (hyperlinks, insertions, content controls) but not deletions.
pub fn runs(container: &XmlElement) -> Vec<&XmlElement> {
    fn collect<'a>(el: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
        for child in el.elements() {
            let kind = child.kind();
            if kind == ElementKind::Run {
                out.push(child);
            } else if kind.is_run_container() {
                collect(child, out);
            }
        }
    }
    let mut out = Vec::new();
    collect(container, &mut out);
    out
}

pub fn runs_mut(container: &mut XmlElement) -> Vec<&mut XmlElement> {
    fn collect<'a>(el: &'a mut XmlElement, out: &mut Vec<&'a mut XmlElement>) {
        for child in el.elements_mut() {
            let kind = child.kind();
            if kind == ElementKind::Run {
                out.push(child);
            } else if kind.is_run_container() {
                collect(child, out);
            }
        }
    }
    let mut out = Vec::new();
    collect(container, &mut out);
    out
}

/// Visible text of a run: `w:t` content, tabs as `\t`, breaks as `\n`
pub fn run_text(run: &XmlElement) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.kind() {
            ElementKind::Text => text.push_str(&child.text()),
            ElementKind::Tab => text.push('\t'),
            ElementKind::Break => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// Visible text of a paragraph (deleted text excluded)
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    runs(paragraph).into_iter().map(run_text).collect()
}

/// Paragraph style id from `w:pPr/w:pStyle`
pub fn paragraph_style(paragraph: &XmlElement) -> Option<&str> {
    paragraph
        .child("pPr")
        .and_then(|ppr| ppr.child("pStyle"))
        .and_then(|style| style.attr_local("val"))
}

/// `(numId, ilvl)` from `w:pPr/w:numPr`
pub fn numbering_reference(paragraph: &XmlElement) -> Option<(String, u8)> {
    let num_pr = paragraph.child("pPr")?.child("numPr")?;
    let num_id = num_pr.child("numId")?.attr_local("val")?.to_string();
    let ilvl = num_pr
        .child("ilvl")
        .and_then(|el| el.attr_local("val"))
        .and_then(|val| val.parse().ok())
        .unwrap_or(0);
    Some((num_id, ilvl))
}

/// Set a `w:t` element's text, keeping `xml:space="preserve"` in sync with
/// leading/trailing whitespace.
pub fn set_text_preserving_space(text_el: &mut XmlElement, text: &str) {
    text_el.set_text(text);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        text_el.set_attr("xml:space", "preserve");
    }
}

/// Replace the visible text of a run container: the first run receives `text`,
/// every other run's `w:t` is emptied. Returns false when there is no run.
pub fn replace_runs_text(container: &mut XmlElement, text: &str) -> bool {
    let mut runs = runs_mut(container);
    let Some((first, rest)) = runs.split_first_mut() else {
        return false;
    };

    let mut wrote = false;
    for child in first.elements_mut() {
        if child.kind() == ElementKind::Text {
            if wrote {
                child.set_text("");
            } else {
                set_text_preserving_space(child, text);
                wrote = true;
            }
        }
    }
    if !wrote {
        let mut t = XmlElement::new(first.qualify("t"));
        set_text_preserving_space(&mut t, text);
        first.children.push(XmlNode::Element(t));
    }

    for run in rest {
        for child in run.elements_mut() {
            if child.kind() == ElementKind::Text {
                child.set_text("");
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> XmlDocument {
        let xml = format!(
            r#"<w:document xmlns:w="urn:w" xmlns:r="urn:r"><w:body>{body}</w:body></w:document>"#
        );
        XmlDocument::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn paragraph_text_skips_deleted_runs() {
        let d = doc(
            r#"<w:p><w:r><w:t>Keep</w:t></w:r><w:del><w:r><w:delText>gone</w:delText></w:r></w:del><w:ins><w:r><w:t xml:space="preserve"> new</w:t></w:r></w:ins><w:r><w:tab/><w:t>x</w:t></w:r></w:p>"#,
        );
        let mut texts = Vec::new();
        for_each_paragraph(d.root().unwrap(), &mut |p, _| texts.push(paragraph_text(p)));
        assert_eq!(texts, vec!["Keep new\tx".to_string()]);
    }

    #[test]
    fn table_paragraphs_are_flagged() {
        let d = doc(
            r#"<w:p/><w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl><w:sdt><w:sdtContent><w:p/></w:sdtContent></w:sdt>"#,
        );
        let mut contexts = Vec::new();
        for_each_paragraph(d.root().unwrap(), &mut |_, ctx| contexts.push(ctx.in_table));
        assert_eq!(contexts, vec![false, true, false]);
    }

    #[test]
    fn replace_runs_text_writes_first_run_only() {
        let mut d = doc(
            r#"<w:p><w:hyperlink r:id="rId1"><w:r><w:t>Old</w:t></w:r><w:r><w:t> title</w:t></w:r></w:hyperlink></w:p>"#,
        );
        let root = d.root_mut().unwrap();
        let link = root
            .child_mut("body")
            .and_then(|b| b.child_mut("p"))
            .and_then(|p| p.child_mut("hyperlink"))
            .unwrap();
        assert!(replace_runs_text(link, "New (123456)"));
        let texts: Vec<_> = runs(link).into_iter().map(run_text).collect();
        assert_eq!(texts, vec!["New (123456)".to_string(), String::new()]);
    }

    #[test]
    fn numbering_reference_defaults_level_zero() {
        let d = doc(r#"<w:p><w:pPr><w:pStyle w:val="List"/><w:numPr><w:numId w:val="4"/></w:numPr></w:pPr></w:p>"#);
        let body = d.root().unwrap().child("body").unwrap();
        let p = body.child("p").unwrap();
        assert_eq!(numbering_reference(p), Some(("4".to_string(), 0)));
        assert_eq!(paragraph_style(p), Some("List"));
    }
}
