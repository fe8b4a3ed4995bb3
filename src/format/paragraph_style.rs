//! Heading style assignment from paragraph shape
//!
//! Short single-line paragraphs are classified by their text alone:
//! all-caps text becomes a level-1 heading; title-case text or text with a
//! `n.n` numbering prefix becomes a level-2 heading.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{TransformOutcome, for_each_content_part};
use crate::document::WordDocument;
use crate::document::parts::content::{
    for_each_paragraph_mut, numbering_reference, paragraph_style, paragraph_text,
};
use crate::xml::{PPR_ORDER, XmlElement};

// "2.1 Scope", "3.4.1. Definitions"
static SECTION_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+(?:\.\d+)*\.?\s+\S").unwrap());

// Words that stay lowercase inside a title
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "in", "nor", "of", "on", "or", "per", "the",
    "to", "vs", "via", "with",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingStyles {
    pub heading1: String,
    pub heading2: String,
    /// Paragraphs at least this many characters long are never classified
    pub max_length: usize,
}

impl Default for HeadingStyles {
    fn default() -> Self {
        Self {
            heading1: "Heading1".to_string(),
            heading2: "Heading2".to_string(),
            max_length: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    One,
    Two,
}

/// Heuristic sentence detection: prose is never a heading
fn is_likely_sentence(text: &str) -> bool {
    if text.matches(". ").count() > 1 {
        return true;
    }
    if text.ends_with('.') || text.ends_with('!') || text.ends_with('?') || text.ends_with(',') {
        return true;
    }
    text.contains(" but ") || text.contains(" however ") || text.contains(" therefore ")
}

fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn is_title_case(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return false;
    }
    words.iter().enumerate().all(|(i, word)| {
        let Some(first) = word.chars().find(|c| c.is_alphanumeric()) else {
            return true;
        };
        if !first.is_alphabetic() || first.is_uppercase() {
            return true;
        }
        i > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str())
    })
}

pub fn classify(text: &str, max_length: usize) -> Option<HeadingLevel> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() >= max_length || text.contains('\n') {
        return None;
    }
    if SECTION_NUMBER_PREFIX.is_match(text) {
        return Some(HeadingLevel::Two);
    }
    if is_likely_sentence(text) {
        return None;
    }
    if is_all_caps(text) {
        return Some(HeadingLevel::One);
    }
    if is_title_case(text) {
        return Some(HeadingLevel::Two);
    }
    None
}

fn set_paragraph_style(paragraph: &mut XmlElement, style_id: &str) {
    let ppr = paragraph.ensure_properties("pPr");
    let style = ppr.ensure_child("pStyle", PPR_ORDER);
    let attr = style.qualify("val");
    style.set_attr(attr, style_id);
}

pub fn assign_paragraph_styles(doc: &mut WordDocument, styles: &HeadingStyles) -> TransformOutcome {
    // Use existing definitions when present, matching by id or display name
    let mut targets = [styles.heading1.clone(), styles.heading2.clone()];
    if let Some(part) = doc.styles() {
        for target in &mut targets {
            if let Some(id) = part.resolve_style_id(target) {
                *target = id;
            }
        }
    }
    let [heading1, heading2] = targets;

    let mut used = [false, false];
    let mut outcome = for_each_content_part(doc, |part_name, root| {
        let mut outcome = TransformOutcome::default();
        for_each_paragraph_mut(root, &mut |paragraph, ctx| {
            if ctx.in_table || numbering_reference(paragraph).is_some() {
                return;
            }
            let text = paragraph_text(paragraph);
            let Some(level) = classify(&text, styles.max_length) else {
                return;
            };
            let (target, slot) = match level {
                HeadingLevel::One => (&heading1, 0),
                HeadingLevel::Two => (&heading2, 1),
            };
            let current = paragraph_style(paragraph).map(str::to_string);
            if current.as_deref() == Some(target.as_str()) {
                return;
            }
            set_paragraph_style(paragraph, target);
            used[slot] = true;
            outcome.mutations += 1;
            outcome.change(
                part_name,
                current.unwrap_or_else(|| "Normal".to_string()),
                target.clone(),
                format!("Assigned style {target} to \"{}\"", text.trim()),
            );
        });
        outcome
    });

    // Referenced styles must exist for Word to render them
    if let Some(part) = doc.styles_mut() {
        for (target, used) in [(&heading1, used[0]), (&heading2, used[1])] {
            if used && part.find_style(target).is_none() {
                part.ensure_paragraph_style(target);
                outcome
                    .warnings
                    .push(format!("Style {target} was missing and has been created"));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parts::content::for_each_paragraph;

    #[test]
    fn classification_by_shape() {
        assert_eq!(classify("GENERAL PROVISIONS", 100), Some(HeadingLevel::One));
        assert_eq!(classify("Scope of the Policy", 100), Some(HeadingLevel::Two));
        assert_eq!(classify("2.1 definitions", 100), Some(HeadingLevel::Two));
        assert_eq!(classify("This is an ordinary sentence.", 100), None);
        assert_eq!(classify("lowercase words here", 100), None);
        assert_eq!(classify("A", 100), None);
        assert_eq!(classify(&"WORD ".repeat(30), 100), None);
    }

    fn styles_of(doc: &WordDocument) -> Vec<Option<String>> {
        let mut out = Vec::new();
        for_each_paragraph(doc.body(), &mut |p, _| {
            out.push(paragraph_style(p).map(str::to_string))
        });
        out
    }

    #[test]
    fn assigns_styles_outside_tables_and_lists() {
        let mut doc = WordDocument::from_body(
            r#"<w:p><w:r><w:t>INTRODUCTION</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Purpose and Scope</w:t></w:r></w:p>
               <w:p><w:r><w:t>Body text that reads like prose, with a comma.</w:t></w:r></w:p>
               <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>LIST ITEM</w:t></w:r></w:p>
               <w:tbl><w:tr><w:tc><w:p><w:r><w:t>CELL</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let outcome = assign_paragraph_styles(&mut doc, &HeadingStyles::default());

        assert_eq!(outcome.mutations, 1);
        assert_eq!(
            styles_of(&doc),
            vec![
                Some("Heading1".to_string()),
                Some("Heading2".to_string()),
                None,
                None,
                None
            ]
        );
        // pStyle is the first pPr child
        let first = doc.body().child("p").unwrap();
        assert_eq!(
            first.child("pPr").unwrap().elements().next().unwrap().local_name(),
            "pStyle"
        );
    }

    #[test]
    fn missing_style_definitions_are_created() {
        let mut doc = WordDocument::with_parts(
            r#"<w:p><w:r><w:t>OVERVIEW</w:t></w:r></w:p>"#,
            &[(
                "word/styles.xml",
                r#"<w:styles xmlns:w="urn:w"><w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#,
            )],
        );
        let outcome = assign_paragraph_styles(&mut doc, &HeadingStyles::default());
        assert_eq!(outcome.warnings.len(), 1);
        let styles = doc.styles().unwrap();
        assert!(styles.find_style("Heading1").is_some());
        assert!(styles.is_dirty());
    }
}
