//! Blank paragraph pruning
//!
//! A paragraph is blank when it has no visible text, graphic, field, shape or
//! tracked-change text. Blank paragraphs are removed unless they anchor a
//! bookmark, carry section properties, belong to a list, or are the last
//! paragraph of their container.

use super::{TransformOutcome, for_each_content_part};
use crate::document::WordDocument;
use crate::document::parts::content::paragraph_text;
use crate::xml::{ElementKind, Walk, XmlElement, XmlNode, walk};

/// Paragraphs of context recorded on each side of a removal
const CONTEXT_LINES: usize = 2;

const CONTENT_ELEMENTS: &[&str] = &[
    "AlternateContent",
    "footnoteReference",
    "endnoteReference",
    "commentReference",
    "sym",
    "oMath",
    "oMathPara",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Blank,
    Content,
    Protected,
}

fn inspect(paragraph: &XmlElement) -> Verdict {
    let mut verdict = Verdict::Blank;
    walk(paragraph, &mut |el| {
        if verdict != Verdict::Blank {
            return Walk::SkipChildren;
        }
        verdict = match el.kind() {
            ElementKind::BookmarkStart
            | ElementKind::SectionProperties
            | ElementKind::NumberingProperties => Verdict::Protected,
            ElementKind::Text | ElementKind::DeletedText if !el.text().trim().is_empty() => {
                Verdict::Content
            }
            ElementKind::Drawing
            | ElementKind::Picture
            | ElementKind::Object
            | ElementKind::SimpleField
            | ElementKind::FieldChar
            | ElementKind::FieldInstruction => Verdict::Content,
            ElementKind::Break if el.attr_local("type") == Some("page") => Verdict::Content,
            _ if CONTENT_ELEMENTS.contains(&el.local_name()) => Verdict::Content,
            _ => Verdict::Blank,
        };
        Walk::Continue
    });
    verdict
}

pub fn is_blank_paragraph(paragraph: &XmlElement) -> bool {
    inspect(paragraph) == Verdict::Blank
}

fn holds_paragraphs(kind: ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Body
            | ElementKind::Header
            | ElementKind::Footer
            | ElementKind::TableCell
            | ElementKind::ContentControlContent
    )
}

fn descends(kind: ElementKind) -> bool {
    holds_paragraphs(kind)
        || matches!(
            kind,
            ElementKind::Document
                | ElementKind::Table
                | ElementKind::TableRow
                | ElementKind::ContentControl
        )
}

fn context(texts: &[String]) -> String {
    texts
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn prune_container(container: &mut XmlElement, part_name: &str, outcome: &mut TransformOutcome) {
    for child in container.elements_mut() {
        if descends(child.kind()) {
            prune_container(child, part_name, outcome);
        }
    }
    if !holds_paragraphs(container.kind()) {
        return;
    }

    // (node index, text, removable) for every paragraph child
    let paragraphs: Vec<(usize, String, bool)> = container
        .children
        .iter()
        .enumerate()
        .filter_map(|(index, node)| match node {
            XmlNode::Element(el) if el.kind() == ElementKind::Paragraph => {
                Some((index, paragraph_text(el), is_blank_paragraph(el)))
            }
            _ => None,
        })
        .collect();
    let Some(last) = paragraphs.len().checked_sub(1) else {
        return;
    };

    let texts: Vec<String> = paragraphs.iter().map(|(_, text, _)| text.clone()).collect();
    let mut doomed = Vec::new();
    for (position, (index, _, blank)) in paragraphs.iter().enumerate() {
        if !blank || position == last {
            continue;
        }
        let start = position.saturating_sub(CONTEXT_LINES);
        let end = (position + 1 + CONTEXT_LINES).min(texts.len());
        outcome.mutations += 1;
        outcome.change(
            part_name,
            context(&texts[start..position]),
            context(&texts[position + 1..end]),
            "Removed blank paragraph",
        );
        doomed.push(*index);
    }

    for index in doomed.into_iter().rev() {
        container.children.remove(index);
    }
}

pub fn remove_blank_paragraphs(doc: &mut WordDocument) -> TransformOutcome {
    for_each_content_part(doc, |part_name, root| {
        let mut outcome = TransformOutcome::default();
        prune_container(root, part_name, &mut outcome);
        outcome
    })
}
