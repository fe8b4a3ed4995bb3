//! Hanging indentation for list paragraphs
//!
//! For a paragraph at numbering level L: `left = L.text_indent` and a hanging
//! first line of `L.text_indent - L.symbol_indent`, so the bullet or number sits
//! at `symbol_indent` and wrapped lines align with the text.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{TransformOutcome, for_each_content_part, inches_to_twips};
use crate::document::WordDocument;
use crate::document::parts::content::{for_each_paragraph_mut, numbering_reference, paragraph_text};
use crate::xml::{PPR_ORDER, XmlElement};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndentLevel {
    pub level: u8,
    /// Inches from the margin to the bullet or number
    pub symbol_indent: f64,
    /// Inches from the margin to the text
    pub text_indent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentationTable {
    pub levels: Vec<IndentLevel>,
}

impl IndentationTable {
    pub fn level(&self, ilvl: u8) -> Option<&IndentLevel> {
        self.levels.iter().find(|level| level.level == ilvl)
    }

    /// Quarter-inch steps: symbol at 0.25 * (L + 1), text a quarter inch further
    pub fn standard() -> Self {
        Self {
            levels: (0..9)
                .map(|level| IndentLevel {
                    level,
                    symbol_indent: 0.25 * f64::from(level + 1),
                    text_indent: 0.25 * f64::from(level + 2),
                })
                .collect(),
        }
    }
}

fn set_indent(paragraph: &mut XmlElement, left: i64, hanging: i64) -> bool {
    let ppr = paragraph.ensure_properties("pPr");
    let ind = ppr.ensure_child("ind", PPR_ORDER);
    let before = ind.clone();

    let left_attr = ind.qualify("left");
    let start_attr = ind.qualify("start");
    let hanging_attr = ind.qualify("hanging");
    let first_line_attr = ind.qualify("firstLine");

    ind.set_attr(left_attr, left.to_string());
    if ind.attr(&start_attr).is_some() {
        ind.set_attr(start_attr, left.to_string());
    }
    ind.set_attr(hanging_attr, hanging.to_string());
    ind.remove_attr(&first_line_attr);

    *ind != before
}

pub fn apply_list_indentation(doc: &mut WordDocument, table: &IndentationTable) -> TransformOutcome {
    let mut warned: BTreeSet<u8> = BTreeSet::new();

    for_each_content_part(doc, |part_name, root| {
        let mut outcome = TransformOutcome::default();
        for_each_paragraph_mut(root, &mut |paragraph, _| {
            let Some((_, ilvl)) = numbering_reference(paragraph) else {
                return;
            };
            let Some(level) = table.level(ilvl) else {
                return;
            };
            if level.symbol_indent >= level.text_indent {
                if warned.insert(ilvl) {
                    outcome.warnings.push(format!(
                        "Skipped list level {ilvl}: symbol indent {} in is not less than text indent {} in",
                        level.symbol_indent, level.text_indent
                    ));
                }
                return;
            }

            let left = inches_to_twips(level.text_indent);
            let hanging = inches_to_twips(level.text_indent - level.symbol_indent);
            if set_indent(paragraph, left, hanging) {
                outcome.mutations += 1;
                outcome.change(
                    part_name,
                    paragraph_text(paragraph),
                    format!("left={left} hanging={hanging}"),
                    format!("Set hanging indent for list level {ilvl}"),
                );
            }
        });
        outcome
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_paragraph(ilvl: u8, ind: &str) -> String {
        format!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{ilvl}"/><w:numId w:val="1"/></w:numPr>{ind}</w:pPr><w:r><w:t>item</w:t></w:r></w:p>"#
        )
    }

    #[test]
    fn sets_left_and_hanging_in_twips() {
        let body = list_paragraph(0, r#"<w:ind w:left="360" w:firstLine="0"/>"#)
            + &list_paragraph(1, "")
            + r#"<w:p><w:r><w:t>not a list</w:t></w:r></w:p>"#;
        let mut doc = WordDocument::from_body(&body);
        let outcome = apply_list_indentation(&mut doc, &IndentationTable::standard());
        assert_eq!(outcome.mutations, 2);

        let paragraphs: Vec<_> = doc.body().elements().collect();
        let ind = paragraphs[0].child("pPr").unwrap().child("ind").unwrap();
        assert_eq!(ind.attr("w:left"), Some("720"));
        assert_eq!(ind.attr("w:hanging"), Some("360"));
        assert_eq!(ind.attr("w:firstLine"), None);

        let ind = paragraphs[1].child("pPr").unwrap().child("ind").unwrap();
        assert_eq!(ind.attr("w:left"), Some("1080"));
        assert!(!paragraphs[2].has_child("pPr"));

        // second pass is a no-op
        assert_eq!(
            apply_list_indentation(&mut doc, &IndentationTable::standard()).mutations,
            0
        );
    }

    #[test]
    fn inverted_levels_are_skipped_with_one_warning() {
        let table = IndentationTable {
            levels: vec![IndentLevel {
                level: 0,
                symbol_indent: 0.5,
                text_indent: 0.5,
            }],
        };
        let body = list_paragraph(0, "") + &list_paragraph(0, "");
        let mut doc = WordDocument::from_body(&body);
        let snapshot = doc.main().xml.clone();

        let outcome = apply_list_indentation(&mut doc, &table);
        assert_eq!(outcome.mutations, 0);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(doc.main().xml, snapshot);
        assert!(!doc.main().is_dirty());
    }
}
