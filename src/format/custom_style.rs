//! Per-style property injection
//!
//! Resolved properties of a style are written to the style definition in
//! `styles.xml`, to each paragraph's mark run properties, and to every run of
//! the paragraph so direct formatting cannot override the style. Bold, italic
//! and underline can each preserve a value already set on a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{TransformOutcome, for_each_content_part, points_to_half_points, points_to_twips};
use crate::document::WordDocument;
use crate::document::parts::content::{for_each_paragraph_mut, paragraph_style, runs_mut};
use crate::xml::{PPR_ORDER, RPR_ORDER, STYLE_ORDER, XmlElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    fn as_jc(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleDefinition {
    pub font: Option<String>,
    /// Points
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub preserve_bold: bool,
    pub preserve_italic: bool,
    pub preserve_underline: bool,
    pub alignment: Option<Alignment>,
    /// Points
    pub space_before: Option<f64>,
    /// Points
    pub space_after: Option<f64>,
    /// Multiple of single line spacing
    pub line_spacing: Option<f64>,
    /// Hex RGB, with or without a leading `#`
    pub color: Option<String>,
}

/// Style id -> properties
pub type StyleTable = BTreeMap<String, StyleDefinition>;

fn set_val(el: &mut XmlElement, local: &str, value: &str) {
    let name = el.qualify(local);
    el.set_attr(name, value);
}

fn set_toggle(rpr: &mut XmlElement, local: &str, value: bool, preserve: bool) {
    if preserve && rpr.has_child(local) {
        return;
    }
    let el = rpr.ensure_child(local, RPR_ORDER);
    if value {
        let name = el.qualify("val");
        el.remove_attr(&name);
    } else {
        set_val(el, "val", "0");
    }
}

/// Apply run-level properties to an `rPr` element
fn apply_run_properties(rpr: &mut XmlElement, def: &StyleDefinition, honor_preserve: bool) {
    if let Some(font) = &def.font {
        let fonts = rpr.ensure_child("rFonts", RPR_ORDER);
        for attr in ["ascii", "hAnsi", "cs", "eastAsia"] {
            set_val(fonts, attr, font);
        }
    }
    if let Some(bold) = def.bold {
        set_toggle(rpr, "b", bold, honor_preserve && def.preserve_bold);
    }
    if let Some(italic) = def.italic {
        set_toggle(rpr, "i", italic, honor_preserve && def.preserve_italic);
    }
    if let Some(color) = &def.color {
        let hex = color.trim_start_matches('#').to_ascii_uppercase();
        set_val(rpr.ensure_child("color", RPR_ORDER), "val", &hex);
    }
    if let Some(size) = def.size {
        let half_points = points_to_half_points(size).to_string();
        set_val(rpr.ensure_child("sz", RPR_ORDER), "val", &half_points);
        set_val(rpr.ensure_child("szCs", RPR_ORDER), "val", &half_points);
    }
    if let Some(underline) = def.underline {
        if !(honor_preserve && def.preserve_underline && rpr.has_child("u")) {
            let val = if underline { "single" } else { "none" };
            set_val(rpr.ensure_child("u", RPR_ORDER), "val", val);
        }
    }
}

/// Apply paragraph-level properties to a `pPr` element
fn apply_paragraph_properties(ppr: &mut XmlElement, def: &StyleDefinition) {
    if def.space_before.is_some() || def.space_after.is_some() || def.line_spacing.is_some() {
        let spacing = ppr.ensure_child("spacing", PPR_ORDER);
        if let Some(before) = def.space_before {
            set_val(spacing, "before", &points_to_twips(before).to_string());
        }
        if let Some(after) = def.space_after {
            set_val(spacing, "after", &points_to_twips(after).to_string());
        }
        if let Some(line) = def.line_spacing {
            let line = (line * 240.0).round() as i64;
            set_val(spacing, "line", &line.to_string());
            set_val(spacing, "lineRule", "auto");
        }
    }
    if let Some(alignment) = def.alignment {
        set_val(ppr.ensure_child("jc", PPR_ORDER), "val", alignment.as_jc());
    }
}

fn has_run_properties(def: &StyleDefinition) -> bool {
    def.font.is_some()
        || def.size.is_some()
        || def.bold.is_some()
        || def.italic.is_some()
        || def.underline.is_some()
        || def.color.is_some()
}

fn has_paragraph_properties(def: &StyleDefinition) -> bool {
    def.alignment.is_some()
        || def.space_before.is_some()
        || def.space_after.is_some()
        || def.line_spacing.is_some()
}

pub fn apply_custom_styles(doc: &mut WordDocument, table: &StyleTable) -> TransformOutcome {
    if table.is_empty() {
        return TransformOutcome::default();
    }

    let mut outcome = for_each_content_part(doc, |part_name, root| {
        let mut outcome = TransformOutcome::default();
        for_each_paragraph_mut(root, &mut |paragraph, _| {
            let style_id = paragraph_style(paragraph).unwrap_or("Normal").to_string();
            let Some(def) = table.get(&style_id) else {
                return;
            };
            let before = paragraph.clone();

            if has_paragraph_properties(def) {
                apply_paragraph_properties(paragraph.ensure_properties("pPr"), def);
            }
            if has_run_properties(def) {
                let mark = paragraph.ensure_properties("pPr").ensure_child("rPr", PPR_ORDER);
                apply_run_properties(mark, def, false);
                for run in runs_mut(paragraph) {
                    apply_run_properties(run.ensure_properties("rPr"), def, true);
                }
            }

            if *paragraph != before {
                outcome.mutations += 1;
                outcome.change(
                    part_name,
                    style_id.clone(),
                    style_id.clone(),
                    format!("Applied {style_id} properties to paragraph and runs"),
                );
            }
        });
        outcome
    });

    match doc.styles_mut() {
        Some(styles) => {
            for (style_id, def) in table {
                let Some(style) = styles.ensure_paragraph_style(style_id) else {
                    continue;
                };
                if has_paragraph_properties(def) {
                    apply_paragraph_properties(style.ensure_child("pPr", STYLE_ORDER), def);
                }
                if has_run_properties(def) {
                    apply_run_properties(style.ensure_child("rPr", STYLE_ORDER), def, false);
                }
            }
        }
        None => outcome
            .warnings
            .push("Document has no styles part; only direct formatting was applied".to_string()),
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading_table() -> StyleTable {
        let mut table = StyleTable::new();
        table.insert(
            "Heading1".to_string(),
            StyleDefinition {
                font: Some("Arial".into()),
                size: Some(16.0),
                bold: Some(true),
                preserve_italic: true,
                italic: Some(false),
                alignment: Some(Alignment::Center),
                space_after: Some(6.0),
                color: Some("#1f3864".into()),
                ..StyleDefinition::default()
            },
        );
        table
    }

    #[test]
    fn applies_to_mark_and_every_run() {
        let mut doc = WordDocument::from_body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:rPr><w:i/><w:b w:val="0"/></w:rPr><w:t>Title</w:t></w:r><w:hyperlink r:id="rId1"><w:r><w:t>link</w:t></w:r></w:hyperlink></w:p><w:p><w:r><w:t>Body</w:t></w:r></w:p>"#,
        );
        let outcome = apply_custom_styles(&mut doc, &heading_table());
        assert_eq!(outcome.mutations, 1);
        assert_eq!(outcome.warnings.len(), 1);

        let p = doc.body().child("p").unwrap();
        let ppr = p.child("pPr").unwrap();
        let order: Vec<_> = ppr.elements().map(|el| el.local_name().to_string()).collect();
        assert_eq!(order, vec!["pStyle", "spacing", "jc", "rPr"]);
        assert_eq!(ppr.child("spacing").unwrap().attr("w:after"), Some("120"));
        assert_eq!(ppr.child("jc").unwrap().attr("w:val"), Some("center"));

        let first_rpr = p.child("r").unwrap().child("rPr").unwrap();
        // direct bold=0 overridden, italic preserved
        assert_eq!(first_rpr.child("b").unwrap().attr("w:val"), None);
        assert!(first_rpr.has_child("i"));
        assert_eq!(first_rpr.child("sz").unwrap().attr("w:val"), Some("32"));
        assert_eq!(first_rpr.child("color").unwrap().attr("w:val"), Some("1F3864"));

        let link_run = p.child("hyperlink").unwrap().child("r").unwrap();
        let link_rpr = link_run.child("rPr").unwrap();
        assert_eq!(link_rpr.child("rFonts").unwrap().attr("w:ascii"), Some("Arial"));
        assert_eq!(link_rpr.child("i").unwrap().attr("w:val"), Some("0"));
    }

    #[test]
    fn unstyled_paragraphs_count_as_normal_and_reapplying_is_stable() {
        let mut table = StyleTable::new();
        table.insert(
            "Normal".to_string(),
            StyleDefinition {
                font: Some("Calibri".into()),
                size: Some(11.0),
                ..StyleDefinition::default()
            },
        );
        let mut doc = WordDocument::with_parts(
            r#"<w:p><w:r><w:t>Body</w:t></w:r></w:p>"#,
            &[(
                "word/styles.xml",
                r#"<w:styles xmlns:w="urn:w"><w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#,
            )],
        );
        assert_eq!(apply_custom_styles(&mut doc, &table).mutations, 1);
        assert_eq!(apply_custom_styles(&mut doc, &table).mutations, 0);

        let normal = doc.styles().unwrap().find_style("Normal").unwrap();
        assert_eq!(
            normal.child("rPr").unwrap().child("sz").unwrap().attr("w:val"),
            Some("22")
        );
    }
}
