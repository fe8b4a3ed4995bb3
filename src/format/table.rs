//! Table header shading and emphasis

use serde::{Deserialize, Serialize};

use super::{TransformOutcome, for_each_content_part};
use crate::document::WordDocument;
use crate::document::parts::content::{paragraph_text, runs_mut};
use crate::xml::{ElementKind, PPR_ORDER, RPR_ORDER, TCPR_ORDER, XmlElement};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Fill for every cell of the first row, hex RGB
    pub header_shading: Option<String>,
    pub header_bold: bool,
    /// Fill for the remaining rows, hex RGB
    pub body_shading: Option<String>,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            header_shading: Some("D9D9D9".to_string()),
            header_bold: true,
            body_shading: None,
        }
    }
}

fn normalize_hex(color: &str) -> String {
    color.trim().trim_start_matches('#').to_ascii_uppercase()
}

fn shade_cell(cell: &mut XmlElement, fill: &str) {
    let tc_pr = cell.ensure_properties("tcPr");
    let shd = tc_pr.ensure_child("shd", TCPR_ORDER);
    for (local, value) in [("val", "clear"), ("color", "auto"), ("fill", fill)] {
        let attr = shd.qualify(local);
        shd.set_attr(attr, value);
    }
}

fn set_bold(rpr: &mut XmlElement) {
    let bold = rpr.ensure_child("b", RPR_ORDER);
    let attr = bold.qualify("val");
    bold.remove_attr(&attr);
}

fn embolden_cell(cell: &mut XmlElement) {
    for paragraph in cell.elements_mut().filter(|el| el.kind() == ElementKind::Paragraph) {
        set_bold(paragraph.ensure_properties("pPr").ensure_child("rPr", PPR_ORDER));
        for run in runs_mut(paragraph) {
            set_bold(run.ensure_properties("rPr"));
        }
    }
}

fn cell_text(cell: &XmlElement) -> String {
    cell.elements()
        .filter(|el| el.kind() == ElementKind::Paragraph)
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cells of a row, including those wrapped in row-level content controls
fn cells_mut(row: &mut XmlElement) -> Vec<&mut XmlElement> {
    fn collect<'a>(el: &'a mut XmlElement, out: &mut Vec<&'a mut XmlElement>) {
        for child in el.elements_mut() {
            match child.kind() {
                ElementKind::TableCell => out.push(child),
                ElementKind::ContentControl | ElementKind::ContentControlContent => {
                    collect(child, out)
                }
                _ => {}
            }
        }
    }
    let mut out = Vec::new();
    collect(row, &mut out);
    out
}

/// Format one table and any tables nested in its cells; returns changed cells
fn format_table(
    table: &mut XmlElement,
    settings: &TableSettings,
    header_fill: Option<&str>,
    body_fill: Option<&str>,
    header_cells: &mut Vec<String>,
) -> usize {
    let mut mutations = 0;
    let rows = table
        .elements_mut()
        .filter(|el| el.kind() == ElementKind::TableRow);
    for (index, row) in rows.enumerate() {
        for cell in cells_mut(row) {
            let before = cell.clone();
            if index == 0 {
                if let Some(fill) = header_fill {
                    shade_cell(cell, fill);
                }
                if settings.header_bold {
                    embolden_cell(cell);
                }
            } else if let Some(fill) = body_fill {
                shade_cell(cell, fill);
            }

            for nested in cell.elements_mut().filter(|el| el.kind() == ElementKind::Table) {
                mutations += format_table(nested, settings, header_fill, body_fill, header_cells);
            }

            if *cell != before {
                mutations += 1;
                if index == 0 {
                    header_cells.push(cell_text(cell));
                }
            }
        }
    }
    mutations
}

pub fn format_tables(doc: &mut WordDocument, settings: &TableSettings) -> TransformOutcome {
    let header_fill = settings.header_shading.as_deref().map(normalize_hex);
    let body_fill = settings.body_shading.as_deref().map(normalize_hex);
    if header_fill.is_none() && body_fill.is_none() && !settings.header_bold {
        return TransformOutcome::default();
    }

    for_each_content_part(doc, |part_name, root| {
        let mut outcome = TransformOutcome::default();
        let mut stack = vec![root];
        while let Some(el) = stack.pop() {
            if el.kind() == ElementKind::Table {
                let mut header_cells = Vec::new();
                let changed = format_table(
                    el,
                    settings,
                    header_fill.as_deref(),
                    body_fill.as_deref(),
                    &mut header_cells,
                );
                if changed > 0 {
                    outcome.mutations += changed;
                    outcome.change(
                        part_name,
                        header_cells.join(" | "),
                        header_cells.join(" | "),
                        format!("Formatted table ({changed} cells)"),
                    );
                }
                continue;
            }
            match el.kind() {
                ElementKind::Paragraph
                | ElementKind::Drawing
                | ElementKind::Picture
                | ElementKind::Object => {}
                _ => stack.extend(el.elements_mut()),
            }
        }
        outcome
    })
}
