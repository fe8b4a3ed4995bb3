//! Whitespace normalization
//!
//! Within each paragraph:
//! - runs of space variants (U+0020, U+00A0, U+2002, U+2003, U+2009, U+202F)
//!   collapse to a single ordinary space, across run boundaries too;
//! - leading spaces at the start of the paragraph are removed (tabs are kept);
//! - text right after a small inline graphic starts with exactly one space.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{TransformOutcome, for_each_content_part};
use crate::document::WordDocument;
use crate::document::parts::content::{
    for_each_paragraph_mut, paragraph_text, runs_mut, set_text_preserving_space,
};
use crate::xml::{ElementKind, Walk, XmlElement, walk};

static SPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{0020}\u{00A0}\u{2002}\u{2003}\u{2009}\u{202F}]+").unwrap());

/// Inline graphics up to one inch square count as "small"
pub const SMALL_GRAPHIC_EMU: i64 = 914_400;

pub fn normalize_whitespace(doc: &mut WordDocument) -> TransformOutcome {
    for_each_content_part(doc, |part_name, root| {
        let mut outcome = TransformOutcome::default();
        for_each_paragraph_mut(root, &mut |paragraph, _| {
            let before = paragraph_text(paragraph);
            let mutations = normalize_paragraph(paragraph);
            if mutations > 0 {
                outcome.mutations += mutations;
                outcome.change(
                    part_name,
                    before,
                    paragraph_text(paragraph),
                    "Normalized whitespace",
                );
            }
        });
        outcome
    })
}

#[derive(Debug, Clone, Copy)]
struct ScanState {
    at_start: bool,
    after_space: bool,
    after_small_graphic: bool,
}

/// Normalize one paragraph, returning the number of `w:t` elements rewritten
pub fn normalize_paragraph(paragraph: &mut XmlElement) -> usize {
    let mut state = ScanState {
        at_start: true,
        after_space: false,
        after_small_graphic: false,
    };
    let mut mutations = 0;

    for run in runs_mut(paragraph) {
        for child in run.elements_mut() {
            match child.kind() {
                ElementKind::Text => {
                    let original = child.text();
                    let normalized = normalize_text(&original, &mut state);
                    if normalized != original {
                        set_text_preserving_space(child, &normalized);
                        mutations += 1;
                    }
                }
                ElementKind::Tab | ElementKind::Break => {
                    state.at_start = false;
                    state.after_space = false;
                    state.after_small_graphic = false;
                }
                ElementKind::Drawing | ElementKind::Picture | ElementKind::Object => {
                    state.at_start = false;
                    state.after_space = false;
                    state.after_small_graphic = is_small_inline_graphic(child);
                }
                _ => {}
            }
        }
    }

    mutations
}

fn normalize_text(text: &str, state: &mut ScanState) -> String {
    let mut out = SPACE_RUN.replace_all(text, " ").into_owned();

    if state.at_start || state.after_space {
        out = out.trim_start_matches(' ').to_string();
    }
    if state.after_small_graphic && !out.is_empty() && !out.starts_with(' ') {
        out.insert(0, ' ');
    }

    if !out.is_empty() {
        state.at_start = false;
        state.after_space = out.ends_with(' ');
        state.after_small_graphic = false;
    }
    out
}

/// A `wp:inline` drawing no larger than one inch in either dimension
pub fn is_small_inline_graphic(drawing: &XmlElement) -> bool {
    let mut small = false;
    walk(drawing, &mut |el| {
        if el.local_name() == "inline" {
            if let Some(extent) = el.child("extent") {
                let dimension = |name: &str| {
                    extent
                        .attr_local(name)
                        .and_then(|v| v.parse::<i64>().ok())
                        .unwrap_or(i64::MAX)
                };
                small = dimension("cx") <= SMALL_GRAPHIC_EMU && dimension("cy") <= SMALL_GRAPHIC_EMU;
            }
            return Walk::SkipChildren;
        }
        Walk::Continue
    });
    small
}
