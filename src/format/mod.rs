//! Formatting transformers
//!
//! Each pass mutates a [`WordDocument`] in place and reports a
//! [`TransformOutcome`]. Passes are independent; the only ordering constraint is
//! that paragraph style assignment runs before custom style injection, which the
//! default operation priorities guarantee.

pub mod blank;
pub mod bullets;
pub mod custom_style;
pub mod list_indent;
pub mod paragraph_style;
pub mod replace;
pub mod table;
pub mod whitespace;

use serde::Serialize;

use crate::document::WordDocument;
use crate::processor::Change;
use crate::xml::XmlElement;

pub use bullets::{BulletSettings, BulletTarget};
pub use custom_style::{Alignment, StyleDefinition, StyleTable};
pub use list_indent::{IndentLevel, IndentationTable};
pub use paragraph_style::HeadingStyles;
pub use replace::ReplacementRule;
pub use table::TableSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutcome {
    pub mutations: usize,
    pub changes: Vec<Change>,
    pub warnings: Vec<String>,
}

impl TransformOutcome {
    pub fn merge(&mut self, other: TransformOutcome) {
        self.mutations += other.mutations;
        self.changes.extend(other.changes);
        self.warnings.extend(other.warnings);
    }

    pub fn change(
        &mut self,
        part: &str,
        before: impl Into<String>,
        after: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.changes.push(Change {
            part: part.to_string(),
            before: before.into(),
            after: after.into(),
            description: description.into(),
        });
    }
}

/// Run `pass` over the root of every content part, marking parts it mutated
pub(crate) fn for_each_content_part(
    doc: &mut WordDocument,
    mut pass: impl FnMut(&str, &mut XmlElement) -> TransformOutcome,
) -> TransformOutcome {
    let mut total = TransformOutcome::default();
    for part in doc.content_parts_mut() {
        let name = part.name.clone();
        let Some(root) = part.root_mut() else {
            continue;
        };
        let outcome = pass(&name, root);
        if outcome.mutations > 0 {
            part.mark_dirty();
        }
        total.merge(outcome);
    }
    total
}

pub const TWIPS_PER_INCH: f64 = 1440.0;
pub const TWIPS_PER_POINT: f64 = 20.0;

pub fn inches_to_twips(inches: f64) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}

pub fn points_to_twips(points: f64) -> i64 {
    (points * TWIPS_PER_POINT).round() as i64
}

/// Font sizes are stored in half-points
pub fn points_to_half_points(points: f64) -> i64 {
    (points * 2.0).round() as i64
}
