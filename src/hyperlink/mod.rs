//! Hyperlink model, extraction across content parts, and repair

pub mod extract;
pub mod fixer;
pub mod model;

pub use extract::{ExtractionReport, extract_document, extract_part};
pub use fixer::{FixOutcome, fix_hyperlinks};
pub use model::{Hyperlink, LinkType};
