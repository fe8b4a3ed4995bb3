//! Typed processors for the XML parts of a Word package

pub mod content;
pub mod fonts;
pub mod numbering;
pub mod styles;

pub use content::{ContentKind, ContentPart, ParagraphContext};
pub use fonts::{FONT_TABLE_PART, FontTablePart};
pub use numbering::{NUMBERING_PART, NumberingLevel, NumberingPart};
pub use styles::{STYLES_PART, StylesPart};
