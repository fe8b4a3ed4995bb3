//! Bullet glyph and number format uniformity on abstract numbering levels

use serde::{Deserialize, Serialize};

use super::TransformOutcome;
use crate::document::WordDocument;
use crate::document::parts::numbering::{NumberingLevel, level_font};
use crate::xml::{LVL_ORDER, RPR_ORDER, XmlElement};

/// Fonts whose glyphs live in the private-use area
pub const SPECIAL_FONTS: &[&str] = &[
    "Symbol",
    "Wingdings",
    "Wingdings 2",
    "Wingdings 3",
    "Webdings",
    "Zapf Dingbats",
    "MT Extra",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletTarget {
    #[default]
    Bullets,
    Numbers,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletSettings {
    pub target: BulletTarget,
    /// Glyph written to bullet levels
    pub bullet_char: String,
    /// `numFmt` written to numbered levels (`decimal`, `lowerLetter`, ...)
    pub number_format: Option<String>,
    /// Replaces a special font when the glyph is not a private-use character
    pub standard_font: String,
}

impl Default for BulletSettings {
    fn default() -> Self {
        Self {
            target: BulletTarget::Bullets,
            bullet_char: "\u{2022}".to_string(),
            number_format: None,
            standard_font: "Calibri".to_string(),
        }
    }
}

impl BulletSettings {
    fn bullets(&self) -> bool {
        matches!(self.target, BulletTarget::Bullets | BulletTarget::Both)
    }

    fn numbers(&self) -> bool {
        matches!(self.target, BulletTarget::Numbers | BulletTarget::Both)
    }
}

pub fn is_special_font(font: &str) -> bool {
    SPECIAL_FONTS.iter().any(|special| special.eq_ignore_ascii_case(font.trim()))
}

pub fn is_private_use(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| ('\u{E000}'..='\u{F8FF}').contains(&c))
}

fn set_child_val(lvl: &mut XmlElement, local: &str, value: &str) -> bool {
    let child = lvl.ensure_child(local, LVL_ORDER);
    let attr = child.qualify("val");
    if child.attr(&attr) == Some(value) {
        return false;
    }
    child.set_attr(attr, value);
    true
}

fn replace_font(lvl: &mut XmlElement, font: &str) -> bool {
    let Some(fonts) = lvl
        .child_mut("rPr")
        .map(|rpr| rpr.ensure_child("rFonts", RPR_ORDER))
    else {
        return false;
    };
    let mut changed = false;
    for local in ["ascii", "hAnsi", "cs"] {
        let attr = fonts.qualify(local);
        if fonts.attr(&attr) != Some(font) {
            fonts.set_attr(attr, font);
            changed = true;
        }
    }
    changed
}

pub fn apply_bullet_uniformity(doc: &mut WordDocument, settings: &BulletSettings) -> TransformOutcome {
    let mut outcome = TransformOutcome::default();
    let Some(numbering) = doc.numbering_mut() else {
        outcome
            .warnings
            .push("Document has no numbering part; no list levels to update".to_string());
        return outcome;
    };
    let part_name = numbering.name.clone();

    let mut font_substituted = false;
    let mut changes = Vec::new();
    let changed_levels = numbering.edit_levels(|abstract_id, lvl| {
        let level = NumberingLevel::from_element(lvl);
        let mut changed = false;

        if level.is_bullet() {
            if !settings.bullets() || settings.bullet_char.is_empty() {
                return false;
            }
            changed |= set_child_val(lvl, "lvlText", &settings.bullet_char);
            if let Some(font) = level_font(lvl).map(str::to_string) {
                if is_special_font(&font) && !is_private_use(&settings.bullet_char) {
                    changed |= replace_font(lvl, &settings.standard_font);
                    font_substituted = true;
                }
            }
            if changed {
                changes.push((
                    level.text.clone().unwrap_or_default(),
                    settings.bullet_char.clone(),
                    format!("Bullet glyph of abstract list {abstract_id} level {}", level.ilvl),
                ));
            }
        } else if level.format != "none" {
            let Some(format) = settings.number_format.as_deref().filter(|_| settings.numbers())
            else {
                return false;
            };
            changed |= set_child_val(lvl, "numFmt", format);
            if changed {
                changes.push((
                    level.format.clone(),
                    format.to_string(),
                    format!("Number format of abstract list {abstract_id} level {}", level.ilvl),
                ));
            }
        }
        changed
    });

    outcome.mutations = changed_levels;
    for (before, after, description) in changes {
        outcome.change(&part_name, before, after, description);
    }

    if font_substituted {
        if let Some(fonts) = doc.font_table_mut() {
            fonts.ensure_font(&settings.standard_font);
        }
    }
    outcome
}
