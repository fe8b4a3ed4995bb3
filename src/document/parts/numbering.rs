//! `word/numbering.xml`
//!
//! List instances (`w:num`) point at reusable abstract definitions
//! (`w:abstractNum`), each holding up to nine levels (`w:lvl`).

use crate::error::PersistenceError;
use crate::xml::{XmlDocument, XmlElement};

pub const NUMBERING_PART: &str = "word/numbering.xml";

/// Read model of one `w:lvl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingLevel {
    pub ilvl: u8,
    pub format: String,
    pub text: Option<String>,
    pub left: Option<i64>,
    pub hanging: Option<i64>,
    pub font: Option<String>,
}

impl NumberingLevel {
    pub fn from_element(lvl: &XmlElement) -> Self {
        let ind = lvl.child("pPr").and_then(|ppr| ppr.child("ind"));
        let twips = |name: &str| {
            ind.and_then(|ind| ind.attr_local(name))
                .and_then(|v| v.parse::<i64>().ok())
        };
        Self {
            ilvl: lvl
                .attr_local("ilvl")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            format: lvl
                .child("numFmt")
                .and_then(|el| el.attr_local("val"))
                .unwrap_or("decimal")
                .to_string(),
            text: lvl
                .child("lvlText")
                .and_then(|el| el.attr_local("val"))
                .map(str::to_string),
            left: twips("left").or_else(|| twips("start")),
            hanging: twips("hanging"),
            font: level_font(lvl).map(str::to_string),
        }
    }

    pub fn is_bullet(&self) -> bool {
        self.format == "bullet"
    }
}

/// Font of the level's glyph (`w:rPr/w:rFonts`)
pub fn level_font(lvl: &XmlElement) -> Option<&str> {
    let fonts = lvl.child("rPr")?.child("rFonts")?;
    fonts
        .attr_local("ascii")
        .or_else(|| fonts.attr_local("hAnsi"))
        .or_else(|| fonts.attr_local("cs"))
}

#[derive(Debug, Clone)]
pub struct NumberingPart {
    pub name: String,
    xml: XmlDocument,
    dirty: bool,
}

impl NumberingPart {
    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self, PersistenceError> {
        let name = name.into();
        let xml = XmlDocument::parse(bytes).map_err(|source| PersistenceError::Xml {
            part: name.clone(),
            source,
        })?;
        Ok(Self {
            name,
            xml,
            dirty: false,
        })
    }

    fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.xml
            .root()
            .into_iter()
            .flat_map(|root| root.elements())
            .filter(move |el| el.local_name() == local)
    }

    /// Abstract definition id behind a list instance
    pub fn abstract_id_for(&self, num_id: &str) -> Option<&str> {
        self.children_named("num")
            .find(|num| num.attr_local("numId") == Some(num_id))
            .and_then(|num| num.child("abstractNumId"))
            .and_then(|el| el.attr_local("val"))
    }

    pub fn abstract_ids(&self) -> Vec<String> {
        self.children_named("abstractNum")
            .filter_map(|el| el.attr_local("abstractNumId"))
            .map(str::to_string)
            .collect()
    }

    /// Resolve `(numId, ilvl)` to its level definition
    pub fn level(&self, num_id: &str, ilvl: u8) -> Option<NumberingLevel> {
        let abstract_id = self.abstract_id_for(num_id)?;
        let abstract_num = self
            .children_named("abstractNum")
            .find(|el| el.attr_local("abstractNumId") == Some(abstract_id))?;
        abstract_num
            .elements()
            .filter(|el| el.local_name() == "lvl")
            .map(NumberingLevel::from_element)
            .find(|level| level.ilvl == ilvl)
    }

    /// Apply `edit` to every `w:lvl` of every abstract definition; `edit`
    /// returns whether it changed the level. Returns the number of changed levels.
    pub fn edit_levels(&mut self, mut edit: impl FnMut(&str, &mut XmlElement) -> bool) -> usize {
        let Some(root) = self.xml.root_mut() else {
            return 0;
        };
        let mut changed = 0;
        for abstract_num in root
            .elements_mut()
            .filter(|el| el.local_name() == "abstractNum")
        {
            let abstract_id = abstract_num
                .attr_local("abstractNumId")
                .unwrap_or_default()
                .to_string();
            for lvl in abstract_num
                .elements_mut()
                .filter(|el| el.local_name() == "lvl")
            {
                if edit(&abstract_id, lvl) {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        self.xml.to_bytes().map_err(|source| PersistenceError::Xml {
            part: self.name.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERING: &[u8] = br#"<w:numbering xmlns:w="urn:w"><w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="&#61623;"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr><w:rPr><w:rFonts w:ascii="Symbol" w:hAnsi="Symbol" w:hint="default"/></w:rPr></w:lvl><w:lvl w:ilvl="1"><w:numFmt w:val="lowerLetter"/><w:lvlText w:val="%2."/></w:lvl></w:abstractNum><w:num w:numId="3"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#;

    #[test]
    fn resolves_levels_through_list_instances() {
        let numbering = NumberingPart::parse(NUMBERING_PART, NUMBERING).unwrap();
        assert_eq!(numbering.abstract_id_for("3"), Some("0"));
        assert_eq!(numbering.abstract_ids(), vec!["0"]);

        let level = numbering.level("3", 0).unwrap();
        assert!(level.is_bullet());
        assert_eq!(level.left, Some(720));
        assert_eq!(level.hanging, Some(360));
        assert_eq!(level.font.as_deref(), Some("Symbol"));
        assert_eq!(level.text.as_deref(), Some("\u{F0B7}"));

        let second = numbering.level("3", 1).unwrap();
        assert!(!second.is_bullet());
        assert!(numbering.level("9", 0).is_none());
    }

    #[test]
    fn edit_levels_marks_dirty_only_on_change() {
        let mut numbering = NumberingPart::parse(NUMBERING_PART, NUMBERING).unwrap();
        assert_eq!(numbering.edit_levels(|_, _| false), 0);
        assert!(!numbering.is_dirty());

        let changed = numbering.edit_levels(|abstract_id, lvl| {
            assert_eq!(abstract_id, "0");
            lvl.set_attr("w:tplc", "x");
            true
        });
        assert_eq!(changed, 2);
        assert!(numbering.is_dirty());
    }
}
