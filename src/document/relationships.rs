//! Relationship parts (`*.rels`)
//!
//! Each source part `dir/name.xml` owns the relationship part
//! `dir/_rels/name.xml.rels` (OPC part 2, §9.3.3). Headers and footers follow the
//! same rule, e.g. `word/header1.xml` -> `word/_rels/header1.xml.rels`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub const REL_TYPE_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
pub const REL_TYPE_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub const REL_TYPE_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub const REL_TYPE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_TYPE_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
pub const REL_TYPE_FONT_TABLE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/fontTable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: TargetMode,
}

impl Relationship {
    pub fn is_hyperlink(&self) -> bool {
        self.rel_type == REL_TYPE_HYPERLINK || self.rel_type.ends_with("/hyperlink")
    }

    /// Last path segment of the relationship type (`hyperlink`, `header`, ...)
    pub fn short_type(&self) -> &str {
        self.rel_type.rsplit('/').next().unwrap_or(&self.rel_type)
    }
}

/// Relationships of one source part, kept alongside the parsed XML so edits
/// preserve everything else in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSet {
    part_name: String,
    relationships: Vec<Relationship>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
    xml: XmlDocument,
    dirty: bool,
}

impl RelationshipSet {
    pub fn empty(part_name: impl Into<String>) -> Self {
        let root = XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NAMESPACE);
        Self {
            part_name: part_name.into(),
            relationships: Vec::new(),
            index: HashMap::new(),
            duplicates: Vec::new(),
            xml: XmlDocument::with_root(root),
            dirty: false,
        }
    }

    pub fn parse(part_name: impl Into<String>, bytes: &[u8]) -> Result<Self, PersistenceError> {
        let part_name = part_name.into();
        let xml = XmlDocument::parse(bytes).map_err(|source| PersistenceError::Xml {
            part: part_name.clone(),
            source,
        })?;

        let mut set = Self {
            part_name,
            relationships: Vec::new(),
            index: HashMap::new(),
            duplicates: Vec::new(),
            xml,
            dirty: false,
        };

        let parsed: Vec<Relationship> = set
            .xml
            .root()
            .map(|root| {
                root.elements()
                    .filter(|el| el.local_name() == "Relationship")
                    .filter_map(relationship_from_element)
                    .collect()
            })
            .unwrap_or_default();

        for relationship in parsed {
            if set.index.contains_key(&relationship.id) {
                set.duplicates.push(relationship.id.clone());
                continue;
            }
            set.index
                .insert(relationship.id.clone(), set.relationships.len());
            set.relationships.push(relationship);
        }

        Ok(set)
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.index.get(id).map(|&i| &self.relationships[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Ids that appeared more than once; only the first occurrence is indexed
    pub fn duplicate_ids(&self) -> &[String] {
        &self.duplicates
    }

    pub fn by_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.relationships
            .iter()
            .filter(move |rel| rel.rel_type == rel_type)
    }

    /// Rewrite the target of a relationship; returns false when the id is unknown
    pub fn set_target(&mut self, id: &str, target: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        if self.relationships[i].target == target {
            return true;
        }
        self.relationships[i].target = target.to_string();

        if let Some(root) = self.xml.root_mut() {
            if let Some(el) = root
                .elements_mut()
                .find(|el| el.local_name() == "Relationship" && el.attr("Id") == Some(id))
            {
                el.set_attr("Target", target);
            }
        }
        self.dirty = true;
        true
    }

    /// Append a relationship with a fresh `rIdN` id
    pub fn add(&mut self, rel_type: &str, target: &str, target_mode: TargetMode) -> String {
        let mut n = self.relationships.len() + 1;
        let id = loop {
            let candidate = format!("rId{n}");
            if !self.index.contains_key(&candidate) && !self.duplicates.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        let mut el = XmlElement::new("Relationship")
            .with_attr("Id", id.as_str())
            .with_attr("Type", rel_type)
            .with_attr("Target", target);
        if target_mode == TargetMode::External {
            el.set_attr("TargetMode", "External");
        }
        if let Some(root) = self.xml.root_mut() {
            root.children.push(XmlNode::Element(el));
        }

        self.index.insert(id.clone(), self.relationships.len());
        self.relationships.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode,
        });
        self.dirty = true;
        id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        self.xml.to_bytes().map_err(|source| PersistenceError::Xml {
            part: self.part_name.clone(),
            source,
        })
    }
}

fn relationship_from_element(el: &XmlElement) -> Option<Relationship> {
    let id = el.attr("Id")?.to_string();
    let target_mode = match el.attr("TargetMode") {
        Some(mode) if mode.eq_ignore_ascii_case("external") => TargetMode::External,
        _ => TargetMode::Internal,
    };
    Some(Relationship {
        id,
        rel_type: el.attr("Type").unwrap_or_default().to_string(),
        target: el.attr("Target").unwrap_or_default().to_string(),
        target_mode,
    })
}

/// Relationship part name for a source part
pub fn rels_for_part(part: &str) -> String {
    let part = part.strip_prefix('/').unwrap_or(part);
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve an internal relationship target against its source part
pub fn resolve_target(source_part: &str, target: &str) -> String {
    // Part names carry no fragment
    let target = target.split('#').next().unwrap_or(target);
    if target.is_empty() {
        return normalize(source_part);
    }
    if let Some(target) = target.strip_prefix('/') {
        return normalize(target);
    }

    let base_dir = source_part
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}
