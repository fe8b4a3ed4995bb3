//! Hyperlink extraction and relationship consistency checks

use std::collections::HashSet;

use reqwest::Url;

use super::model::{Hyperlink, LinkType};
use crate::document::{ContentPart, WordDocument};
use crate::error::ValidationError;
use crate::xml::{ElementKind, Walk, XmlElement, walk};

#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub hyperlinks: Vec<Hyperlink>,
    pub issues: Vec<ValidationError>,
}

impl ExtractionReport {
    fn merge(&mut self, other: ExtractionReport) {
        self.hyperlinks.extend(other.hyperlinks);
        self.issues.extend(other.issues);
    }
}

/// `w:hyperlink` elements of a tree in document order
pub fn hyperlink_elements(root: &XmlElement) -> Vec<&XmlElement> {
    fn collect<'a>(el: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
        for child in el.elements() {
            if child.kind() == ElementKind::Hyperlink {
                out.push(child);
            } else {
                collect(child, out);
            }
        }
    }
    let mut out = Vec::new();
    collect(root, &mut out);
    out
}

/// Mutable counterpart of [`hyperlink_elements`], same order
pub fn hyperlink_elements_mut(root: &mut XmlElement) -> Vec<&mut XmlElement> {
    fn collect<'a>(el: &'a mut XmlElement, out: &mut Vec<&'a mut XmlElement>) {
        for child in el.elements_mut() {
            if child.kind() == ElementKind::Hyperlink {
                out.push(child);
            } else {
                collect(child, out);
            }
        }
    }
    let mut out = Vec::new();
    collect(root, &mut out);
    out
}

/// Concatenated `w:t` text under a hyperlink, tracked insertions included and
/// deletions excluded
pub fn display_text(hyperlink: &XmlElement) -> String {
    let mut text = String::new();
    for child in hyperlink.elements() {
        walk(child, &mut |el| match el.kind() {
            ElementKind::Deletion | ElementKind::MoveFrom => Walk::SkipChildren,
            ElementKind::Text => {
                text.push_str(&el.text());
                Walk::SkipChildren
            }
            _ => Walk::Continue,
        });
    }
    text
}

pub fn extract_part(part: &ContentPart) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    let Some(root) = part.root() else {
        return report;
    };

    let mut referenced: HashSet<&str> = HashSet::new();

    for (ordinal, el) in hyperlink_elements(root).into_iter().enumerate() {
        let relationship_id = el.attr_local("id").map(str::to_string);
        let anchor = el.attr_local("anchor").map(str::to_string);

        let (url, is_valid) = match (&relationship_id, &anchor) {
            (Some(rid), _) => match part.relationships.get(rid) {
                Some(rel) => {
                    referenced.insert(rel.id.as_str());
                    let url = match &anchor {
                        Some(anchor) if !rel.target.contains('#') => {
                            format!("{}#{anchor}", rel.target)
                        }
                        _ => rel.target.clone(),
                    };
                    (url, true)
                }
                None => {
                    report.issues.push(ValidationError::MissingRelationship {
                        part: part.name.clone(),
                        id: rid.clone(),
                    });
                    (String::new(), false)
                }
            },
            (None, Some(anchor)) => (format!("#{anchor}"), true),
            // No target at all; reported by diagnostics
            (None, None) => (String::new(), false),
        };

        let link_type = LinkType::classify(&url);
        let mut is_valid = is_valid && !url.trim().is_empty();
        if link_type == LinkType::External {
            if let Err(err) = Url::parse(url.trim()) {
                report.issues.push(ValidationError::InvalidUrl {
                    url: url.clone(),
                    reason: err.to_string(),
                });
                is_valid = false;
            }
        }
        report.hyperlinks.push(Hyperlink {
            id: format!("{}#{ordinal}", part.name),
            relationship_id,
            anchor,
            part: part.name.clone(),
            ordinal,
            display_text: display_text(el),
            is_internal: matches!(link_type, LinkType::Internal | LinkType::Bookmark),
            is_valid,
            link_type,
            url,
        });
    }

    for rel in part.relationships.iter() {
        if rel.is_hyperlink() && !referenced.contains(rel.id.as_str()) {
            report.issues.push(ValidationError::OrphanedRelationship {
                part: part.name.clone(),
                id: rel.id.clone(),
            });
        }
    }
    for id in part.relationships.duplicate_ids() {
        report.issues.push(ValidationError::DuplicateRelationship {
            part: part.name.clone(),
            id: id.clone(),
        });
    }

    report
}

/// Hyperlinks of the body, headers and footers, in that order
pub fn extract_document(doc: &WordDocument) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    for part in doc.content_parts() {
        report.merge(extract_part(part));
    }
    report
}
