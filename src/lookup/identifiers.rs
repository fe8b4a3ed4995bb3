//! Identifier extraction from hyperlink URLs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::hyperlink::{Hyperlink, LinkType};

// Content IDs: "TSRC-ABC-123456", "CMS-Policy-000042"
static CONTENT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(TSRC|CMS)-([a-zA-Z0-9]+)-(\d{6})").unwrap());

// Document IDs: value of docid= up to the first character outside [A-Za-z0-9-]
static DOCUMENT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)docid=([a-zA-Z0-9-]+)(?:[^a-zA-Z0-9-]|$)").unwrap());

/// At most one identifier of each kind per URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIdentifiers {
    pub content_id: Option<String>,
    pub document_id: Option<String>,
}

impl LinkIdentifiers {
    pub fn is_empty(&self) -> bool {
        self.content_id.is_none() && self.document_id.is_none()
    }

    /// Content ID first, then Document ID
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.content_id
            .as_deref()
            .into_iter()
            .chain(self.document_id.as_deref())
    }
}

pub fn extract_identifiers(url: &str) -> LinkIdentifiers {
    LinkIdentifiers {
        content_id: CONTENT_ID_PATTERN
            .find(url)
            .map(|m| m.as_str().to_string()),
        document_id: DOCUMENT_ID_PATTERN
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
    }
}

/// Only links that can point at managed content are looked up
pub fn is_lookup_candidate(link: &Hyperlink) -> bool {
    matches!(link.link_type, LinkType::External | LinkType::Internal)
}

/// Deduplicated identifiers across links, first occurrence wins
pub fn collect_lookup_ids(links: &[Hyperlink]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for link in links.iter().filter(|link| is_lookup_candidate(link)) {
        let identifiers = extract_identifiers(&link.url);
        for id in identifiers.ids() {
            if !ids.iter().any(|seen| seen.eq_ignore_ascii_case(id)) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

/// Trailing six digits of a content ID
pub fn last_six_digits(content_id: &str) -> Option<&str> {
    let trimmed = content_id.trim();
    let start = trimmed.len().checked_sub(6)?;
    let tail = trimmed.get(start..)?;
    tail.chars().all(|c| c.is_ascii_digit()).then_some(tail)
}

/// Case-insensitive key used by the cache and the result index
pub(crate) fn cache_key(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}
