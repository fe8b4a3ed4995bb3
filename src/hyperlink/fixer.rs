//! Applies resolution results to hyperlinks
//!
//! Targets are rewritten to the canonical view URL and display text is rebuilt
//! as `{title} ({last 6 digits of content id})`, with ` - Expired` for expired
//! or deprecated content. Links whose identifiers did not resolve get
//! ` - Not Found`. Links without identifiers are never touched.

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::extract::hyperlink_elements_mut;
use super::model::Hyperlink;
use crate::document::WordDocument;
use crate::document::parts::content::replace_runs_text;
use crate::lookup::identifiers::{extract_identifiers, is_lookup_candidate, last_six_digits};
use crate::lookup::{LookupResult, LookupStatus, Resolution};
use crate::processor::{Change, ProcessedLink};

pub const EXPIRED_SUFFIX: &str = " - Expired";
pub const NOT_FOUND_SUFFIX: &str = " - Not Found";

// One or more trailing status markers from earlier runs
static STATUS_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\s*-\s*(?:expired|not\s+found))+\s*$").unwrap());

// Trailing "(123456)"
static CONTENT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\d{6}\)\s*$").unwrap());

#[derive(Debug, Clone, Default)]
pub struct FixOutcome {
    pub processed: usize,
    pub modified: usize,
    pub skipped: usize,
    pub links: Vec<ProcessedLink>,
    pub changes: Vec<Change>,
}

pub fn canonical_url(base: &str, document_id: &str) -> String {
    format!("{base}#!/view?docid={document_id}")
}

fn strip_status(text: &str) -> String {
    STATUS_SUFFIX.replace(text, "").into_owned()
}

/// Display text for a resolved link
pub fn rebuild_display_text(current: &str, result: &LookupResult) -> String {
    let without_status = strip_status(current);
    let without_id = CONTENT_SUFFIX.replace(&without_status, "");
    let base = without_id.trim();

    let title = result.title.trim();
    let mut text = if !title.is_empty() && title != base {
        title.to_string()
    } else {
        base.to_string()
    };

    if let Some(digits) = last_six_digits(&result.content_id) {
        let _ = write!(text, " ({digits})");
    }
    if result.status.is_expired() {
        text.push_str(EXPIRED_SUFFIX);
    }
    text
}

/// Display text for a link whose identifiers did not resolve
pub fn mark_not_found(current: &str) -> String {
    let base = strip_status(current);
    format!("{}{NOT_FOUND_SUFFIX}", base.trim_end())
}

pub fn fix_hyperlinks(
    doc: &mut WordDocument,
    links: &[Hyperlink],
    resolution: &Resolution,
    canonical_base: &str,
) -> FixOutcome {
    let mut outcome = FixOutcome::default();

    for part in doc.content_parts_mut() {
        let part_name = part.name.clone();
        let mut text_edits: Vec<(usize, String)> = Vec::new();

        for link in links.iter().filter(|link| link.part == part_name) {
            let identifiers = extract_identifiers(&link.url);
            if !link.is_valid || !is_lookup_candidate(link) || identifiers.is_empty() {
                outcome.skipped += 1;
                continue;
            }
            outcome.processed += 1;

            let resolved = resolution
                .find(&identifiers)
                .filter(|result| result.status != LookupStatus::NotFound);

            let (new_url, new_text, status) = match resolved {
                Some(result) => {
                    let url = (!result.document_id.is_empty())
                        .then(|| canonical_url(canonical_base, &result.document_id));
                    (
                        url,
                        rebuild_display_text(&link.display_text, result),
                        result.status,
                    )
                }
                None => (
                    None,
                    mark_not_found(&link.display_text),
                    LookupStatus::NotFound,
                ),
            };

            let mut changed = false;
            let final_url = match (&new_url, &link.relationship_id) {
                (Some(url), Some(rid)) if *url != link.url => {
                    if part.relationships.set_target(rid, url) {
                        outcome.changes.push(Change {
                            part: part.relationships.part_name().to_string(),
                            before: link.url.clone(),
                            after: url.clone(),
                            description: format!("Rewrote target of hyperlink {}", link.id),
                        });
                        changed = true;
                        url.clone()
                    } else {
                        link.url.clone()
                    }
                }
                _ => link.url.clone(),
            };

            if new_text != link.display_text {
                text_edits.push((link.ordinal, new_text.clone()));
                outcome.changes.push(Change {
                    part: part_name.clone(),
                    before: link.display_text.clone(),
                    after: new_text.clone(),
                    description: format!("Updated display text of hyperlink {}", link.id),
                });
                changed = true;
            }

            if changed {
                outcome.modified += 1;
            }
            debug!(
                event = "hyperlink.fix.applied",
                link = %link.id,
                status = ?status,
                changed
            );

            outcome.links.push(ProcessedLink {
                id: link.id.clone(),
                url: final_url,
                original_url: link.url.clone(),
                display_text: new_text.clone(),
                status,
                before: link.display_text.clone(),
                after: new_text,
            });
        }

        if text_edits.is_empty() {
            continue;
        }
        if let Some(root) = part.root_mut() {
            let mut elements = hyperlink_elements_mut(root);
            for (ordinal, text) in &text_edits {
                if let Some(el) = elements.get_mut(*ordinal) {
                    replace_runs_text(el, text);
                }
            }
        }
        part.mark_dirty();
    }

    outcome
}
