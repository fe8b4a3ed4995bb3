//! Regex replacement over run text and hyperlink targets

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{TransformOutcome, for_each_content_part};
use crate::document::WordDocument;
use crate::document::parts::content::{for_each_paragraph_mut, runs_mut, set_text_preserving_space};
use crate::document::relationships::TargetMode;
use crate::error::OperationError;
use crate::xml::ElementKind;

/// `pattern` is a regular expression; `replacement` may use `$1`/`${name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    pub pattern: String,
    pub replacement: String,
}

impl ReplacementRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    fn compile(&self, operation: &str) -> Result<Regex, OperationError> {
        if self.pattern.is_empty() {
            return Err(OperationError::new(operation, "replacement pattern is empty"));
        }
        Regex::new(&self.pattern).map_err(|err| {
            OperationError::new(operation, format!("invalid pattern {:?}: {err}", self.pattern))
        })
    }
}

/// Replace matches inside each `w:t`; a match split across runs is not seen
pub fn replace_text(
    doc: &mut WordDocument,
    rule: &ReplacementRule,
) -> Result<TransformOutcome, OperationError> {
    let regex = rule.compile("replace_text")?;

    Ok(for_each_content_part(doc, |part_name, root| {
        let mut outcome = TransformOutcome::default();
        for_each_paragraph_mut(root, &mut |paragraph, _| {
            for run in runs_mut(paragraph) {
                for text_el in run.elements_mut().filter(|el| el.kind() == ElementKind::Text) {
                    let original = text_el.text();
                    let replaced = regex.replace_all(&original, rule.replacement.as_str());
                    if replaced == original {
                        continue;
                    }
                    let replaced = replaced.into_owned();
                    set_text_preserving_space(text_el, &replaced);
                    outcome.mutations += 1;
                    outcome.change(
                        part_name,
                        original.clone(),
                        replaced,
                        format!("Replaced text matching {}", rule.pattern),
                    );
                }
            }
        });
        outcome
    }))
}

/// Rewrite targets of external hyperlink relationships in every content part
pub fn replace_urls(
    doc: &mut WordDocument,
    rule: &ReplacementRule,
) -> Result<TransformOutcome, OperationError> {
    let regex = rule.compile("replace_url")?;
    let mut outcome = TransformOutcome::default();

    for part in doc.content_parts_mut() {
        let rewrites: Vec<(String, String, String)> = part
            .relationships
            .iter()
            .filter(|rel| rel.is_hyperlink() && rel.target_mode == TargetMode::External)
            .filter_map(|rel| {
                let target = regex.replace_all(&rel.target, rule.replacement.as_str());
                (target != rel.target.as_str())
                    .then(|| (rel.id.clone(), rel.target.clone(), target.into_owned()))
            })
            .collect();

        for (id, before, after) in rewrites {
            if part.relationships.set_target(&id, &after) {
                outcome.mutations += 1;
                outcome.change(
                    &part.name,
                    before,
                    after,
                    format!("Rewrote target of {id}"),
                );
            }
        }
    }
    Ok(outcome)
}
