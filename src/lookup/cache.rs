//! Cross-document resolution cache

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::LookupResult;
use super::identifiers::cache_key;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub value: LookupResult,
    pub last_modified: DateTime<Utc>,
    pub process_count: u32,
}

/// Lookup results keyed by both document ID and content ID
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached value for an id, counting the hit
    pub fn get(&mut self, id: &str) -> Option<LookupResult> {
        let entry = self.entries.get_mut(&cache_key(id))?;
        entry.process_count += 1;
        Some(entry.value.clone())
    }

    pub fn peek(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(&cache_key(id))
    }

    pub fn insert(&mut self, result: LookupResult) {
        self.insert_at(result, Utc::now());
    }

    pub(crate) fn insert_at(&mut self, result: LookupResult, now: DateTime<Utc>) {
        for id in [&result.document_id, &result.content_id] {
            if id.is_empty() {
                continue;
            }
            let key = cache_key(id);
            self.entries.insert(
                key.clone(),
                CacheEntry {
                    key,
                    value: result.clone(),
                    last_modified: now,
                    process_count: 0,
                },
            );
        }
    }

    /// Drop entries older than `max_age`; returns how many were removed
    pub fn prune_older_than(&mut self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.prune_before(cutoff)
    }

    pub(crate) fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_modified >= cutoff);
        let removed = before - self.entries.len();
        self.entries.shrink_to_fit();
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
