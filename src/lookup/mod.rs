//! Resolution of content/document identifiers to canonical references
//!
//! A [`LookupClient`] extracts identifiers from hyperlinks, serves what it can
//! from its [`ResolutionCache`] and sends the rest in one batch request to a
//! [`LookupBackend`]: either the remote endpoint ([`RemoteLookup`]) or a local
//! dictionary file ([`LocalDictionary`]).

pub mod cache;
pub mod client;
pub mod identifiers;
pub mod local;
pub mod remote;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ResolutionError;

pub use cache::{CacheEntry, ResolutionCache};
pub use client::{LookupClient, RetryPolicy};
pub use identifiers::{LinkIdentifiers, collect_lookup_ids, extract_identifiers, last_six_digits};
pub use local::LocalDictionary;
pub use remote::RemoteLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupStatus {
    Active,
    Expired,
    Deprecated,
    Moved,
    NotFound,
}

impl LookupStatus {
    /// Parse a wire status string; unknown values count as active
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" | "released" | "published" | "" => LookupStatus::Active,
            "expired" => LookupStatus::Expired,
            "deprecated" => LookupStatus::Deprecated,
            "moved" => LookupStatus::Moved,
            "not found" | "not_found" | "notfound" => LookupStatus::NotFound,
            other => {
                debug!(event = "lookup.status.unknown", status = other);
                LookupStatus::Active
            }
        }
    }

    /// Statuses that get the " - Expired" marker
    pub fn is_expired(self) -> bool {
        matches!(self, LookupStatus::Expired | LookupStatus::Deprecated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub document_id: String,
    pub content_id: String,
    pub title: String,
    pub status: LookupStatus,
}

impl LookupResult {
    pub fn matches(&self, id: &str) -> bool {
        let id = id.trim();
        (!self.document_id.is_empty() && self.document_id.eq_ignore_ascii_case(id))
            || (!self.content_id.is_empty() && self.content_id.eq_ignore_ascii_case(id))
    }
}

/// Optional usage-tracking fields sent with every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    pub ids: Vec<String>,
    pub usage: UsageFields,
    pub hyperlinks_checked: Option<usize>,
    pub total_hyperlinks: Option<usize>,
}

#[async_trait]
pub trait LookupBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolve a batch of identifiers; ids without a match are simply absent
    async fn lookup(&self, request: &LookupRequest) -> Result<Vec<LookupResult>, ResolutionError>;
}

/// Results of one resolution pass with an index by both identifiers
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub results: Vec<LookupResult>,
    pub index: Option<HashMap<String, usize>>,
}

impl Resolution {
    pub fn new(results: Vec<LookupResult>) -> Self {
        let mut index = HashMap::new();
        for (i, result) in results.iter().enumerate() {
            for id in [&result.document_id, &result.content_id] {
                if !id.is_empty() {
                    index.entry(identifiers::cache_key(id)).or_insert(i);
                }
            }
        }
        Self {
            results,
            index: Some(index),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LookupResult> {
        match &self.index {
            Some(index) => index
                .get(&identifiers::cache_key(id))
                .and_then(|&i| self.results.get(i)),
            None => self.results.iter().find(|result| result.matches(id)),
        }
    }

    /// First result matching the link's content ID, then its document ID
    pub fn find(&self, ids: &LinkIdentifiers) -> Option<&LookupResult> {
        ids.ids().find_map(|id| self.get(id))
    }
}
