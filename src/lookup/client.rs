//! Batched, cached, retrying resolution client

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::cache::ResolutionCache;
use super::identifiers::collect_lookup_ids;
use super::{LookupBackend, LookupRequest, LookupResult, Resolution, UsageFields};
use crate::error::ResolutionError;
use crate::hyperlink::Hyperlink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failed attempt (1-based): `base * 2^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

pub struct LookupClient {
    backend: Arc<dyn LookupBackend>,
    policy: RetryPolicy,
    cache: Mutex<ResolutionCache>,
    usage: UsageFields,
}

impl LookupClient {
    pub fn new(backend: Arc<dyn LookupBackend>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            cache: Mutex::new(ResolutionCache::new()),
            usage: UsageFields::default(),
        }
    }

    pub fn with_usage(mut self, usage: UsageFields) -> Self {
        self.usage = usage;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Prune cache entries older than `max_age`; returns how many were dropped
    pub fn reclaim(&self, max_age: Duration) -> usize {
        self.cache.lock().prune_older_than(max_age)
    }

    /// Resolve the identifiers found in `links`.
    ///
    /// Links without identifiers contribute nothing; when no link has one, no
    /// backend call is made and an empty resolution is returned.
    pub async fn resolve(&self, links: &[Hyperlink]) -> Result<Resolution, ResolutionError> {
        let ids = collect_lookup_ids(links);
        if ids.is_empty() {
            debug!(event = "lookup.resolve.no_identifiers", links = links.len());
            return Ok(Resolution::empty());
        }

        let mut results: Vec<LookupResult> = Vec::new();
        let mut misses: Vec<String> = Vec::new();
        {
            let mut cache = self.cache.lock();
            for id in &ids {
                match cache.get(id) {
                    Some(hit) => {
                        if !results.contains(&hit) {
                            results.push(hit);
                        }
                    }
                    None => misses.push(id.clone()),
                }
            }
        }

        debug!(
            event = "lookup.resolve.partitioned",
            identifiers = ids.len(),
            cached = ids.len() - misses.len(),
            misses = misses.len()
        );

        if !misses.is_empty() {
            let request = LookupRequest {
                ids: misses,
                usage: self.usage.clone(),
                hyperlinks_checked: Some(ids.len()),
                total_hyperlinks: Some(links.len()),
            };
            let fetched = self.fetch_with_retry(&request).await?;

            let mut cache = self.cache.lock();
            for result in fetched {
                cache.insert(result.clone());
                if !results.contains(&result) {
                    results.push(result);
                }
            }
        }

        Ok(Resolution::new(results))
    }

    async fn fetch_with_retry(
        &self,
        request: &LookupRequest,
    ) -> Result<Vec<LookupResult>, ResolutionError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let started = Instant::now();
            let outcome = tokio::time::timeout(self.policy.timeout, self.backend.lookup(request)).await;

            match outcome {
                Err(_) => {
                    warn!(
                        event = "lookup.request.timeout",
                        backend = self.backend.name(),
                        attempt,
                        timeout_ms = self.policy.timeout.as_millis()
                    );
                    return Err(ResolutionError::Timeout(self.policy.timeout.as_millis()));
                }
                Ok(Ok(results)) => {
                    info!(
                        event = "lookup.request.completed",
                        backend = self.backend.name(),
                        attempt,
                        requested = request.ids.len(),
                        resolved = results.len(),
                        elapsed_ms = started.elapsed().as_millis()
                    );
                    return Ok(results);
                }
                Ok(Err(error)) if error.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        event = "lookup.request.retry",
                        backend = self.backend.name(),
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %error
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(Err(error)) => {
                    warn!(
                        event = "lookup.request.failed",
                        backend = self.backend.name(),
                        attempt,
                        error = %error
                    );
                    return Err(error);
                }
            }
        }
    }
}
