//! Per-run candidate cache
//!
//! Remembers the outcome of every window text looked up during one
//! segmentation run so the same text reached from different start offsets
//! costs a single search call. Failed lookups are remembered too.
//!
//! Each key owns a `OnceCell`: concurrent lookups of the same text wait on
//! the first one instead of issuing their own call, and the first stored
//! outcome is the one every caller sees.

use crate::error::SearchError;
use crate::search::SearchAdapter;
use crate::types::Candidate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Stored result of probing one window text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Search answered (possibly with zero candidates)
    Found(Vec<Candidate>),
    /// Search failed with a transient error after all retries
    Failed(String),
    /// Search rejected our credentials
    Unauthorized(String),
}

impl LookupOutcome {
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Found(candidates) => candidates,
            Self::Failed(_) | Self::Unauthorized(_) => &[],
        }
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub lookups_issued: usize,
    pub cache_hits: usize,
    pub successful_lookups: usize,
    pub failed_lookups: usize,
}

/// Candidate cache scoped to a single run
pub struct CandidateCache {
    adapter: Arc<dyn SearchAdapter>,
    max_results: usize,
    transient_retries: u32,
    entries: Mutex<HashMap<String, Arc<OnceCell<LookupOutcome>>>>,
    lookups_issued: AtomicUsize,
    cache_hits: AtomicUsize,
    successful_lookups: AtomicUsize,
    failed_lookups: AtomicUsize,
}

impl CandidateCache {
    pub fn new(adapter: Arc<dyn SearchAdapter>, max_results: usize, transient_retries: u32) -> Self {
        Self {
            adapter,
            max_results,
            transient_retries,
            entries: Mutex::new(HashMap::new()),
            lookups_issued: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            successful_lookups: AtomicUsize::new(0),
            failed_lookups: AtomicUsize::new(0),
        }
    }

    /// Look up candidates for a normalized window text
    ///
    /// The first request for `text` calls the search adapter; later requests
    /// in the same run return the stored outcome.
    pub async fn lookup(&self, text: &str) -> LookupOutcome {
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(text.to_string()).or_default())
        };

        let mut searched = false;
        let outcome = cell
            .get_or_init(|| {
                searched = true;
                self.search_with_retries(text)
            })
            .await;

        if !searched {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(query = %text, "Candidate cache hit");
        }

        outcome.clone()
    }

    async fn search_with_retries(&self, text: &str) -> LookupOutcome {
        let mut attempt: u32 = 0;
        loop {
            self.lookups_issued.fetch_add(1, Ordering::Relaxed);
            debug!(
                query = %text,
                attempt = attempt + 1,
                source = self.adapter.source_id(),
                "Searching for window text"
            );

            match self.adapter.search(text, self.max_results).await {
                Ok(candidates) => {
                    self.successful_lookups.fetch_add(1, Ordering::Relaxed);
                    debug!(query = %text, found = candidates.len(), "Search answered");
                    return LookupOutcome::Found(candidates);
                }
                Err(SearchError::Unauthorized(detail)) => {
                    self.failed_lookups.fetch_add(1, Ordering::Relaxed);
                    return LookupOutcome::Unauthorized(detail);
                }
                Err(SearchError::Transient(detail)) => {
                    if attempt >= self.transient_retries {
                        self.failed_lookups.fetch_add(1, Ordering::Relaxed);
                        return LookupOutcome::Failed(detail);
                    }
                    attempt += 1;
                    debug!(query = %text, error = %detail, "Transient search failure, retrying");
                }
            }
        }
    }

    /// Number of distinct texts looked up so far
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn counters(&self) -> CacheCounters {
        CacheCounters {
            lookups_issued: self.lookups_issued.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            successful_lookups: self.successful_lookups.load(Ordering::Relaxed),
            failed_lookups: self.failed_lookups.load(Ordering::Relaxed),
        }
    }
}
