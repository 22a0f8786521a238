//! Segmentation engine
//!
//! Finds a partition of the normalized phrase into windows that each match a
//! track title, using a prefix dynamic program over token positions. Every
//! dictionary test is a search call, so lookups go through a per-run
//! [`CandidateCache`] and are throttled by a fixed delay before each
//! position's batch.
//!
//! # Algorithm
//! For each end position `i = 1..=n`, every window ending at `i` (length
//! `1..=min(i, max_window_words)`, shortest first) is looked up. A returned
//! candidate whose normalized title equals the window text is offered to the
//! DP table, which adopts it when the prefix before the window is reachable
//! and the objective ranks the resulting segment count (then the window
//! length) above the current choice. All results for `i` are applied before
//! `i + 1` starts, so every prefix state is final once it is extended.

mod config;
mod state;

pub use config::EngineConfig;
pub use state::{SegmentationState, SegmentationTable};

use crate::cache::{CandidateCache, LookupOutcome};
use crate::error::SegmentError;
use crate::normalizer::{normalize, normalize_title, TokenSequence};
use crate::search::SearchAdapter;
use crate::types::{
    Candidate, Objective, RunStats, SegmentationFailure, SegmentationResult, Window,
};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Phrase segmentation engine
///
/// Holds only configuration and the injected search capability; every call
/// to [`segment`](Self::segment) is an independent run with its own cache.
pub struct SegmentationEngine {
    search: Arc<dyn SearchAdapter>,
    config: EngineConfig,
}

/// Candidates seen during a run, de-duplicated by id in discovery order
#[derive(Default)]
struct CheckedCandidates {
    seen: HashSet<String>,
    list: Vec<Candidate>,
}

impl CheckedCandidates {
    fn record(&mut self, candidate: &Candidate) {
        if self.seen.insert(candidate.id.clone()) {
            self.list.push(candidate.clone());
        }
    }

    fn snapshot(&self) -> Vec<Candidate> {
        self.list.clone()
    }
}

/// Why a run stopped before processing every position
enum Interruption {
    Canceled,
    DeadlineExceeded,
}

impl SegmentationEngine {
    pub fn new(search: Arc<dyn SearchAdapter>, config: EngineConfig) -> Self {
        Self { search, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Segment a raw phrase into track titles
    ///
    /// # Arguments
    /// * `phrase` - Raw user text
    /// * `objective` - Few long titles vs. many short titles
    /// * `cancel` - Observed between position batches and during the delay
    pub async fn segment(
        &self,
        phrase: &str,
        objective: Objective,
        cancel: &CancellationToken,
    ) -> SegmentationResult {
        let tokens = match normalize(phrase) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(phrase = %phrase, "Rejected phrase: {}", e);
                return SegmentationResult::Error(e);
            }
        };
        self.segment_tokens(&tokens, objective, cancel).await
    }

    /// Segment an already-normalized token sequence
    pub async fn segment_tokens(
        &self,
        tokens: &TokenSequence,
        objective: Objective,
        cancel: &CancellationToken,
    ) -> SegmentationResult {
        let n = tokens.len();
        let started = Instant::now();
        let deadline = self.config.deadline.map(|budget| started + budget);

        info!(
            phrase = %tokens.as_text(),
            tokens = n,
            objective = ?objective,
            source = self.search.source_id(),
            "Starting segmentation"
        );

        let cache = CandidateCache::new(
            Arc::clone(&self.search),
            self.config.max_results,
            self.config.transient_retries,
        );
        let mut table = SegmentationTable::new(n);
        let mut checked = CheckedCandidates::default();
        let mut last_error: Option<String> = None;
        let mut positions_processed = 0;

        for end in 1..=n {
            if let Some(reason) = self.wait_for_batch(cancel, deadline).await {
                return self.interrupted(reason, positions_processed, &checked);
            }

            let batch = self
                .lookup_batch(&cache, tokens, end, deadline, &mut checked)
                .await;
            let Some(batch) = batch else {
                return self.interrupted(
                    Interruption::DeadlineExceeded,
                    positions_processed,
                    &checked,
                );
            };

            for (window, text, outcome) in batch {
                match outcome {
                    LookupOutcome::Found(candidates) => {
                        for candidate in &candidates {
                            if normalize_title(&candidate.name) != text {
                                continue;
                            }
                            if table.consider(window, candidate, objective) {
                                debug!(
                                    position = end,
                                    window_len = window.len(),
                                    track_id = %candidate.id,
                                    "Adopted segment"
                                );
                            }
                        }
                    }
                    LookupOutcome::Failed(detail) => {
                        warn!(query = %text, error = %detail, "Lookup failed, treating window as empty");
                        last_error = Some(detail);
                    }
                    LookupOutcome::Unauthorized(detail) => {
                        error!(query = %text, error = %detail, "Search rejected credentials, aborting run");
                        return SegmentationResult::Error(SegmentError::Unauthorized {
                            detail,
                            checked_candidates: checked.snapshot(),
                        });
                    }
                }
            }

            positions_processed += 1;
        }

        let counters = cache.counters();
        let stats = RunStats {
            positions_processed,
            lookups_issued: counters.lookups_issued,
            cache_hits: counters.cache_hits,
            successful_lookups: counters.successful_lookups,
            failed_lookups: counters.failed_lookups,
        };

        info!(
            reachable = table.is_reachable(n),
            lookups = stats.lookups_issued,
            cache_hits = stats.cache_hits,
            failed = stats.failed_lookups,
            checked = checked.list.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Segmentation finished"
        );

        if let Some(tracklist) = table.reconstruct(tokens, n) {
            return SegmentationResult::Success { tracklist, stats };
        }

        if stats.successful_lookups == 0 && stats.failed_lookups > 0 {
            return SegmentationResult::Error(SegmentError::SearchUnavailable {
                failed_lookups: stats.failed_lookups,
                last_error: last_error.unwrap_or_default(),
            });
        }

        SegmentationResult::Failure {
            failure: SegmentationFailure {
                tokens: tokens.to_strings(),
                checked_candidates: checked.snapshot(),
                adopted_segments: table.adopted_segments(tokens),
                best_prefix: table.best_prefix(tokens),
            },
            stats,
        }
    }

    /// Apply the inter-batch delay, watching for cancellation and deadline
    async fn wait_for_batch(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Option<Interruption> {
        if cancel.is_cancelled() {
            return Some(Interruption::Canceled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(Interruption::DeadlineExceeded);
        }
        if self.config.batch_delay.is_zero() {
            return None;
        }

        let wake = Instant::now() + self.config.batch_delay;
        debug!("Rate limiting: waiting {:?}", self.config.batch_delay);
        match deadline {
            Some(d) if d < wake => {
                tokio::select! {
                    _ = cancel.cancelled() => Some(Interruption::Canceled),
                    _ = tokio::time::sleep_until(d) => Some(Interruption::DeadlineExceeded),
                }
            }
            _ => {
                tokio::select! {
                    _ = cancel.cancelled() => Some(Interruption::Canceled),
                    _ = tokio::time::sleep_until(wake) => None,
                }
            }
        }
    }

    /// Look up every window ending at `end`
    ///
    /// Results come back in window order (shortest first) whether lookups run
    /// sequentially or concurrently. Candidates are recorded in `checked` as
    /// each lookup lands, so a batch cut short by the deadline still reports
    /// what it found. `None` means the deadline passed while the batch was in
    /// flight.
    async fn lookup_batch(
        &self,
        cache: &CandidateCache,
        tokens: &TokenSequence,
        end: usize,
        deadline: Option<Instant>,
        checked: &mut CheckedCandidates,
    ) -> Option<Vec<(Window, String, LookupOutcome)>> {
        let longest = end.min(self.config.max_window_words);
        let windows: Vec<(Window, String)> = (1..=longest)
            .map(|len| {
                let window = Window::new(end - len, end);
                let text = tokens.join(window.start, window.end);
                (window, text)
            })
            .collect();

        let batch = async {
            let mut results = Vec::with_capacity(windows.len());
            let mut lookups = std::pin::pin!(stream::iter(windows)
                .map(|(window, text)| async move {
                    let outcome = cache.lookup(&text).await;
                    (window, text, outcome)
                })
                .buffered(self.config.lookup_concurrency.max(1)));

            while let Some((window, text, outcome)) = lookups.next().await {
                for candidate in outcome.candidates() {
                    checked.record(candidate);
                }
                results.push((window, text, outcome));
            }
            results
        };

        match deadline {
            Some(d) => tokio::time::timeout_at(d, batch).await.ok(),
            None => Some(batch.await),
        }
    }

    fn interrupted(
        &self,
        reason: Interruption,
        positions_processed: usize,
        checked: &CheckedCandidates,
    ) -> SegmentationResult {
        let checked_candidates = checked.snapshot();
        let err = match reason {
            Interruption::Canceled => {
                info!(positions_processed, "Segmentation canceled by caller");
                SegmentError::Canceled {
                    positions_processed,
                    checked_candidates,
                }
            }
            Interruption::DeadlineExceeded => {
                warn!(positions_processed, "Segmentation deadline exceeded");
                SegmentError::DeadlineExceeded {
                    positions_processed,
                    checked_candidates,
                }
            }
        };
        SegmentationResult::Error(err)
    }
}
