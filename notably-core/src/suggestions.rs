//! Suggestion generator
//!
//! When a phrase cannot be spelled out completely, offer up to three
//! alternative phrasings built from what the run did find: the longest
//! prefix that could be segmented, followed by a near-miss title that shares
//! the most characters with the phrase.
//!
//! Suggestions are advisory. They are never verified segmentations.

use crate::normalizer::normalize_title;
use crate::types::{Candidate, SegmentationFailure, Suggestion};
use std::collections::HashSet;

/// Upper bound on suggestions returned
pub const MAX_SUGGESTIONS: usize = 3;

/// Ranks near matches into alternative phrasings
#[derive(Debug, Clone)]
pub struct SuggestionGenerator {
    limit: usize,
}

impl Default for SuggestionGenerator {
    fn default() -> Self {
        Self {
            limit: MAX_SUGGESTIONS,
        }
    }
}

impl SuggestionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of suggestions (clamped to 1..=3)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_SUGGESTIONS);
        self
    }

    /// Build ranked suggestions from a failed run
    ///
    /// **Algorithm:**
    /// 1. Candidates adopted by partial DP progress are exact matches; the
    ///    rest of the checked candidates are unmatched
    /// 2. Score each unmatched candidate by the number of distinct characters
    ///    its normalized name shares with the phrase; drop zero scores
    /// 3. Sort by score (highest first, discovery order on ties)
    /// 4. Prefix each name with the best exact-run prefix, dedupe, truncate
    pub fn suggest(&self, failure: &SegmentationFailure) -> Vec<Suggestion> {
        let phrase_chars = char_set(&failure.tokens.join(" "));
        if phrase_chars.is_empty() {
            return Vec::new();
        }

        let exact_ids: HashSet<&str> = failure
            .adopted_segments
            .iter()
            .map(|s| s.candidate.id.as_str())
            .collect();

        let mut scored: Vec<(usize, String, &Candidate)> = failure
            .checked_candidates
            .iter()
            .filter(|c| !exact_ids.contains(c.id.as_str()))
            .filter_map(|candidate| {
                let name = normalize_title(&candidate.name);
                if name.is_empty() {
                    return None;
                }
                let score = char_set(&name).intersection(&phrase_chars).count();
                (score > 0).then_some((score, name, candidate))
            })
            .collect();

        // Stable sort keeps discovery order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let prefix = failure.best_prefix.text();
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();

        for (score, name, candidate) in scored {
            let text = if prefix.is_empty() {
                name
            } else {
                format!("{} {}", prefix, name)
            };
            if !seen.insert(text.clone()) {
                continue;
            }
            suggestions.push(Suggestion {
                text,
                score,
                candidate: candidate.clone(),
            });
            if suggestions.len() >= self.limit {
                break;
            }
        }

        tracing::debug!(
            checked = failure.checked_candidates.len(),
            exact = exact_ids.len(),
            suggestions = suggestions.len(),
            "Generated suggestions"
        );

        suggestions
    }
}

/// Distinct characters of a text, spaces excluded
fn char_set(text: &str) -> HashSet<char> {
    text.chars().filter(|c| *c != ' ').collect()
}
