//! Core types shared by the segmentation pipeline
//!
//! These are the data contracts between the normalizer, the engine, the
//! suggestion generator and the assembler. Everything here lives for one
//! segmentation run.

use crate::error::SegmentError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Search Results
// ============================================================================

/// A track returned by a title search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable track identifier from the music service
    pub id: String,
    /// Display name (track title as the service reports it)
    pub name: String,
    /// Contributing artist names (may be empty)
    #[serde(default)]
    pub artists: Vec<String>,
    /// Artwork reference, when the service has one
    #[serde(default)]
    pub artwork_url: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: Vec::new(),
            artwork_url: None,
        }
    }

    /// Artists joined for display ("A, B")
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

// ============================================================================
// Objective
// ============================================================================

/// Preference rule applied when several segments can end at one position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Fewest segments; a longer last segment breaks ties
    MinimizeSegments,
    /// Most segments; a shorter last segment breaks ties
    MaximizeSegments,
}

impl Objective {
    /// Does a segment of `candidate_len` words beat the current `current_len`?
    ///
    /// Equal lengths never win, so the first-found choice is kept.
    pub fn prefers(self, candidate_len: usize, current_len: usize) -> bool {
        match self {
            Self::MinimizeSegments => candidate_len > current_len,
            Self::MaximizeSegments => candidate_len < current_len,
        }
    }

    /// Does a segmentation of `candidate_count` segments, the last one
    /// `candidate_len` words long, beat the current one at a position?
    ///
    /// Segment count decides first (fewer for minimize, more for maximize);
    /// [`prefers`](Self::prefers) breaks count ties.
    pub fn improves(
        self,
        candidate_count: usize,
        candidate_len: usize,
        current_count: usize,
        current_len: usize,
    ) -> bool {
        if candidate_count == current_count {
            return self.prefers(candidate_len, current_len);
        }
        match self {
            Self::MinimizeSegments => candidate_count < current_count,
            Self::MaximizeSegments => candidate_count > current_count,
        }
    }
}

impl Default for Objective {
    fn default() -> Self {
        Self::MinimizeSegments
    }
}

// ============================================================================
// Windows and Segments
// ============================================================================

/// Contiguous token range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start < end, "window must cover at least one token");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A window bound to the track chosen for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub window: Window,
    /// Window tokens joined with single spaces
    pub text: String,
    pub candidate: Candidate,
}

/// Ordered, gap-free, non-overlapping segments covering the whole phrase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracklist {
    pub segments: Vec<Segment>,
}

impl Tracklist {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Track ids in playback order
    pub fn track_ids(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|s| s.candidate.id.clone())
            .collect()
    }

    /// Segment texts joined with single spaces
    ///
    /// For a successful run this equals the normalized phrase.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Number of tokens covered, assuming contiguity from 0
    pub fn covered_tokens(&self) -> usize {
        self.segments.last().map(|s| s.window.end).unwrap_or(0)
    }
}

// ============================================================================
// Run Outcome
// ============================================================================

/// Per-run lookup counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Positions whose window batch was processed
    pub positions_processed: usize,
    /// Calls made to the search adapter (retries included)
    pub lookups_issued: usize,
    /// Window texts answered from the cache
    pub cache_hits: usize,
    /// Distinct window texts whose lookup succeeded
    pub successful_lookups: usize,
    /// Distinct window texts whose lookup failed
    pub failed_lookups: usize,
}

/// Diagnostic report for a phrase that could not be fully segmented
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationFailure {
    /// Normalized phrase tokens
    pub tokens: Vec<String>,
    /// Every candidate seen, de-duplicated by id, in discovery order
    pub checked_candidates: Vec<Candidate>,
    /// Segments adopted at any reachable position
    pub adopted_segments: Vec<Segment>,
    /// Longest prefix that could be segmented
    pub best_prefix: Tracklist,
}

/// Result of one segmentation run
#[derive(Debug)]
pub enum SegmentationResult {
    /// The whole phrase is spelled out by the tracklist
    Success { tracklist: Tracklist, stats: RunStats },
    /// No segmentation exists for the lookups that were answered
    Failure {
        failure: SegmentationFailure,
        stats: RunStats,
    },
    /// The run could not complete
    Error(SegmentError),
}

impl SegmentationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn tracklist(&self) -> Option<&Tracklist> {
        match self {
            Self::Success { tracklist, .. } => Some(tracklist),
            _ => None,
        }
    }

    /// Candidates checked during the run, for any outcome that has them
    pub fn checked_candidates(&self) -> &[Candidate] {
        match self {
            Self::Success { .. } => &[],
            Self::Failure { failure, .. } => &failure.checked_candidates,
            Self::Error(err) => err.checked_candidates(),
        }
    }
}

/// Advisory alternative phrasing offered when segmentation fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Suggested phrase text
    pub text: String,
    /// Shared-character score of the near match
    pub score: usize,
    /// Track that inspired the suggestion
    pub candidate: Candidate,
}
