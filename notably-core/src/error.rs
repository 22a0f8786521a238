//! Error types for notably-core
//!
//! Per-window lookup failures never surface here; the engine absorbs them.
//! Only invalid input, total search unavailability, authorization failure,
//! cancellation and deadline expiry end a run early.

use crate::types::Candidate;
use serde::Serialize;
use thiserror::Error;

/// Terminal segmentation error
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Phrase normalized to zero tokens (no lookups performed)
    #[error("Phrase contains no searchable words")]
    EmptyPhrase,

    /// Every lookup of the run failed
    #[error("Search service unavailable: {failed_lookups} lookups failed, last error: {last_error}")]
    SearchUnavailable {
        failed_lookups: usize,
        last_error: String,
    },

    /// The search service rejected our credentials
    #[error("Search service rejected credentials: {detail}")]
    Unauthorized {
        detail: String,
        checked_candidates: Vec<Candidate>,
    },

    /// Caller canceled the run
    #[error("Segmentation canceled after {positions_processed} positions")]
    Canceled {
        positions_processed: usize,
        checked_candidates: Vec<Candidate>,
    },

    /// Run budget exhausted
    #[error("Segmentation deadline exceeded after {positions_processed} positions")]
    DeadlineExceeded {
        positions_processed: usize,
        checked_candidates: Vec<Candidate>,
    },
}

/// Discriminant of [`SegmentError`], for callers that only branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyPhrase,
    SearchUnavailable,
    Unauthorized,
    Canceled,
    DeadlineExceeded,
}

impl SegmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPhrase => ErrorKind::EmptyPhrase,
            Self::SearchUnavailable { .. } => ErrorKind::SearchUnavailable,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Canceled { .. } => ErrorKind::Canceled,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
        }
    }

    /// Partial checked-candidate set gathered before the run stopped
    pub fn checked_candidates(&self) -> &[Candidate] {
        match self {
            Self::Unauthorized {
                checked_candidates, ..
            }
            | Self::Canceled {
                checked_candidates, ..
            }
            | Self::DeadlineExceeded {
                checked_candidates, ..
            } => checked_candidates,
            Self::EmptyPhrase | Self::SearchUnavailable { .. } => &[],
        }
    }
}

/// Search adapter failure for a single query
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// Network hiccup, rate limiting, server error; worth retrying
    #[error("Transient search failure: {0}")]
    Transient(String),

    /// Credentials rejected; the run must stop
    #[error("Search unauthorized: {0}")]
    Unauthorized(String),
}

/// Playlist provider failure
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Playlist provider request failed: {0}")]
    Request(String),

    #[error("Playlist provider unauthorized: {0}")]
    Unauthorized(String),

    #[error("Playlist provider returned unexpected data: {0}")]
    Parse(String),
}

/// Tracklist assembly failure (kept apart from segmentation failures)
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Nothing to put in the playlist
    #[error("No tracks available to add to the playlist")]
    EmptyTracklist,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
