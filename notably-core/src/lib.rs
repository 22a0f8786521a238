//! notably-core - Phrase-to-playlist segmentation
//!
//! Splits a phrase into consecutive word windows whose text exactly matches a
//! track title, so the tracks played in order "spell out" the phrase. When no
//! full segmentation exists, the run reports what it found and the
//! suggestion generator proposes near-miss phrasings.
//!
//! **Pipeline:**
//! 1. [`normalizer`] - phrase → token sequence
//! 2. [`engine`] - prefix DP over token positions, lookups through [`cache`]
//! 3. [`suggestions`] - advisory alternatives on failure
//! 4. [`assembler`] - tracklist → playlist via a [`search::PlaylistProvider`]

pub mod assembler;
pub mod cache;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod search;
pub mod services;
pub mod suggestions;
pub mod types;

pub use assembler::{playlist_name, PlaylistHandle, TracklistAssembler};
pub use engine::{EngineConfig, SegmentationEngine};
pub use error::{AssemblyError, ErrorKind, ProviderError, SearchError, SegmentError};
pub use search::{PlaylistProvider, SearchAdapter};
pub use suggestions::SuggestionGenerator;
pub use types::{
    Candidate, Objective, RunStats, Segment, SegmentationFailure, SegmentationResult,
    Suggestion, Tracklist, Window,
};
