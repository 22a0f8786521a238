//! Test Helper Utilities
//!
//! Shared stubs for notably-core integration tests

#![allow(dead_code)]

pub mod log_capture;
pub mod stub_provider;
pub mod stub_search;

// Re-export commonly used items
pub use log_capture::{capture_logs, LogCapture};
pub use stub_provider::StubProvider;
pub use stub_search::StubSearch;

use notably_core::{EngineConfig, SegmentationEngine};
use std::sync::Arc;

/// Engine config with no inter-batch delay
pub fn fast_config() -> EngineConfig {
    EngineConfig::default().without_delay()
}

/// Engine over a stub search with no inter-batch delay
pub fn fast_engine(search: &Arc<StubSearch>) -> SegmentationEngine {
    SegmentationEngine::new(search.clone(), fast_config())
}
