//! Engine tuning parameters

use notably_common::config::EngineSettings;
use std::time::Duration;

/// Runtime configuration for [`super::SegmentationEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest window (in words) looked up as one title
    pub max_window_words: usize,
    /// Pause before each position's lookups, to stay under the service's rate limit
    pub batch_delay: Duration,
    /// Result limit passed to every search
    pub max_results: usize,
    /// Lookups in flight at once within one position (1 = sequential)
    pub lookup_concurrency: usize,
    /// Extra attempts for transient lookup failures
    pub transient_retries: u32,
    /// Overall run budget
    pub deadline: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            max_window_words: settings.max_window_words.max(1),
            batch_delay: Duration::from_millis(settings.batch_delay_ms),
            max_results: settings.max_results.max(1),
            lookup_concurrency: settings.lookup_concurrency.max(1),
            transient_retries: settings.transient_retries,
            deadline: settings.deadline_ms.map(Duration::from_millis),
        }
    }
}

impl EngineConfig {
    /// Same configuration with the inter-batch delay removed
    pub fn without_delay(mut self) -> Self {
        self.batch_delay = Duration::ZERO;
        self
    }
}
