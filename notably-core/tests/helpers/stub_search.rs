//! In-memory search adapter
//!
//! Answers a query with every catalog track whose normalized title contains
//! the query text, in catalog order, so near misses come back alongside
//! exact titles the way a real search does.

use async_trait::async_trait;
use notably_core::normalizer::normalize_title;
use notably_core::{Candidate, SearchAdapter, SearchError};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct StubSearch {
    catalog: Vec<Candidate>,
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    fail_all: bool,
    unauthorized: HashSet<String>,
    flaky: Mutex<HashMap<String, usize>>,
    latency: Option<Duration>,
}

impl StubSearch {
    /// Catalog of tracks with ids `t0`, `t1`, ... in the given order
    pub fn with_titles(titles: &[&str]) -> Self {
        let catalog = titles
            .iter()
            .enumerate()
            .map(|(idx, title)| Candidate::new(format!("t{}", idx), *title))
            .collect();
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Queries for `text` fail with a transient error
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Every query fails with a transient error
    pub fn failing_always(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Queries for `text` are rejected as unauthorized
    pub fn unauthorized_on(mut self, text: &str) -> Self {
        self.unauthorized.insert(text.to_string());
        self
    }

    /// The first `failures` queries for `text` fail, later ones succeed
    pub fn flaky_on(self, text: &str, failures: usize) -> Self {
        self.flaky
            .lock()
            .unwrap()
            .insert(text.to_string(), failures);
        self
    }

    /// Every query takes `latency` (tokio time)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queries received, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, text: &str) -> usize {
        self.calls().iter().filter(|q| *q == text).count()
    }
}

#[async_trait]
impl SearchAdapter for StubSearch {
    fn source_id(&self) -> &'static str {
        "Stub"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Candidate>, SearchError> {
        self.calls.lock().unwrap().push(query.to_string());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.unauthorized.contains(query) {
            return Err(SearchError::Unauthorized("token expired".to_string()));
        }
        if self.fail_all || self.failing.contains(query) {
            return Err(SearchError::Transient("service unavailable".to_string()));
        }
        {
            let mut flaky = self.flaky.lock().unwrap();
            if let Some(remaining) = flaky.get_mut(query) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(SearchError::Transient("connection reset".to_string()));
                }
            }
        }

        Ok(self
            .catalog
            .iter()
            .filter(|c| normalize_title(&c.name).contains(query))
            .take(max_results)
            .cloned()
            .collect())
    }
}
