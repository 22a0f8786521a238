//! Prefix DP table
//!
//! `states[i]` describes the best way found so far to segment the first `i`
//! tokens. Index 0 is the empty prefix and is always reachable.

use crate::normalizer::TokenSequence;
use crate::types::{Candidate, Objective, Segment, Tracklist, Window};

/// DP record for one prefix length
#[derive(Debug, Clone, Default)]
pub struct SegmentationState {
    /// Prefix ending here can be fully segmented
    pub reachable: bool,
    /// Segments in the best segmentation of this prefix
    pub segment_count: usize,
    /// Length of the last segment chosen to reach this position
    pub best_window_len: usize,
    /// Track chosen for that last segment
    pub best_candidate: Option<Candidate>,
}

/// Flat array of states for positions `0..=n`
#[derive(Debug, Clone)]
pub struct SegmentationTable {
    states: Vec<SegmentationState>,
}

impl SegmentationTable {
    pub fn new(token_count: usize) -> Self {
        let mut states = vec![SegmentationState::default(); token_count + 1];
        states[0].reachable = true;
        Self { states }
    }

    /// Number of tokens the table was built for
    pub fn token_count(&self) -> usize {
        self.states.len() - 1
    }

    pub fn is_reachable(&self, position: usize) -> bool {
        self.states.get(position).is_some_and(|s| s.reachable)
    }

    pub fn state(&self, position: usize) -> Option<&SegmentationState> {
        self.states.get(position)
    }

    /// Offer `candidate` as the segment covering `window`
    ///
    /// Adopted only when the prefix before the window is reachable and the
    /// objective ranks the resulting segment count (then the window length)
    /// above the current choice. An equally-good existing choice is never
    /// replaced.
    ///
    /// Returns true when the candidate was adopted.
    pub fn consider(&mut self, window: Window, candidate: &Candidate, objective: Objective) -> bool {
        if !self.is_reachable(window.start) || window.end >= self.states.len() {
            return false;
        }

        let len = window.len();
        let count = self.states[window.start].segment_count + 1;
        let state = &mut self.states[window.end];
        let improves = state.best_candidate.is_none()
            || objective.improves(count, len, state.segment_count, state.best_window_len);
        if improves {
            state.reachable = true;
            state.segment_count = count;
            state.best_window_len = len;
            state.best_candidate = Some(candidate.clone());
        }
        improves
    }

    /// Walk back from `end` to 0 following the recorded segment lengths
    ///
    /// Returns `None` if `end` is unreachable. Each step strictly decreases
    /// the position, so the walk always terminates.
    pub fn reconstruct(&self, tokens: &TokenSequence, end: usize) -> Option<Tracklist> {
        if !self.is_reachable(end) {
            return None;
        }

        let mut segments = Vec::new();
        let mut position = end;
        while position > 0 {
            let state = &self.states[position];
            let len = state.best_window_len;
            let candidate = state.best_candidate.as_ref()?;
            if len == 0 || len > position {
                return None;
            }

            let start = position - len;
            segments.push(Segment {
                window: Window::new(start, position),
                text: tokens.join(start, position),
                candidate: candidate.clone(),
            });
            position = start;
        }

        segments.reverse();
        Some(Tracklist { segments })
    }

    /// Longest reachable proper prefix, reconstructed
    pub fn best_prefix(&self, tokens: &TokenSequence) -> Tracklist {
        (1..self.states.len())
            .rev()
            .find(|&i| self.is_reachable(i))
            .and_then(|i| self.reconstruct(tokens, i))
            .unwrap_or_default()
    }

    /// The last segment adopted at every reachable position, in position order
    pub fn adopted_segments(&self, tokens: &TokenSequence) -> Vec<Segment> {
        self.states
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(end, state)| {
                let candidate = state.best_candidate.as_ref()?;
                if !state.reachable || state.best_window_len == 0 || state.best_window_len > end {
                    return None;
                }
                let start = end - state.best_window_len;
                Some(Segment {
                    window: Window::new(start, end),
                    text: tokens.join(start, end),
                    candidate: candidate.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    fn track(id: &str) -> Candidate {
        Candidate::new(id, id)
    }

    #[test]
    fn test_base_case() {
        let table = SegmentationTable::new(3);
        assert!(table.is_reachable(0));
        assert!(!table.is_reachable(1));
        assert!(!table.is_reachable(3));
        assert_eq!(table.token_count(), 3);
    }

    #[test]
    fn test_unreachable_prefix_is_ignored() {
        let mut table = SegmentationTable::new(3);
        assert!(!table.consider(Window::new(1, 2), &track("b"), Objective::MinimizeSegments));
        assert!(!table.is_reachable(2));
    }

    #[test]
    fn test_tie_keeps_first_found() {
        let mut table = SegmentationTable::new(1);
        assert!(table.consider(Window::new(0, 1), &track("first"), Objective::MinimizeSegments));
        assert!(!table.consider(Window::new(0, 1), &track("second"), Objective::MinimizeSegments));
        assert_eq!(
            table.state(1).unwrap().best_candidate.as_ref().unwrap().id,
            "first"
        );
    }

    #[test]
    fn test_minimize_counts_whole_prefix() {
        // Greedy on last-segment length would keep a | b | c d e
        let tokens = normalize("a b c d e").unwrap();
        let mut table = SegmentationTable::new(5);
        let objective = Objective::MinimizeSegments;
        for i in 0..5 {
            table.consider(Window::new(i, i + 1), &track("single"), objective);
        }
        table.consider(Window::new(0, 4), &track("a b c d"), objective);
        assert!(table.consider(Window::new(4, 5), &track("e"), objective));
        assert!(!table.consider(Window::new(2, 5), &track("c d e"), objective));

        let tracklist = table.reconstruct(&tokens, 5).unwrap();
        assert_eq!(tracklist.track_ids(), vec!["a b c d", "e"]);
        assert_eq!(table.state(5).unwrap().segment_count, 2);
    }

    #[test]
    fn test_reconstruct_follows_lengths() {
        let tokens = normalize("good day sunshine").unwrap();
        let mut table = SegmentationTable::new(3);
        table.consider(Window::new(0, 1), &track("good"), Objective::MinimizeSegments);
        table.consider(Window::new(1, 2), &track("day"), Objective::MinimizeSegments);
        table.consider(Window::new(0, 2), &track("good day"), Objective::MinimizeSegments);
        table.consider(Window::new(2, 3), &track("sunshine"), Objective::MinimizeSegments);

        let tracklist = table.reconstruct(&tokens, 3).unwrap();
        assert_eq!(tracklist.track_ids(), vec!["good day", "sunshine"]);
        assert_eq!(tracklist.text(), "good day sunshine");
    }

    #[test]
    fn test_best_prefix_and_adopted() {
        let tokens = normalize("a b c").unwrap();
        let mut table = SegmentationTable::new(3);
        table.consider(Window::new(0, 1), &track("a"), Objective::MaximizeSegments);
        table.consider(Window::new(1, 2), &track("b"), Objective::MaximizeSegments);

        let prefix = table.best_prefix(&tokens);
        assert_eq!(prefix.text(), "a b");
        assert_eq!(table.adopted_segments(&tokens).len(), 2);
        assert!(table.reconstruct(&tokens, 3).is_none());
    }

    #[test]
    fn test_best_prefix_empty_when_nothing_reachable() {
        let tokens = normalize("a b").unwrap();
        let table = SegmentationTable::new(2);
        assert!(table.best_prefix(&tokens).is_empty());
    }
}
