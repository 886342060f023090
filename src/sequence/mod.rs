//! Sequence detection over the history of entered states.
//!
//! The detector keeps a sliding window of the most recently entered states,
//! just long enough for the longest registered pattern. After each entered
//! state every live pattern is compared with the tail of the window;
//! overlapping occurrences each match.

use crate::core::State;
use crate::handlers::{Entry, HandlerList, Registration, SequenceHandler};
use std::collections::VecDeque;
use std::sync::Arc;

/// A registered pattern and its handler.
pub(crate) struct Pattern<S> {
    states: Vec<S>,
    handler: Arc<dyn SequenceHandler<S>>,
}

impl<S> Pattern<S> {
    pub(crate) fn states(&self) -> &[S] {
        &self.states
    }

    pub(crate) fn handler(&self) -> &dyn SequenceHandler<S> {
        self.handler.as_ref()
    }
}

pub(crate) struct SequenceDetector<S: State> {
    patterns: HandlerList<Pattern<S>>,
    window: VecDeque<S>,
    longest: usize,
    truncated: u64,
}

impl<S: State> Default for SequenceDetector<S> {
    fn default() -> Self {
        Self {
            patterns: HandlerList::default(),
            window: VecDeque::new(),
            longest: 0,
            truncated: 0,
        }
    }
}

impl<S: State> SequenceDetector<S> {
    /// Register a pattern. The caller guarantees `states` is non-empty.
    pub(crate) fn register(
        &mut self,
        states: Vec<S>,
        handler: Arc<dyn SequenceHandler<S>>,
    ) -> Registration {
        debug_assert!(!states.is_empty());
        self.longest = self.longest.max(states.len());
        self.patterns.push(Arc::new(Pattern { states, handler }))
    }

    /// Append an entered state and return the patterns whose tail now matches.
    pub(crate) fn record(&mut self, state: S) -> Vec<Entry<Pattern<S>>> {
        self.window.push_back(state);
        self.trim();

        self.patterns
            .live()
            .filter(|entry| self.tail_matches(entry.handler.states()))
            .cloned()
            .collect()
    }

    /// The retained window, oldest first, as a contiguous slice.
    pub(crate) fn tail(&mut self, len: usize) -> &[S] {
        let window = self.window.make_contiguous();
        &window[window.len().saturating_sub(len)..]
    }

    fn tail_matches(&self, pattern: &[S]) -> bool {
        if pattern.len() > self.window.len() {
            return false;
        }
        let skip = self.window.len() - pattern.len();
        self.window.iter().skip(skip).eq(pattern.iter())
    }

    fn trim(&mut self) {
        while self.window.len() > self.longest {
            self.window.pop_front();
            self.truncated += 1;
        }
    }

    /// Number of entered states no longer held in the window.
    pub(crate) fn truncated(&self) -> u64 {
        self.truncated
    }

    pub(crate) fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Every state recorded since the last clear, retained or not.
    pub(crate) fn entered(&self) -> u64 {
        self.truncated() + self.window_len() as u64
    }

    /// Forget every entered state. Patterns stay registered.
    pub(crate) fn clear(&mut self) {
        self.window.clear();
        self.truncated = 0;
    }

    /// Drop released patterns and shrink the window to the longest survivor.
    pub(crate) fn prune(&mut self) {
        self.patterns.prune();
        self.longest = self
            .patterns
            .live()
            .map(|entry| entry.handler.states().len())
            .max()
            .unwrap_or(0);
        self.trim();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerResult;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum Step {
        A,
        B,
        C,
    }

    fn noop() -> Arc<dyn SequenceHandler<Step>> {
        Arc::new(|_: &[Step]| -> HandlerResult { Ok(()) })
    }

    fn feed(detector: &mut SequenceDetector<Step>, states: &[Step]) -> usize {
        states
            .iter()
            .map(|s| detector.record(s.clone()).len())
            .sum()
    }

    #[test]
    fn matches_pattern_at_tail() {
        let mut detector = SequenceDetector::default();
        detector.register(vec![Step::A, Step::B], noop());

        assert!(detector.record(Step::A).is_empty());
        assert_eq!(detector.record(Step::B).len(), 1);
        assert!(detector.record(Step::C).is_empty());
    }

    #[test]
    fn overlapping_occurrences_each_match() {
        let mut detector = SequenceDetector::default();
        detector.register(vec![Step::A, Step::B, Step::A], noop());

        let matches = feed(&mut detector, &[Step::A, Step::B, Step::A, Step::B, Step::A]);
        assert_eq!(matches, 2);
    }

    #[test]
    fn repeated_state_pattern_matches_every_pair() {
        let mut detector = SequenceDetector::default();
        detector.register(vec![Step::A, Step::A], noop());

        assert_eq!(feed(&mut detector, &[Step::A, Step::A, Step::A]), 2);
    }

    #[test]
    fn window_is_bounded_by_longest_pattern() {
        let mut detector = SequenceDetector::default();
        detector.register(vec![Step::A, Step::B, Step::C], noop());

        feed(&mut detector, &[Step::A, Step::B, Step::C, Step::A, Step::B]);

        assert_eq!(detector.window_len(), 3);
        assert_eq!(detector.truncated(), 2);
        assert_eq!(detector.tail(2), &[Step::A, Step::B]);
    }

    #[test]
    fn no_patterns_keeps_no_window() {
        let mut detector = SequenceDetector::default();
        feed(&mut detector, &[Step::A, Step::B]);

        assert_eq!(detector.window_len(), 0);
        assert_eq!(detector.truncated(), 2);
    }

    #[test]
    fn released_pattern_stops_matching() {
        let mut detector = SequenceDetector::default();
        let registration = detector.register(vec![Step::B], noop());
        detector.register(vec![Step::A, Step::B], noop());

        registration.release();
        detector.record(Step::A);
        assert_eq!(detector.record(Step::B).len(), 1);

        detector.prune();
        assert_eq!(detector.window_len(), 2);
    }

    #[test]
    fn clear_forgets_window() {
        let mut detector = SequenceDetector::default();
        detector.register(vec![Step::A, Step::B], noop());

        detector.record(Step::A);
        detector.clear();
        assert!(detector.record(Step::B).is_empty());
        assert_eq!(detector.truncated(), 0);
    }
}
