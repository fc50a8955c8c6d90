//! Sliding context window for detailed listings.

use std::collections::VecDeque;

/// A record held back as possible preceding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRecord {
    pub line_number: usize,
    pub text: String,
}

/// Bounded ring of the most recent non-matching records plus the countdown of
/// following-context records still owed after a match.
#[derive(Debug)]
pub struct ContextWindow {
    preceding: VecDeque<ContextRecord>,
    capacity: usize,
    following: usize,
    remaining: usize,
}

impl ContextWindow {
    pub fn new(preceding: usize, following: usize) -> Self {
        Self {
            preceding: VecDeque::with_capacity(preceding),
            capacity: preceding,
            following,
            remaining: 0,
        }
    }

    /// Buffers a record, evicting the oldest one when the ring is full.
    pub fn push(&mut self, line_number: usize, text: String) {
        if self.capacity == 0 {
            return;
        }
        if self.preceding.len() == self.capacity {
            self.preceding.pop_front();
        }
        self.preceding.push_back(ContextRecord { line_number, text });
    }

    /// Takes the buffered records, oldest first, leaving the ring empty.
    pub fn flush(&mut self) -> impl Iterator<Item = ContextRecord> + '_ {
        self.preceding.drain(..)
    }

    pub fn clear(&mut self) {
        self.preceding.clear();
    }

    pub fn len(&self) -> usize {
        self.preceding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preceding.is_empty()
    }

    /// Starts a following-context run after a match.
    pub fn start_following(&mut self) {
        self.remaining = self.following;
    }

    pub fn following_configured(&self) -> bool {
        self.following > 0
    }

    /// Records still owed to the current following-context run.
    pub fn remaining_following(&self) -> usize {
        self.remaining
    }

    /// Counts one emitted following record. Returns `true` when the run ends.
    pub fn consume_following(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_evicts_oldest() {
        let mut window = ContextWindow::new(2, 0);
        window.push(1, "one".into());
        window.push(2, "two".into());
        window.push(3, "three".into());

        let flushed: Vec<_> = window.flush().map(|r| r.line_number).collect();
        assert_eq!(flushed, vec![2, 3]);
        assert!(window.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut window = ContextWindow::new(0, 0);
        window.push(1, "one".into());
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_following_countdown() {
        let mut window = ContextWindow::new(0, 2);
        assert_eq!(window.remaining_following(), 0);
        window.start_following();
        assert_eq!(window.remaining_following(), 2);
        assert!(!window.consume_following());
        assert!(window.consume_following());
        assert_eq!(window.remaining_following(), 0);
    }
}
