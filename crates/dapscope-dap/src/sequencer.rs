//! Outgoing request sequence numbers.

use std::sync::atomic::{AtomicI64, Ordering};

/// Hands out strictly increasing sequence numbers, starting at 1.
#[derive(Debug)]
pub struct Sequencer {
    next: AtomicI64,
}

impl Sequencer {
    /// Create a sequencer whose first number is 1.
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    /// Allocate the next sequence number.
    pub fn next(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The number the next call to [`Sequencer::next`] will return.
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencer_starts_at_one_and_increments() {
        let seq = Sequencer::new();
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.next(), 3);
        assert_eq!(seq.peek(), 4);
    }

    #[test]
    fn sequencer_unique_across_threads() {
        let seq = std::sync::Arc::new(Sequencer::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || (0..100).map(|_| seq.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
        assert_eq!(all.first(), Some(&1));
        assert_eq!(all.last(), Some(&400));
    }
}
