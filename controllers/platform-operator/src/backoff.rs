//! # Fibonacci Backoff
//!
//! Progressive retry delays for failed reconciliation passes. The sequence
//! grows more slowly than exponential backoff, so a platform that is failing
//! on a transient API error is retried promptly while a persistent failure
//! settles at the maximum.
//!
//! Sequence with the operator defaults: 5s, 5s, 10s, 15s, 25s, 40s, 65s,
//! 105s, 170s, 275s, 300s (max).

use std::time::Duration;

/// Smallest retry delay in seconds
pub const MIN_BACKOFF_SECONDS: u64 = 5;

/// Largest retry delay in seconds
pub const MAX_BACKOFF_SECONDS: u64 = 300;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, capped at `max_seconds`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_seconds: u64,
    prev_seconds: u64,
    current_seconds: u64,
    max_seconds: u64,
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(MIN_BACKOFF_SECONDS, MAX_BACKOFF_SECONDS)
    }
}

impl FibonacciBackoff {
    /// Create a backoff starting at `min_seconds` and capped at `max_seconds`
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min_seconds,
            prev_seconds: 0,
            current_seconds: min_seconds,
            max_seconds,
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current_seconds;
        let next = self.prev_seconds + self.current_seconds;
        self.prev_seconds = self.current_seconds;
        self.current_seconds = next.min(self.max_seconds);
        Duration::from_secs(result)
    }

    /// Reset to the initial state (after a successful pass)
    pub fn reset(&mut self) {
        self.prev_seconds = 0;
        self.current_seconds = self.min_seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::default();
        let secs: Vec<u64> = (0..7).map(|_| backoff.next_backoff().as_secs()).collect();
        assert_eq!(secs, vec![5, 5, 10, 15, 25, 40, 65]);
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(5, 30);
        let secs: Vec<u64> = (0..7).map(|_| backoff.next_backoff().as_secs()).collect();
        // 5, 5, 10, 15, 25, then 40 is capped
        assert_eq!(secs, vec![5, 5, 10, 15, 25, 30, 30]);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::default();
        backoff.next_backoff();
        backoff.next_backoff();
        backoff.next_backoff();

        backoff.reset();

        assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
    }
}
