//! # Exponential Backoff
//!
//! Provides a doubling backoff for retrying failed reconciliations of one resource.
//!
//! Sequence with the defaults (1s start, 300s cap): 1s, 2s, 4s, 8s, ... 256s, 300s (max).
//!
//! ## Usage
//!
//! ```rust
//! use frigate_controller::controller::backoff::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = ExponentialBackoff::new(1000, 8000);
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(1));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(4));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(8));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(8));
//! ```

use std::time::Duration;

/// Exponential backoff calculator
///
/// Each call returns the current delay and doubles it for the next call,
/// capped at `max_ms`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Starting delay in milliseconds (for reset)
    start_ms: u64,
    /// Delay returned by the next call in milliseconds
    current_ms: u64,
    /// Maximum delay in milliseconds
    max_ms: u64,
}

impl ExponentialBackoff {
    /// Create a new backoff with the given start and maximum in milliseconds
    ///
    /// A zero start is raised to 1ms so the sequence can grow, and a maximum
    /// below the start is raised to the start.
    #[must_use]
    pub fn new(start_ms: u64, max_ms: u64) -> Self {
        let start_ms = start_ms.max(1);
        Self {
            start_ms,
            current_ms: start_ms,
            max_ms: max_ms.max(start_ms),
        }
    }

    /// Get the next backoff in milliseconds and advance the sequence
    pub fn next_backoff_ms(&mut self) -> u64 {
        let result = self.current_ms;
        self.current_ms = self.current_ms.saturating_mul(2).min(self.max_ms);
        result
    }

    /// Get the next backoff as a `Duration` and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_millis(self.next_backoff_ms())
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.current_ms = self.start_ms;
    }
}
