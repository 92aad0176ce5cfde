//! High-precision timing utilities
//!
//! Round-trip latencies are measured with a monotonic clock; this wrapper
//! keeps the call sites terse.

use std::time::{Duration, Instant};

/// High-precision timestamp for latency measurements
///
/// A thin wrapper around `std::time::Instant` with convenience methods for
/// latency tracking.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: Instant,
}

impl Timestamp {
    /// Create a new timestamp representing the current time
    #[inline]
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
        }
    }

    /// Get the elapsed time since this timestamp
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }

    /// Get the elapsed time in microseconds
    #[inline]
    pub fn elapsed_micros(&self) -> u64 {
        self.elapsed().as_micros() as u64
    }

    /// Get the duration between this timestamp and another
    #[inline]
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        self.instant.duration_since(earlier.instant)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let ts = Timestamp::now();
        let first = ts.elapsed();
        let second = ts.elapsed();
        assert!(second >= first);
    }

    #[test]
    fn test_duration_since() {
        let earlier = Timestamp::now();
        std::thread::sleep(Duration::from_millis(1));
        let later = Timestamp::now();
        assert!(later.duration_since(earlier) >= Duration::from_millis(1));
    }
}
