//! Dispatch statistics
//!
//! Counters and latency tracking for the dispatch layer. Invoker tasks record
//! outcomes concurrently, so counters are cache-line-aligned atomics (one per
//! line to avoid false sharing) and the latency histogram sits behind a mutex
//! that is touched once per completed invocation.
//!
//! The goodness-of-fit machinery for schedule validation lives in [`fit`]; it
//! has no runtime role in dispatch.

pub mod fit;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;

/// Cache-line aligned atomic counter
///
/// Padded to 64 bytes so adjacent counters never share a cache line.
#[repr(align(64))]
#[derive(Debug)]
pub struct AlignedCounter {
    value: AtomicU64,
    _padding: [u8; 56],
}

impl AlignedCounter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; 56],
        }
    }

    /// Relaxed ordering: counters are independent, no ordering is needed
    #[inline]
    pub fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for AlignedCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one dispatched invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Response received within the deadline
    Success,
    /// Connection or protocol failure
    Failed,
    /// No response within the per-invocation deadline
    TimedOut,
}

/// Shared statistics for one dispatch run
///
/// One instance per function, shared across that function's invoker tasks via
/// `Arc`. Merged into an aggregate for the final report.
#[derive(Debug)]
pub struct DispatchStats {
    issued: AlignedCounter,
    succeeded: AlignedCounter,
    failed: AlignedCounter,
    timed_out: AlignedCounter,
    /// Round-trip latency, microseconds; 1 µs to 1 hour, 3 significant digits
    latency: Mutex<Histogram<u64>>,
}

impl DispatchStats {
    pub fn new() -> Self {
        let latency = Histogram::new_with_bounds(1, 3_600_000_000, 3)
            .expect("valid histogram bounds");
        Self {
            issued: AlignedCounter::new(),
            succeeded: AlignedCounter::new(),
            failed: AlignedCounter::new(),
            timed_out: AlignedCounter::new(),
            latency: Mutex::new(latency),
        }
    }

    /// Record that an invocation was fired
    #[inline]
    pub fn record_issued(&self) {
        self.issued.add(1);
    }

    /// Record the outcome of an invocation; latency only applies to successes
    pub fn record_outcome(&self, outcome: InvocationOutcome, latency: Option<Duration>) {
        match outcome {
            InvocationOutcome::Success => {
                self.succeeded.add(1);
                if let Some(latency) = latency {
                    let micros = (latency.as_micros() as u64).max(1);
                    // saturating_record clamps out-of-range samples instead of
                    // dropping them
                    self.latency.lock().unwrap().saturating_record(micros);
                }
            }
            InvocationOutcome::Failed => self.failed.add(1),
            InvocationOutcome::TimedOut => self.timed_out.add(1),
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued.get()
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.get()
    }

    pub fn failed(&self) -> u64 {
        self.failed.get()
    }

    pub fn timed_out(&self) -> u64 {
        self.timed_out.get()
    }

    /// Latency at the given percentile, if any successes were recorded
    pub fn latency_percentile(&self, percentile: f64) -> Option<Duration> {
        let hist = self.latency.lock().unwrap();
        if hist.is_empty() {
            return None;
        }
        Some(Duration::from_micros(hist.value_at_percentile(percentile)))
    }

    /// Mean success latency
    pub fn latency_mean(&self) -> Option<Duration> {
        let hist = self.latency.lock().unwrap();
        if hist.is_empty() {
            return None;
        }
        Some(Duration::from_micros(hist.mean() as u64))
    }

    pub fn latency_min(&self) -> Option<Duration> {
        let hist = self.latency.lock().unwrap();
        if hist.is_empty() {
            return None;
        }
        Some(Duration::from_micros(hist.min()))
    }

    pub fn latency_max(&self) -> Option<Duration> {
        let hist = self.latency.lock().unwrap();
        if hist.is_empty() {
            return None;
        }
        Some(Duration::from_micros(hist.max()))
    }

    /// Fold another run's statistics into this one
    pub fn merge(&self, other: &DispatchStats) {
        self.issued.add(other.issued.get());
        self.succeeded.add(other.succeeded.get());
        self.failed.add(other.failed.get());
        self.timed_out.add(other.timed_out.get());

        let other_hist = other.latency.lock().unwrap();
        self.latency
            .lock()
            .unwrap()
            .add(&*other_hist)
            .expect("histograms share bounds");
    }
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_outcomes() {
        let stats = DispatchStats::new();
        stats.record_issued();
        stats.record_issued();
        stats.record_issued();
        stats.record_outcome(InvocationOutcome::Success, Some(Duration::from_millis(5)));
        stats.record_outcome(InvocationOutcome::Failed, None);
        stats.record_outcome(InvocationOutcome::TimedOut, None);

        assert_eq!(stats.issued(), 3);
        assert_eq!(stats.succeeded(), 1);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.timed_out(), 1);
        assert!(stats.latency_percentile(50.0).unwrap() >= Duration::from_millis(4));
    }

    #[test]
    fn test_empty_latency_is_none() {
        let stats = DispatchStats::new();
        assert!(stats.latency_percentile(99.0).is_none());
        assert!(stats.latency_mean().is_none());
    }

    #[test]
    fn test_merge() {
        let a = DispatchStats::new();
        let b = DispatchStats::new();
        a.record_issued();
        a.record_outcome(InvocationOutcome::Success, Some(Duration::from_millis(1)));
        b.record_issued();
        b.record_outcome(InvocationOutcome::Success, Some(Duration::from_millis(3)));

        a.merge(&b);
        assert_eq!(a.issued(), 2);
        assert_eq!(a.succeeded(), 2);
        assert!(a.latency_max().unwrap() >= Duration::from_millis(2));
    }

    #[test]
    fn test_concurrent_recording() {
        let stats = Arc::new(DispatchStats::new());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let stats = Arc::clone(&stats);
                scope.spawn(move || {
                    for _ in 0..1000 {
                        stats.record_issued();
                        stats.record_outcome(
                            InvocationOutcome::Success,
                            Some(Duration::from_micros(100)),
                        );
                    }
                });
            }
        });
        assert_eq!(stats.issued(), 8000);
        assert_eq!(stats.succeeded(), 8000);
    }
}
