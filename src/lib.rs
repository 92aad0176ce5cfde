//! FaaSPulse - Serverless workload replay harness
//!
//! FaaSPulse replays empirical serverless traces against live or emulated
//! functions with precise, reproducible timing.
//!
//! # Architecture
//!
//! - **Trace loading**: Azure-style CSV traces become per-function profiles
//! - **Specification generation**: exact inter-arrival schedules plus
//!   percentile-sampled execution targets, deterministic under a fixed seed
//! - **Dispatch**: pooled TCP connections fire each invocation at its
//!   scheduled offset
//! - **Stats**: dispatch counters, latency percentiles, schedule
//!   goodness-of-fit validation

pub mod config;
pub mod dispatch;
pub mod generator;
pub mod output;
pub mod stats;
pub mod trace;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use generator::SpecificationGenerator;

/// Result type used throughout FaaSPulse
pub type Result<T> = anyhow::Result<T>;
