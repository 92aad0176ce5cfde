//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub workload: WorkloadConfig,
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Workload generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Trace directory (invocations.csv, durations.csv, memory.csv)
    pub trace_dir: PathBuf,
    /// Number of simulated minutes to replay
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: usize,
    /// Inter-arrival-time distribution
    #[serde(default)]
    pub iat_distribution: IatDistribution,
    /// Seed for the specification generators (reproducible schedules)
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Inter-arrival-time distribution tag
///
/// The parsing layers (clap, serde) are the only way a tag enters the system,
/// so an unrecognized tag fails there — before any schedule is generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IatDistribution {
    /// Evenly spaced invocations within each minute
    Equidistant,
    /// Gaps drawn uniformly at random
    Uniform,
    /// Poisson arrivals (exponential gaps)
    #[default]
    Exponential,
}

impl fmt::Display for IatDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IatDistribution::Equidistant => write!(f, "equidistant"),
            IatDistribution::Uniform => write!(f, "uniform"),
            IatDistribution::Exponential => write!(f, "exponential"),
        }
    }
}

/// Dispatch layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Workload-function endpoints (`host:port`), assigned round-robin
    pub endpoints: Vec<String>,
    /// Cap on concurrently in-flight invocations
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-invocation deadline, milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout when the pool dials a new connection, milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Pooled connections kept per endpoint
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write a JSON report to this path
    #[serde(default)]
    pub json_path: Option<PathBuf>,
    /// Verbose diagnostics on stderr
    #[serde(default)]
    pub debug: bool,
}

fn default_duration_minutes() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_max_concurrency() -> usize {
    num_cpus::get() * 64
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_pool_capacity() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iat_distribution_display() {
        assert_eq!(IatDistribution::Equidistant.to_string(), "equidistant");
        assert_eq!(IatDistribution::Uniform.to_string(), "uniform");
        assert_eq!(IatDistribution::Exponential.to_string(), "exponential");
    }

    #[test]
    fn test_iat_distribution_default() {
        assert_eq!(IatDistribution::default(), IatDistribution::Exponential);
    }

    #[test]
    fn test_unknown_distribution_tag_is_rejected() {
        let toml = r#"
            [workload]
            trace_dir = "trace"
            iat_distribution = "gaussian"

            [dispatch]
            endpoints = ["localhost:8080"]
        "#;
        assert!(crate::config::toml::parse_toml_string(toml).is_err());
    }
}
