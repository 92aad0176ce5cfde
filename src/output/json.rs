//! JSON report formatting
//!
//! Serializes the run outcome (per-function and aggregate dispatch
//! statistics) to a JSON file for downstream tooling.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::dispatch::FunctionReport;
use crate::output::{aggregate_stats, format_duration_human};
use crate::stats::DispatchStats;
use crate::Result;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    fn from_duration(d: std::time::Duration) -> Self {
        let micros = d.as_micros() as u64;
        Self {
            micros,
            human: format_duration_human(micros),
        }
    }
}

/// Latency summary with percentiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLatency {
    pub min: JsonDuration,
    pub mean: JsonDuration,
    pub p50: JsonDuration,
    pub p95: JsonDuration,
    pub p99: JsonDuration,
    pub max: JsonDuration,
}

impl JsonLatency {
    fn from_stats(stats: &DispatchStats) -> Option<Self> {
        Some(Self {
            min: JsonDuration::from_duration(stats.latency_min()?),
            mean: JsonDuration::from_duration(stats.latency_mean()?),
            p50: JsonDuration::from_duration(stats.latency_percentile(50.0)?),
            p95: JsonDuration::from_duration(stats.latency_percentile(95.0)?),
            p99: JsonDuration::from_duration(stats.latency_percentile(99.0)?),
            max: JsonDuration::from_duration(stats.latency_max()?),
        })
    }
}

/// Dispatch counters for one function (or the aggregate)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFunctionStats {
    pub name: String,
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<JsonLatency>,
}

impl JsonFunctionStats {
    fn new(name: &str, stats: &DispatchStats) -> Self {
        Self {
            name: name.to_string(),
            issued: stats.issued(),
            succeeded: stats.succeeded(),
            failed: stats.failed(),
            timed_out: stats.timed_out(),
            latency: JsonLatency::from_stats(stats),
        }
    }
}

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub timestamp: String,
    pub iat_distribution: String,
    pub seed: u64,
    pub duration_minutes: usize,
    pub functions: Vec<JsonFunctionStats>,
    pub aggregate: JsonFunctionStats,
}

/// Build the report from per-function dispatch statistics
pub fn build_report(config: &Config, reports: &[FunctionReport]) -> JsonReport {
    let aggregate = aggregate_stats(reports);
    JsonReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        iat_distribution: config.workload.iat_distribution.to_string(),
        seed: config.workload.seed,
        duration_minutes: config.workload.duration_minutes,
        functions: reports
            .iter()
            .map(|r| JsonFunctionStats::new(&r.name, &r.stats))
            .collect(),
        aggregate: JsonFunctionStats::new("aggregate", &aggregate),
    }
}

/// Write the report to `path` as pretty-printed JSON
pub fn write_report(path: &Path, report: &JsonReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, report).context("Failed to write JSON report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DispatchConfig, IatDistribution, OutputConfig, WorkloadConfig};
    use crate::stats::InvocationOutcome;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            workload: WorkloadConfig {
                trace_dir: "trace".into(),
                duration_minutes: 2,
                iat_distribution: IatDistribution::Uniform,
                seed: 7,
            },
            dispatch: DispatchConfig {
                endpoints: vec!["localhost:8080".to_string()],
                max_concurrency: 8,
                timeout_ms: 1000,
                connect_timeout_ms: 1000,
                pool_capacity: 2,
            },
            output: OutputConfig::default(),
        }
    }

    fn test_reports() -> Vec<FunctionReport> {
        let stats = DispatchStats::new();
        stats.record_issued();
        stats.record_outcome(InvocationOutcome::Success, Some(Duration::from_millis(3)));
        vec![FunctionReport {
            name: "f1".to_string(),
            stats: Arc::new(stats),
        }]
    }

    #[test]
    fn test_build_report() {
        let report = build_report(&test_config(), &test_reports());
        assert_eq!(report.iat_distribution, "uniform");
        assert_eq!(report.seed, 7);
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.aggregate.succeeded, 1);
        assert!(report.functions[0].latency.is_some());
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = build_report(&test_config(), &test_reports());
        let serialized = serde_json::to_string(&report).unwrap();
        let decoded: JsonReport = serde_json::from_str(&serialized).unwrap();
        assert_eq!(decoded.aggregate.issued, report.aggregate.issued);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = build_report(&test_config(), &test_reports());
        write_report(&path, &report).unwrap();
        assert!(path.is_file());
    }
}
