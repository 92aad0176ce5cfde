//! Trace loading and the empirical function model
//!
//! This module parses an Azure-Functions-2019-style trace directory into
//! [`Function`] records that the specification generator consumes. A trace
//! directory contains three CSV files:
//!
//! - `invocations.csv` — per-minute invocation counts, one row per function
//! - `durations.csv` — execution-duration percentiles (ms), one row per function
//! - `memory.csv` — allocated-memory percentiles (MiB), one row per app
//!
//! Rows are joined on the owner/app/function hashes, as in the public Azure
//! dataset. Percentile columns become [`PercentileTable`]s, the discrete
//! empirical CDFs that drive inverse-CDF sampling.
//!
//! # Validation
//!
//! A corrupted trace must never silently produce a plausible-looking but wrong
//! schedule, so every table is validated at construction: percentiles must be
//! strictly increasing within [0, 100] and values non-decreasing. Violations
//! surface as [`TraceError`] and abort the run.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use csv::ReaderBuilder;
use thiserror::Error;

use crate::Result;

/// Fatal trace-input errors
///
/// These all indicate corrupted or incomplete trace data. There is no recovery
/// path: the run aborts rather than degrade replay fidelity.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("{table} percentile table for '{key}': {reason}")]
    InvalidPercentileTable {
        table: &'static str,
        key: String,
        reason: String,
    },

    #[error("malformed row {row} in {file}: {reason}")]
    MalformedRow {
        file: String,
        row: usize,
        reason: String,
    },

    #[error("no durations record for function '{key}'")]
    MissingDurations { key: String },

    #[error("no memory record for app '{key}'")]
    MissingMemory { key: String },
}

/// A discrete empirical CDF: ordered (percentile, value) breakpoints
///
/// Immutable once constructed; the constructor is the single validation point.
/// Percentiles are in [0, 100] and strictly increasing, values non-decreasing.
/// One table describes execution duration (ms), another allocated memory (MiB).
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileTable {
    points: Vec<(f64, f64)>,
}

impl PercentileTable {
    /// Build a table from (percentile, value) breakpoints, validating shape
    pub fn new(
        table: &'static str,
        key: &str,
        points: Vec<(f64, f64)>,
    ) -> std::result::Result<Self, TraceError> {
        let invalid = |reason: String| TraceError::InvalidPercentileTable {
            table,
            key: key.to_string(),
            reason,
        };

        if points.is_empty() {
            return Err(invalid("table is empty".to_string()));
        }
        for (i, &(p, v)) in points.iter().enumerate() {
            if !p.is_finite() || !(0.0..=100.0).contains(&p) {
                return Err(invalid(format!("percentile {} out of range [0, 100]", p)));
            }
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(format!("value {} is not a non-negative number", v)));
            }
            if i > 0 {
                let (prev_p, prev_v) = points[i - 1];
                if p <= prev_p {
                    return Err(invalid(format!(
                        "percentiles not strictly increasing ({} after {})",
                        p, prev_p
                    )));
                }
                if v < prev_v {
                    return Err(invalid(format!(
                        "values not non-decreasing ({} after {})",
                        v, prev_v
                    )));
                }
            }
        }

        Ok(Self { points })
    }

    /// Breakpoints in ascending percentile order
    #[inline]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Value at the lowest recorded percentile
    #[inline]
    pub fn min_value(&self) -> f64 {
        self.points[0].1
    }

    /// Value at the highest recorded percentile
    #[inline]
    pub fn max_value(&self) -> f64 {
        self.points[self.points.len() - 1].1
    }
}

/// One traced function: empirical profile plus its replay schedule input
#[derive(Debug, Clone)]
pub struct Function {
    /// Function identity (owner/app/function hash triple from the trace)
    pub name: String,
    /// Dispatch endpoint (`host:port`), assigned after loading
    pub endpoint: String,
    /// Execution-duration percentile table, milliseconds
    pub runtime_stats: PercentileTable,
    /// Allocated-memory percentile table, MiB
    pub memory_stats: PercentileTable,
    /// Invocation count for each simulated minute
    pub invocations_per_minute: Vec<usize>,
}

impl Function {
    /// Total invocations over the whole schedule
    pub fn total_invocations(&self) -> usize {
        self.invocations_per_minute.iter().sum()
    }
}

/// Percentile ranks of the duration columns in `durations.csv`
const DURATION_PERCENTILES: [f64; 7] = [0.0, 1.0, 25.0, 50.0, 75.0, 99.0, 100.0];

/// Percentile ranks of the memory columns in `memory.csv`
const MEMORY_PERCENTILES: [f64; 8] = [1.0, 5.0, 25.0, 50.0, 75.0, 95.0, 99.0, 100.0];

/// Column index of the first per-minute count in `invocations.csv`
const FIRST_MINUTE_COLUMN: usize = 4;

/// Column index of the first percentile in `durations.csv`
/// (after HashOwner, HashApp, HashFunction, Average, Count, Minimum, Maximum)
const FIRST_DURATION_COLUMN: usize = 7;

/// Column index of the first percentile in `memory.csv`
/// (after HashOwner, HashApp, SampleCount, AverageAllocatedMb)
const FIRST_MEMORY_COLUMN: usize = 4;

/// Load a trace directory into validated [`Function`] records
///
/// Counts are truncated or zero-padded to `duration_minutes`. Functions whose
/// duration or memory record is missing are a fatal trace error, as are
/// malformed percentile tables. Endpoints are left empty; the caller assigns
/// them from its dispatch configuration.
pub fn load_trace(dir: &Path, duration_minutes: usize) -> Result<Vec<Function>> {
    let durations = read_duration_tables(&dir.join("durations.csv"))?;
    let memory = read_memory_tables(&dir.join("memory.csv"))?;

    let inv_path = dir.join("invocations.csv");
    let mut reader = ReaderBuilder::new()
        .from_path(&inv_path)
        .with_context(|| format!("Failed to open {}", inv_path.display()))?;

    let mut functions = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read {}", inv_path.display()))?;
        if record.len() <= FIRST_MINUTE_COLUMN {
            return Err(TraceError::MalformedRow {
                file: "invocations.csv".to_string(),
                row,
                reason: "no per-minute count columns".to_string(),
            }
            .into());
        }

        let fn_key = format!("{}_{}_{}", &record[0], &record[1], &record[2]);
        let app_key = format!("{}_{}", &record[0], &record[1]);

        let mut counts = Vec::with_capacity(duration_minutes);
        for col in FIRST_MINUTE_COLUMN..record.len() {
            if counts.len() == duration_minutes {
                break;
            }
            let count: usize =
                record[col]
                    .trim()
                    .parse()
                    .map_err(|_| TraceError::MalformedRow {
                        file: "invocations.csv".to_string(),
                        row,
                        reason: format!("invocation count '{}' is not an integer", &record[col]),
                    })?;
            counts.push(count);
        }
        counts.resize(duration_minutes, 0);

        let runtime_stats = durations
            .get(&fn_key)
            .cloned()
            .ok_or_else(|| TraceError::MissingDurations { key: fn_key.clone() })?;
        let memory_stats = memory
            .get(&app_key)
            .cloned()
            .ok_or_else(|| TraceError::MissingMemory { key: app_key.clone() })?;

        functions.push(Function {
            name: fn_key,
            endpoint: String::new(),
            runtime_stats,
            memory_stats,
            invocations_per_minute: counts,
        });
    }

    Ok(functions)
}

/// Assign dispatch endpoints round-robin over the configured list
///
/// A dry run carries no endpoints; functions then keep their empty endpoint.
pub fn assign_endpoints(functions: &mut [Function], endpoints: &[String]) {
    if endpoints.is_empty() {
        return;
    }
    for (i, function) in functions.iter_mut().enumerate() {
        function.endpoint = endpoints[i % endpoints.len()].clone();
    }
}

fn read_duration_tables(path: &Path) -> Result<HashMap<String, PercentileTable>> {
    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut tables = HashMap::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
        let key = format!("{}_{}_{}", &record[0], &record[1], &record[2]);
        let points = percentile_points(
            &record,
            FIRST_DURATION_COLUMN,
            &DURATION_PERCENTILES,
            "durations.csv",
            row,
        )?;
        let table = PercentileTable::new("duration", &key, points)?;
        tables.insert(key, table);
    }
    Ok(tables)
}

fn read_memory_tables(path: &Path) -> Result<HashMap<String, PercentileTable>> {
    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut tables = HashMap::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
        let key = format!("{}_{}", &record[0], &record[1]);
        let points = percentile_points(
            &record,
            FIRST_MEMORY_COLUMN,
            &MEMORY_PERCENTILES,
            "memory.csv",
            row,
        )?;
        let table = PercentileTable::new("memory", &key, points)?;
        tables.insert(key, table);
    }
    Ok(tables)
}

fn percentile_points(
    record: &csv::StringRecord,
    first_column: usize,
    percentiles: &[f64],
    file: &str,
    row: usize,
) -> std::result::Result<Vec<(f64, f64)>, TraceError> {
    if record.len() < first_column + percentiles.len() {
        return Err(TraceError::MalformedRow {
            file: file.to_string(),
            row,
            reason: format!(
                "expected {} percentile columns, found {}",
                percentiles.len(),
                record.len().saturating_sub(first_column)
            ),
        });
    }

    let mut points = Vec::with_capacity(percentiles.len());
    for (i, &percentile) in percentiles.iter().enumerate() {
        let raw = &record[first_column + i];
        let value: f64 = raw.trim().parse().map_err(|_| TraceError::MalformedRow {
            file: file.to_string(),
            row,
            reason: format!("percentile value '{}' is not a number", raw),
        })?;
        points.push((percentile, value));
    }
    Ok(points)
}
