//! Run report output
//!
//! Text summary to stdout and an optional JSON report file.

pub mod json;
pub mod text;

use crate::dispatch::FunctionReport;
use crate::stats::DispatchStats;

/// Merge per-function statistics into one aggregate
pub fn aggregate_stats(reports: &[FunctionReport]) -> DispatchStats {
    let aggregate = DispatchStats::new();
    for report in reports {
        aggregate.merge(&report.stats);
    }
    aggregate
}

/// Format a duration human-readably, scaled to the dominant unit
pub fn format_duration_human(micros: u64) -> String {
    if micros >= 1_000_000 {
        format!("{:.2}s", micros as f64 / 1_000_000.0)
    } else if micros >= 1_000 {
        format!("{:.2}ms", micros as f64 / 1_000.0)
    } else {
        format!("{}us", micros)
    }
}
