//! Text output formatting
//!
//! Human-readable run summary printed to stdout at the end of a dispatch run.

use std::time::Duration;

use crate::dispatch::FunctionReport;
use crate::output::{aggregate_stats, format_duration_human};
use crate::stats::DispatchStats;

/// Print the end-of-run summary
pub fn print_summary(reports: &[FunctionReport], elapsed: Duration) {
    println!();
    println!("=== Dispatch Summary ===");
    println!("Wall-clock time: {:.2}s", elapsed.as_secs_f64());
    println!();

    for report in reports {
        print_function(&report.name, &report.stats);
    }

    if reports.len() > 1 {
        let aggregate = aggregate_stats(reports);
        print_function("TOTAL", &aggregate);
    }
}

fn print_function(name: &str, stats: &DispatchStats) {
    println!("{}", name);
    println!(
        "  invocations: {} issued, {} ok, {} failed, {} timed out",
        stats.issued(),
        stats.succeeded(),
        stats.failed(),
        stats.timed_out()
    );

    if let (Some(min), Some(mean), Some(max)) =
        (stats.latency_min(), stats.latency_mean(), stats.latency_max())
    {
        println!(
            "  latency: min {} / mean {} / max {}",
            format_duration_human(min.as_micros() as u64),
            format_duration_human(mean.as_micros() as u64),
            format_duration_human(max.as_micros() as u64)
        );
        for percentile in [50.0, 95.0, 99.0] {
            if let Some(value) = stats.latency_percentile(percentile) {
                println!(
                    "    p{:<4} {}",
                    percentile,
                    format_duration_human(value.as_micros() as u64)
                );
            }
        }
    }
    println!();
}
