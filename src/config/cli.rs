//! CLI argument parsing using clap

use clap::Parser;
use std::path::PathBuf;

use crate::config::IatDistribution;

/// FaaSPulse - Serverless workload replay harness
#[derive(Parser, Debug)]
#[command(name = "faaspulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Trace directory containing invocations.csv, durations.csv, memory.csv
    ///
    /// Not required when --config provides the workload section
    #[arg(value_name = "TRACE_DIR")]
    pub trace_dir: Option<PathBuf>,

    /// TOML configuration file (CLI arguments take precedence)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Workload Options ===
    /// Number of simulated minutes to replay
    #[arg(short = 'm', long, default_value = "10")]
    pub duration_minutes: usize,

    /// Inter-arrival-time distribution
    #[arg(long, value_enum, default_value = "exponential")]
    pub iat_distribution: IatDistribution,

    /// Random seed (fixed seed reproduces the schedule exactly)
    #[arg(long, default_value = "42")]
    pub seed: u64,

    // === Dispatch Options ===
    /// Comma-separated workload-function endpoints (e.g. "10.0.1.10:8080,10.0.1.11:8080")
    #[arg(short = 'e', long)]
    pub endpoints: Option<String>,

    /// Cap on concurrently in-flight invocations
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Per-invocation deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Pooled connections per endpoint
    #[arg(long)]
    pub pool_capacity: Option<usize>,

    // === Output Options ===
    /// Write a JSON run report to this path
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Generate and summarize the schedule without dispatching
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose diagnostics on stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Early checks that do not need the merged configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.config.is_none() && self.trace_dir.is_none() {
            anyhow::bail!("either TRACE_DIR or --config must be given");
        }
        if let Some(max) = self.max_concurrency {
            if max == 0 {
                anyhow::bail!("max_concurrency must be at least 1");
            }
        }
        if self.duration_minutes == 0 {
            anyhow::bail!("duration_minutes must be at least 1");
        }
        Ok(())
    }

    /// Endpoints split out of the comma-separated form
    pub fn endpoint_list(&self) -> Vec<String> {
        self.endpoints
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
