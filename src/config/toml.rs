//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(ref trace_dir) = cli.trace_dir {
        config.workload.trace_dir = trace_dir.clone();
    }
    if cli.duration_minutes != 10 {
        config.workload.duration_minutes = cli.duration_minutes;
    }
    if cli.iat_distribution != IatDistribution::Exponential {
        config.workload.iat_distribution = cli.iat_distribution;
    }
    if cli.seed != 42 {
        config.workload.seed = cli.seed;
    }

    let endpoints = cli.endpoint_list();
    if !endpoints.is_empty() {
        config.dispatch.endpoints = endpoints;
    }
    if let Some(max) = cli.max_concurrency {
        config.dispatch.max_concurrency = max;
    }
    if let Some(timeout) = cli.timeout_ms {
        config.dispatch.timeout_ms = timeout;
    }
    if let Some(capacity) = cli.pool_capacity {
        config.dispatch.pool_capacity = capacity;
    }

    if let Some(ref path) = cli.output_json {
        config.output.json_path = Some(path.clone());
    }
    if cli.debug {
        config.output.debug = true;
    }

    Ok(config)
}
