//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workload(&config.workload)?;
    validate_dispatch(&config.dispatch)?;
    Ok(())
}

/// Validate workload configuration
pub fn validate_workload(workload: &WorkloadConfig) -> Result<()> {
    if workload.duration_minutes == 0 {
        anyhow::bail!("duration_minutes must be at least 1");
    }
    if !workload.trace_dir.is_dir() {
        anyhow::bail!(
            "trace directory {} does not exist",
            workload.trace_dir.display()
        );
    }
    for file in ["invocations.csv", "durations.csv", "memory.csv"] {
        if !workload.trace_dir.join(file).is_file() {
            anyhow::bail!(
                "trace directory {} is missing {}",
                workload.trace_dir.display(),
                file
            );
        }
    }
    Ok(())
}

/// Validate dispatch configuration
pub fn validate_dispatch(dispatch: &DispatchConfig) -> Result<()> {
    if dispatch.endpoints.is_empty() {
        anyhow::bail!("at least one dispatch endpoint is required");
    }
    for endpoint in &dispatch.endpoints {
        if !endpoint.contains(':') {
            anyhow::bail!("endpoint '{}' is not of the form host:port", endpoint);
        }
    }
    if dispatch.max_concurrency == 0 {
        anyhow::bail!("max_concurrency must be at least 1");
    }
    if dispatch.timeout_ms == 0 {
        anyhow::bail!("timeout_ms must be at least 1");
    }
    if dispatch.pool_capacity == 0 {
        anyhow::bail!("pool_capacity must be at least 1");
    }
    Ok(())
}
