//! FaaSPulse CLI entry point

use anyhow::{Context, Result};
use faaspulse::config::cli::Cli;
use faaspulse::config::{
    toml as config_toml, validator, Config, DispatchConfig, OutputConfig, WorkloadConfig,
};
use faaspulse::dispatch::Dispatcher;
use faaspulse::generator::SpecificationGenerator;
use faaspulse::{output, trace};
use std::sync::Arc;
use std::time::Instant;

fn main() -> Result<()> {
    println!("FaaSPulse v{}", env!("CARGO_PKG_VERSION"));
    println!("Serverless workload replay harness");
    println!();

    let cli = Cli::parse_args();
    cli.validate()?;

    let config = build_config_from_cli(&cli)?;
    validator::validate_workload(&config.workload)
        .context("Configuration validation failed")?;
    if !cli.dry_run {
        // A dry run never dials out, so endpoints are not required for it.
        validator::validate_dispatch(&config.dispatch)
            .context("Configuration validation failed")?;
    }

    print_configuration(&config);

    // Load the trace
    let mut functions = trace::load_trace(
        &config.workload.trace_dir,
        config.workload.duration_minutes,
    )?;
    if functions.is_empty() {
        anyhow::bail!(
            "trace {} contains no functions",
            config.workload.trace_dir.display()
        );
    }
    trace::assign_endpoints(&mut functions, &config.dispatch.endpoints);
    println!("Loaded {} functions", functions.len());

    // Generate per-function replay schedules. Each function gets its own
    // generator stream derived from the configured seed, so the whole run is
    // reproducible from that one value.
    let generate_start = Instant::now();
    let mut runs = Vec::with_capacity(functions.len());
    let mut total_invocations = 0usize;
    for (index, function) in functions.into_iter().enumerate() {
        let seed = config.workload.seed.wrapping_add(index as u64);
        let mut generator = SpecificationGenerator::new(seed);
        let data =
            generator.generate_invocation_data(&function, config.workload.iat_distribution);
        total_invocations += data.total_invocations();

        if config.output.debug {
            eprintln!(
                "DEBUG: {}: {} invocations over {} minutes",
                function.name,
                data.total_invocations(),
                data.iat.len()
            );
        }
        runs.push((function, Arc::new(data)));
    }
    println!(
        "Generated {} invocations in {:.3}s",
        total_invocations,
        generate_start.elapsed().as_secs_f64()
    );

    if cli.dry_run {
        println!();
        println!("Dry run mode - schedule generated successfully");
        return Ok(());
    }

    println!();
    println!("Starting replay...");
    println!();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let replay_start = Instant::now();
    let reports = runtime.block_on(async {
        let dispatcher = Dispatcher::new(config.dispatch.clone());
        dispatcher.run(runs).await
    });

    output::text::print_summary(&reports, replay_start.elapsed());

    if let Some(ref path) = config.output.json_path {
        let report = output::json::build_report(&config, &reports);
        output::json::write_report(path, &report)?;
        println!("JSON report written to {}", path.display());
    }

    Ok(())
}

/// Build configuration from CLI arguments, layered over a TOML file if given
fn build_config_from_cli(cli: &Cli) -> Result<Config> {
    if let Some(ref path) = cli.config {
        let config = config_toml::parse_toml_file(path)?;
        return config_toml::merge_cli_with_config(cli, config);
    }

    let trace_dir = cli
        .trace_dir
        .clone()
        .context("TRACE_DIR is required without --config")?;

    Ok(Config {
        workload: WorkloadConfig {
            trace_dir,
            duration_minutes: cli.duration_minutes,
            iat_distribution: cli.iat_distribution,
            seed: cli.seed,
        },
        dispatch: DispatchConfig {
            endpoints: cli.endpoint_list(),
            max_concurrency: cli.max_concurrency.unwrap_or(num_cpus::get() * 64),
            timeout_ms: cli.timeout_ms.unwrap_or(30_000),
            connect_timeout_ms: 5_000,
            pool_capacity: cli.pool_capacity.unwrap_or(4),
        },
        output: OutputConfig {
            json_path: cli.output_json.clone(),
            debug: cli.debug,
        },
    })
}

/// Display configuration
fn print_configuration(config: &Config) {
    println!("Configuration:");
    println!("  trace dir:     {}", config.workload.trace_dir.display());
    println!("  minutes:       {}", config.workload.duration_minutes);
    println!("  distribution:  {}", config.workload.iat_distribution);
    println!("  seed:          {}", config.workload.seed);
    if !config.dispatch.endpoints.is_empty() {
        println!("  endpoints:     {}", config.dispatch.endpoints.join(", "));
        println!("  concurrency:   {}", config.dispatch.max_concurrency);
        println!("  timeout:       {}ms", config.dispatch.timeout_ms);
    }
    println!();
}
