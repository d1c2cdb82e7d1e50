//! Heat dispatch simulator entry point: CLI wiring, logging and output files.

mod cli;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use heat_dispatch_sim::config::ScenarioConfig;
use heat_dispatch_sim::io::diagnostics::{DiagnosticsSink, LogDirSink, NullSink};
use heat_dispatch_sim::io::export::export_csv;
use heat_dispatch_sim::sim::{EnergySummary, simulate};

use crate::cli::Cli;

fn load_scenario(cli: &Cli) -> Result<ScenarioConfig> {
    let mut cfg = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };
    if let Some(seed) = cli.seed {
        cfg.simulation.seed = seed;
    }
    if let Some(dir) = &cli.log_dir {
        cfg.simulation.log_dir = Some(dir.clone());
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_scenario(&cli)?;
    let project = cfg.build_project().context("building the project")?;
    info!(
        producers = project.producers.len(),
        seed = cfg.simulation.seed,
        "scenario loaded"
    );

    let mut sink: Box<dyn DiagnosticsSink> = match &cfg.simulation.log_dir {
        Some(dir) => Box::new(LogDirSink::new(dir)),
        None => Box::new(NullSink),
    };

    let result = simulate(&project, sink.as_mut()).context("running the simulation")?;
    let summary = EnergySummary::from_result(&result);
    println!("{summary}");

    if let Some(path) = &cli.hourly_out {
        export_csv(&result, path)
            .with_context(|| format!("writing hourly CSV to {}", path.display()))?;
        info!(path = %path.display(), "hourly result written");
    }
    if let Some(path) = &cli.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json).with_context(|| format!("writing summary to {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }
    Ok(())
}
