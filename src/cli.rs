//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "heat-dispatch-sim", version)]
#[command(about = "Hourly district-heating dispatch simulation over one year")]
#[command(
    long_about = "Dispatches heat producers and a stratified buffer tank against an hourly \
    heat demand for 8760 hours and prints an annual energy summary.\n\
    \nIf neither --scenario nor --preset is given, the baseline preset is used.\n\
    \nExamples:\n  \
    heat-dispatch-sim --preset solar_district\n  \
    heat-dispatch-sim --scenario plant.toml --hourly-out hourly.csv"
)]
pub struct Cli {
    /// Load the scenario from a TOML file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, solar_district, heat_pump)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override the random seed of synthetic profiles
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the hourly result to a CSV file
    #[arg(long, value_name = "PATH")]
    pub hourly_out: Option<PathBuf>,

    /// Write the annual summary as JSON
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Directory for diagnostic artifacts (overrides the scenario setting)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_source() {
        let cli = Cli::try_parse_from(["heat-dispatch-sim"]).expect("parse should succeed");
        assert!(cli.scenario.is_none());
        assert!(cli.preset.is_none());
    }

    #[test]
    fn parses_all_options() {
        let cli = Cli::try_parse_from([
            "heat-dispatch-sim",
            "--preset",
            "heat_pump",
            "--seed",
            "7",
            "--hourly-out",
            "out.csv",
            "--summary-json",
            "summary.json",
            "--log-dir",
            "logs",
        ])
        .expect("parse should succeed");
        assert_eq!(cli.preset.as_deref(), Some("heat_pump"));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.hourly_out, Some(PathBuf::from("out.csv")));
        assert_eq!(cli.summary_json, Some(PathBuf::from("summary.json")));
        assert_eq!(cli.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn scenario_and_preset_conflict() {
        let result = Cli::try_parse_from([
            "heat-dispatch-sim",
            "--scenario",
            "a.toml",
            "--preset",
            "baseline",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_seed() {
        assert!(Cli::try_parse_from(["heat-dispatch-sim", "--seed", "abc"]).is_err());
    }
}
