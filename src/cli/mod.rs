//! Command-line parsing for the BOPF tea price dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the scenario/metric code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{ScenarioField, ScenarioPatch};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bopf", version, about = "Mid-Country BOPF Tea Price Dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a forecast, print the full report, and optionally export the series.
    Run(RunArgs),
    /// Print indicators and alerts only (useful for scripting).
    Indicators(RunArgs),
    /// Recompute indicators from a previously exported series CSV (offline).
    Replay(ReplayArgs),
    /// Launch the interactive TUI dashboard.
    ///
    /// This uses the same underlying forecast pipeline as `bopf run`, but
    /// renders results in a terminal UI using Ratatui.
    Tui(RunArgs),
}

/// Common options for forecast-backed commands.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Forecast service URL (overrides BOPF_FORECAST_URL).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Skip the startup FX refresh and keep the scenario's FX rate.
    #[arg(long)]
    pub no_fx: bool,

    /// USD→LKR exchange rate.
    #[arg(long)]
    pub fx: Option<f64>,

    /// Kenya BOPF spot price, USD/kg.
    #[arg(long = "kenya-usd")]
    pub kenya_usd: Option<f64>,

    /// India BOPF spot price, USD/kg.
    #[arg(long = "india-usd")]
    pub india_usd: Option<f64>,

    /// FOB weighted-average export price, Rs/kg.
    #[arg(long)]
    pub fob: Option<f64>,

    /// Weekly rainfall sum, mm.
    #[arg(long)]
    pub rain: Option<f64>,

    /// Weekly mean temperature, °C.
    #[arg(long)]
    pub temp: Option<f64>,

    /// Weekly mean humidity, %.
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Calendar month (1-12).
    #[arg(long)]
    pub month: Option<u32>,

    /// Export the merged series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for offline replay of an exported series.
#[derive(Debug, Parser)]
pub struct ReplayArgs {
    /// Series CSV produced by `bopf run --export` (or the TUI export key).
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// USD→LKR rate used for competitor spreads.
    #[arg(long)]
    pub fx: Option<f64>,

    /// Weekly mean temperature, °C (field pressure / alerts).
    #[arg(long)]
    pub temp: Option<f64>,

    /// Weekly mean humidity, % (field pressure / alerts).
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Weekly rainfall sum, mm (alerts).
    #[arg(long)]
    pub rain: Option<f64>,
}

impl RunArgs {
    /// Collect the scenario override flags into a patch.
    pub fn scenario_patch(&self) -> ScenarioPatch {
        let mut patch = ScenarioPatch::new();
        let pairs = [
            (ScenarioField::Fx, self.fx),
            (ScenarioField::KenyaUsd, self.kenya_usd),
            (ScenarioField::IndiaUsd, self.india_usd),
            (ScenarioField::FobAvg, self.fob),
            (ScenarioField::Rain, self.rain),
            (ScenarioField::Temp, self.temp),
            (ScenarioField::Humidity, self.humidity),
            (ScenarioField::Month, self.month.map(f64::from)),
        ];
        for (field, value) in pairs {
            if let Some(v) = value {
                patch.set(field, v);
            }
        }
        patch
    }
}

impl ReplayArgs {
    pub fn scenario_patch(&self) -> ScenarioPatch {
        let mut patch = ScenarioPatch::new();
        let pairs = [
            (ScenarioField::Fx, self.fx),
            (ScenarioField::Temp, self.temp),
            (ScenarioField::Humidity, self.humidity),
            (ScenarioField::Rain, self.rain),
        ];
        for (field, value) in pairs {
            if let Some(v) = value {
                patch.set(field, v);
            }
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_collect_into_a_patch() {
        let cli = Cli::parse_from(["bopf", "run", "--fx", "305", "--temp", "27.5", "--month", "7"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let patch = args.scenario_patch();
        assert_eq!(patch.get(ScenarioField::Fx), Some(305.0));
        assert_eq!(patch.get(ScenarioField::Temp), Some(27.5));
        assert_eq!(patch.get(ScenarioField::Month), Some(7.0));
        assert_eq!(patch.get(ScenarioField::Rain), None);
    }

    #[test]
    fn no_flags_means_empty_patch() {
        let cli = Cli::parse_from(["bopf", "indicators"]);
        let Command::Indicators(args) = cli.command else {
            panic!("expected indicators command");
        };
        assert!(args.scenario_patch().is_empty());
    }
}
