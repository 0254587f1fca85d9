//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - refreshes the FX rate (best-effort)
//! - runs the forecast pipeline
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, ReplayArgs, RunArgs};
use crate::data::{ForecastClient, FxClient};
use crate::domain::ScenarioStore;
use crate::error::AppError;

pub mod pipeline;
pub mod state;

/// Entry point for the `bopf` binary.
pub fn run() -> Result<(), AppError> {
    // We want `bopf` and `bopf --fx 305` to behave like `bopf tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args, OutputMode::Full),
        Command::Indicators(args) => handle_run(args, OutputMode::IndicatorsOnly),
        Command::Replay(args) => handle_replay(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    IndicatorsOnly,
}

/// Build the baseline scenario store from CLI override flags.
pub fn store_from_args(args: &RunArgs) -> Result<ScenarioStore, AppError> {
    let mut store = ScenarioStore::default();
    store.apply(&args.scenario_patch())?;
    Ok(store)
}

/// Best-effort FX refresh: on success the stored rate is replaced (rounded),
/// on failure the old value stays and nothing is reported.
pub fn refresh_fx(store: &mut ScenarioStore) {
    if let Ok(rate) = FxClient::from_env().fetch_usd_lkr() {
        let _ = store.set_fx(rate);
    }
}

fn forecast_client(args: &RunArgs) -> ForecastClient {
    match &args.api_url {
        Some(url) => ForecastClient::with_url(url.clone()),
        None => ForecastClient::from_env(),
    }
}

fn handle_run(args: RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let mut store = store_from_args(&args)?;
    if !args.no_fx {
        refresh_fx(&mut store);
    }

    let client = forecast_client(&args);
    let output = pipeline::run_forecast(&client, store.get())?;

    if mode == OutputMode::Full {
        println!("{}", crate::report::format_summary(&output));
    }
    println!("{}", crate::report::format_indicators(&output.indicators));
    println!("{}", crate::report::format_alerts(&output.alerts));
    if mode == OutputMode::Full {
        println!("{}", crate::report::format_insights(&output));
    }

    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, &output.series)?;
    }

    Ok(())
}

fn handle_replay(args: ReplayArgs) -> Result<(), AppError> {
    let series = crate::io::export::read_series_csv(&args.csv)?;

    let mut store = ScenarioStore::default();
    store.apply(&args.scenario_patch())?;

    let output = pipeline::replay_output(store.get().clone(), series);
    println!("{}", crate::report::format_indicators(&output.indicators));
    println!("{}", crate::report::format_alerts(&output.alerts));
    Ok(())
}

/// Rewrite argv so `bopf` defaults to `bopf tui`.
///
/// Rules:
/// - `bopf`                     -> `bopf tui`
/// - `bopf --fx 305 ...`        -> `bopf tui --fx 305 ...`
/// - `bopf --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "indicators" | "replay" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
