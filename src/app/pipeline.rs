//! Shared forecast pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! scenario -> forecast request -> merge -> indicators -> alerts
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::data::ForecastClient;
use crate::domain::{
    Alert, CompetitorPoint, Indicators, MarketSnapshot, MergedRow, ScenarioInput,
};
use crate::error::AppError;
use crate::metrics::{classify_alerts, compute_indicators};
use crate::series::merge_series;

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub scenario: ScenarioInput,
    pub snapshot: MarketSnapshot,
    pub series: Vec<MergedRow>,
    pub indicators: Indicators,
    pub alerts: Vec<Alert>,
}

/// Execute one blocking forecast run and derive all outputs.
pub fn run_forecast(client: &ForecastClient, scenario: &ScenarioInput) -> Result<RunOutput, AppError> {
    let snapshot = client.fetch_snapshot(scenario)?;
    Ok(derive_output(scenario.clone(), snapshot))
}

/// Derive the merged series and metrics from a pre-fetched snapshot.
///
/// This is the pure tail of the pipeline; the TUI folds snapshots through
/// `app::state` instead, which reuses the same metric functions.
pub fn derive_output(scenario: ScenarioInput, snapshot: MarketSnapshot) -> RunOutput {
    let series = merge_series(&snapshot.history, snapshot.forecast.as_ref());
    let indicators = compute_indicators(&series, &snapshot.kenya, &snapshot.india, &scenario);
    let alerts = classify_alerts(&scenario);
    RunOutput {
        scenario,
        snapshot,
        series,
        indicators,
        alerts,
    }
}

/// Recompute metrics for a series loaded from a CSV export (`bopf replay`).
///
/// Competitor feeds are reconstructed from the series' USD columns; the rows
/// carrying a competitor price double as that competitor's feed, which is
/// exactly the information the export preserved.
pub fn replay_output(scenario: ScenarioInput, series: Vec<MergedRow>) -> RunOutput {
    let kenya = competitor_feed(&series, |r| r.kenya_usd);
    let india = competitor_feed(&series, |r| r.india_usd);
    let indicators = compute_indicators(&series, &kenya, &india, &scenario);
    let alerts = classify_alerts(&scenario);
    RunOutput {
        scenario,
        snapshot: MarketSnapshot::default(),
        series,
        indicators,
        alerts,
    }
}

fn competitor_feed(series: &[MergedRow], pick: fn(&MergedRow) -> Option<f64>) -> Vec<CompetitorPoint> {
    series
        .iter()
        .filter_map(|r| {
            pick(r).map(|price_usd| CompetitorPoint {
                date: r.date,
                price_usd,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastPoint, HistoryPoint};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn derive_output_builds_series_and_metrics() {
        let snapshot = MarketSnapshot {
            history: (0..5)
                .map(|i| HistoryPoint {
                    date: d(1 + i),
                    price_lkr: 1000.0 + 50.0 * i as f64,
                    kenya_usd: None,
                    india_usd: None,
                })
                .collect(),
            forecast: Some(ForecastPoint {
                date: d(9),
                price_lkr: 1260.0,
                confidence: "medium".to_string(),
                lower: None,
                upper: None,
            }),
            kenya: vec![CompetitorPoint { date: d(5), price_usd: 3.0 }],
            india: Vec::new(),
        };

        let mut scenario = ScenarioInput::default();
        scenario.fx_lkr_per_usd_m = 300.0;
        let out = derive_output(scenario, snapshot);

        assert_eq!(out.series.len(), 6);
        assert!((out.indicators.trend_change_pct.unwrap() - 20.0).abs() < 1e-12);
        assert_eq!(out.indicators.spread_vs_kenya, Some(1200.0 - 900.0));
        assert!(!out.alerts.is_empty());
    }

    #[test]
    fn replay_reconstructs_competitor_feeds_from_series() {
        let history = vec![
            HistoryPoint {
                date: d(1),
                price_lkr: 1200.0,
                kenya_usd: Some(3.0),
                india_usd: None,
            },
            HistoryPoint {
                date: d(8),
                price_lkr: 1210.0,
                kenya_usd: Some(3.2),
                india_usd: Some(2.8),
            },
        ];
        let series = crate::series::merge_series(&history, None);

        let mut scenario = ScenarioInput::default();
        scenario.fx_lkr_per_usd_m = 300.0;
        let out = replay_output(scenario, series);

        // Latest kenya is 3.2, latest india is 2.8.
        assert_eq!(out.indicators.spread_vs_kenya, Some(1210.0 - 960.0));
        assert_eq!(out.indicators.spread_vs_india, Some(1210.0 - 840.0));
    }
}
