//! Indicator engine: trend, volatility, competitor spreads, field pressure.
//!
//! All indicators are pure functions of the merged series, the competitor
//! feeds, and the current scenario. They are recomputed as a whole whenever
//! any of those inputs change; `Indicators` is never mutated field by field.

use crate::domain::{CompetitorPoint, Indicators, MergedRow, ScenarioInput};
use crate::series::{actual_values, last_actual};

/// How many auctions back the trend comparison looks.
const TREND_LOOKBACK: usize = 4;

/// Window size for the volatility estimate.
const VOLATILITY_WINDOW: usize = 4;

/// Compute the full indicator set for the current state.
pub fn compute_indicators(
    rows: &[MergedRow],
    kenya: &[CompetitorPoint],
    india: &[CompetitorPoint],
    scenario: &ScenarioInput,
) -> Indicators {
    let last = last_actual(rows);
    let fx = scenario.fx_lkr_per_usd_m;
    Indicators {
        trend_change_pct: trend_change_pct(rows),
        volatility: volatility_std(rows),
        spread_vs_kenya: competitor_spread(last, kenya, fx),
        spread_vs_india: competitor_spread(last, india, fx),
        field_pressure: field_pressure_score(scenario.temp_mean_c_w, scenario.humidity_mean_w),
    }
}

/// Percent change of the latest actual vs the actual four auctions earlier.
///
/// Operates on the actual-only subsequence, so a trailing forecast row (which
/// carries no actual) does not shift the comparison. Fewer than
/// `TREND_LOOKBACK + 1` actuals, or a zero prior, give `None`.
pub fn trend_change_pct(rows: &[MergedRow]) -> Option<f64> {
    let actuals = actual_values(rows);
    if actuals.len() < TREND_LOOKBACK + 1 {
        return None;
    }
    let last = actuals[actuals.len() - 1];
    let prior = actuals[actuals.len() - 1 - TREND_LOOKBACK];
    let pct = (last - prior) / prior * 100.0;
    pct.is_finite().then_some(pct)
}

/// Population standard deviation of the actuals immediately preceding the
/// latest one (the latest itself excluded), up to `VOLATILITY_WINDOW` samples.
///
/// Needs at least 2 samples in the window, else `None`.
pub fn volatility_std(rows: &[MergedRow]) -> Option<f64> {
    let actuals = actual_values(rows);
    if actuals.is_empty() {
        return None;
    }
    let preceding = &actuals[..actuals.len() - 1];
    let window = &preceding[preceding.len().saturating_sub(VOLATILITY_WINDOW)..];
    if window.len() < 2 {
        return None;
    }

    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Spread of the latest domestic actual over the latest competitor price,
/// converted USD→LKR with the current scenario FX rate.
///
/// The competitor feed is not required to be date-aligned with the domestic
/// series: we take its most recent point as-is. Valuing it with the current
/// FX rate trades conversion staleness for an always-available spread
/// whenever any competitor datum exists.
pub fn competitor_spread(
    last_domestic: Option<f64>,
    competitor: &[CompetitorPoint],
    fx_lkr_per_usd: f64,
) -> Option<f64> {
    let domestic = last_domestic?;
    let usd = competitor.last().map(|p| p.price_usd)?;
    Some(domestic - usd * fx_lkr_per_usd)
}

/// Composite field-pressure score from weekly weather telemetry.
///
/// Temperature is normalized over 18-28 °C, humidity over 65-85 % (drier is
/// riskier). Weighted 60/40 and scaled to an integer in 0..=100; higher means
/// tighter short-term supply risk.
pub fn field_pressure_score(temp_c: f64, humidity_pct: f64) -> u8 {
    let norm_t = ((temp_c - 18.0) / 10.0).clamp(0.0, 1.0);
    let norm_h = ((85.0 - humidity_pct) / 20.0).clamp(0.0, 1.0);
    ((0.6 * norm_t + 0.4 * norm_h) * 100.0).round() as u8
}
