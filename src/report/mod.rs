//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the metric/state code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{Alert, AlertLevel, Indicators};

/// Format the run header: scenario, series span, and the forecast point.
pub fn format_summary(output: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== bopf - Mid-Country BOPF Tea Auction Dashboard ===\n");

    let s = &output.scenario;
    out.push_str(&format!(
        "Scenario: fx={:.0} LKR/USD | month={} | temp={:.1}C | humidity={:.1}% | rain={:.1}mm\n",
        s.fx_lkr_per_usd_m, s.month, s.temp_mean_c_w, s.humidity_mean_w, s.rain_mm_sum_w,
    ));

    match (output.series.first(), output.series.last()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!(
                "Series: n={} | {} .. {}\n",
                output.series.len(),
                first.date,
                last.date,
            ));
        }
        _ => out.push_str("Series: empty\n"),
    }

    match &output.snapshot.forecast {
        Some(f) => {
            out.push_str(&format!(
                "Forecast: {} ({}) for {}",
                currency(Some(f.price_lkr)),
                f.confidence,
                f.date,
            ));
            if f.lower.is_some() || f.upper.is_some() {
                out.push_str(&format!(
                    " | CI [{}, {}]",
                    currency(f.lower),
                    currency(f.upper),
                ));
            }
            out.push('\n');
        }
        None => out.push_str("Forecast: -\n"),
    }

    out
}

/// Format the indicator block.
pub fn format_indicators(indicators: &Indicators) -> String {
    let mut out = String::new();
    out.push_str("Indicators:\n");
    out.push_str(&format!("- Trend (4w):      {}\n", pct(indicators.trend_change_pct)));
    out.push_str(&format!(
        "- Volatility:      {} (std dev, last 4 actuals)\n",
        num(indicators.volatility),
    ));
    out.push_str(&format!(
        "- Spread vs Kenya: {}\n",
        currency(indicators.spread_vs_kenya),
    ));
    out.push_str(&format!(
        "- Spread vs India: {}\n",
        currency(indicators.spread_vs_india),
    ));
    out.push_str(&format!(
        "- Field pressure:  {}/100 ({})\n",
        indicators.field_pressure,
        pressure_tier(indicators.field_pressure),
    ));
    out
}

/// Format the alert list, one line per alert.
pub fn format_alerts(alerts: &[Alert]) -> String {
    let mut out = String::new();
    out.push_str("Alerts:\n");
    for alert in alerts {
        let marker = match alert.level {
            AlertLevel::Warning => '!',
            AlertLevel::AllClear => '-',
        };
        out.push_str(&format!("{marker} {}\n", alert.message));
    }
    out
}

/// One-paragraph market narrative, mirroring the dashboard's insights card.
pub fn format_insights(output: &RunOutput) -> String {
    let ind = &output.indicators;
    format!(
        "Over the last month, Sri Lanka auction prices changed {} and weekly \
         volatility is {} LKR/kg. The rupee currently trades at {:.0} per USD. \
         Supply pressure from field conditions is scored {}/100, suggesting {} \
         risk of short-term tightening. Competitive spreads vs Kenya ({}) and \
         India ({}) contextualize regional pricing.",
        pct(ind.trend_change_pct),
        num(ind.volatility),
        output.scenario.fx_lkr_per_usd_m,
        ind.field_pressure,
        pressure_tier(ind.field_pressure),
        currency(ind.spread_vs_kenya),
        currency(ind.spread_vs_india),
    )
}

/// LKR/kg amount or a placeholder.
pub fn currency(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2} LKR/kg"),
        None => "-".to_string(),
    }
}

/// Signed percent or a placeholder.
pub fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:+.1}%"),
        None => "-".to_string(),
    }
}

/// Plain number (2 decimals) or a placeholder.
pub fn num(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

/// USD/kg amount or a placeholder.
pub fn usd(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${v:.2} USD/kg"),
        None => "-".to_string(),
    }
}

fn pressure_tier(score: u8) -> &'static str {
    if score >= 66 {
        "elevated"
    } else if score >= 33 {
        "moderate"
    } else {
        "low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::derive_output;
    use crate::domain::{MarketSnapshot, ScenarioInput};

    #[test]
    fn placeholders_for_absent_values() {
        assert_eq!(currency(None), "-");
        assert_eq!(pct(None), "-");
        assert_eq!(num(None), "-");
        assert_eq!(usd(None), "-");
    }

    #[test]
    fn formats_carry_units_and_sign() {
        assert_eq!(currency(Some(1234.5)), "1234.50 LKR/kg");
        assert_eq!(pct(Some(2.04)), "+2.0%");
        assert_eq!(pct(Some(-3.5)), "-3.5%");
        assert_eq!(usd(Some(3.1)), "$3.10 USD/kg");
    }

    #[test]
    fn pressure_tiers() {
        assert_eq!(pressure_tier(10), "low");
        assert_eq!(pressure_tier(33), "moderate");
        assert_eq!(pressure_tier(66), "elevated");
    }

    #[test]
    fn empty_run_formats_without_panicking() {
        let output = derive_output(ScenarioInput::default(), MarketSnapshot::default());
        let summary = format_summary(&output);
        assert!(summary.contains("Series: empty"));
        assert!(summary.contains("Forecast: -"));

        let indicators = format_indicators(&output.indicators);
        assert!(indicators.contains("Trend (4w):      -"));

        let alerts = format_alerts(&output.alerts);
        assert!(alerts.contains("No critical field alerts"));
    }
}
