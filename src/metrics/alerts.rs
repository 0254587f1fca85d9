//! Alert classifier: fixed-threshold weather alerts from the scenario.
//!
//! A pure function of the scenario; conditions are evaluated in a fixed
//! priority order and each fires independently. The returned list is never
//! empty: when nothing triggers, a single all-clear sentinel is emitted.

use crate::domain::{Alert, ScenarioInput};

/// Weekly mean temperature at or above this tightens supply 1-2 weeks out.
const TEMP_WARN_C: f64 = 27.0;

/// Weekly mean humidity at or below this indicates dry stress.
const HUMIDITY_WARN_PCT: f64 = 70.0;

/// Weekly rainfall at or above this elevates logistics/quality risk.
const RAIN_WARN_MM: f64 = 120.0;

/// Sentinel message emitted when no threshold triggers.
pub const NO_ALERTS_MESSAGE: &str = "No critical field alerts this week.";

/// Classify the scenario's weather telemetry into alert messages.
pub fn classify_alerts(scenario: &ScenarioInput) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if scenario.temp_mean_c_w >= TEMP_WARN_C {
        alerts.push(Alert::warning(
            "High field temperature may tighten supply in 1-2 weeks.",
        ));
    }
    if scenario.humidity_mean_w <= HUMIDITY_WARN_PCT {
        alerts.push(Alert::warning(
            "Low humidity suggests dry-stress risk next week.",
        ));
    }
    if scenario.rain_mm_sum_w >= RAIN_WARN_MM {
        alerts.push(Alert::warning(
            "Heavy rainfall may elevate logistics risk and quality variability.",
        ));
    }

    if alerts.is_empty() {
        alerts.push(Alert::all_clear(NO_ALERTS_MESSAGE));
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertLevel;

    fn scenario(temp: f64, humidity: f64, rain: f64) -> ScenarioInput {
        ScenarioInput {
            temp_mean_c_w: temp,
            humidity_mean_w: humidity,
            rain_mm_sum_w: rain,
            ..ScenarioInput::default()
        }
    }

    #[test]
    fn temperature_at_threshold_fires_exactly_one_alert() {
        let alerts = classify_alerts(&scenario(27.0, 82.0, 60.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert!(alerts[0].message.contains("temperature"), "{}", alerts[0].message);
    }

    #[test]
    fn benign_scenario_gives_only_the_sentinel() {
        let alerts = classify_alerts(&scenario(20.0, 90.0, 10.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::AllClear);
        assert_eq!(alerts[0].message, NO_ALERTS_MESSAGE);
    }

    #[test]
    fn all_three_conditions_fire_independently_in_order() {
        let alerts = classify_alerts(&scenario(28.0, 65.0, 150.0));
        assert_eq!(alerts.len(), 3);
        assert!(alerts[0].message.contains("temperature"));
        assert!(alerts[1].message.contains("humidity"));
        assert!(alerts[2].message.contains("rainfall"));
        assert!(alerts.iter().all(|a| a.level == AlertLevel::Warning));
    }

    #[test]
    fn list_is_never_empty() {
        for (t, h, r) in [(0.0, 100.0, 0.0), (27.0, 70.0, 120.0), (-5.0, 50.0, 300.0)] {
            assert!(!classify_alerts(&scenario(t, h, r)).is_empty());
        }
    }
}
