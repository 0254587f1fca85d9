//! Explicit application state and its reduce cycle.
//!
//! All session state lives in one `DashboardState` value: the scenario store,
//! the last successful snapshot (series + competitor feeds + forecast), and
//! the derived indicators/alerts. Derived fields are recomputed wholesale
//! after every change; nothing downstream of the scenario is mutated
//! independently.
//!
//! Request ordering: each forecast request is tagged with a monotonically
//! increasing ticket at issue time. Only the most recently issued ticket may
//! update state; any other response is discarded when it resolves, regardless
//! of arrival order. Last-issued wins, not last-arrived.

use chrono::{DateTime, Local};

use crate::domain::{
    Alert, CompetitorPoint, ForecastPoint, Indicators, MarketSnapshot, MergedRow, ScenarioField,
    ScenarioStore,
};
use crate::error::AppError;
use crate::metrics::{classify_alerts, compute_indicators};
use crate::series::merge_series;

/// Tags one issued forecast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// What happened when a response was folded into the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// The response replaced the displayed snapshot.
    Applied,
    /// A newer request had been issued; the response was discarded.
    Superseded,
    /// The request failed; prior state stays visible, error surfaced.
    Failed,
}

pub struct DashboardState {
    pub store: ScenarioStore,
    pub forecast: Option<ForecastPoint>,
    pub series: Vec<MergedRow>,
    pub kenya_history: Vec<CompetitorPoint>,
    pub india_history: Vec<CompetitorPoint>,
    pub indicators: Indicators,
    pub alerts: Vec<Alert>,
    /// Last forecast-request failure, shown until the next success.
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
    issued: u64,
    outstanding: u64,
}

impl DashboardState {
    pub fn new(store: ScenarioStore) -> Self {
        let mut state = Self {
            store,
            forecast: None,
            series: Vec::new(),
            kenya_history: Vec::new(),
            india_history: Vec::new(),
            indicators: Indicators::default(),
            alerts: Vec::new(),
            last_error: None,
            last_updated: None,
            issued: 0,
            outstanding: 0,
        };
        state.recompute();
        state
    }

    /// Issue a new request ticket. The previously issued ticket (if still in
    /// flight) is superseded from this moment on.
    pub fn issue_request(&mut self) -> RequestTicket {
        self.issued += 1;
        self.outstanding += 1;
        RequestTicket(self.issued)
    }

    /// True while any issued request has not resolved yet.
    pub fn is_loading(&self) -> bool {
        self.outstanding > 0
    }

    /// Fold a resolved request into the state.
    pub fn apply_snapshot(
        &mut self,
        ticket: RequestTicket,
        result: Result<MarketSnapshot, AppError>,
    ) -> SnapshotOutcome {
        self.outstanding = self.outstanding.saturating_sub(1);

        if ticket.0 != self.issued {
            return SnapshotOutcome::Superseded;
        }

        match result {
            Ok(snapshot) => {
                self.forecast = snapshot.forecast;
                self.series = merge_series(&snapshot.history, self.forecast.as_ref());
                self.kenya_history = snapshot.kenya;
                self.india_history = snapshot.india;
                self.last_error = None;
                self.last_updated = Some(Local::now());
                self.recompute();
                SnapshotOutcome::Applied
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                SnapshotOutcome::Failed
            }
        }
    }

    /// Validated scenario edit plus recompute of everything derived from it.
    pub fn edit_field(&mut self, field: ScenarioField, value: f64) -> Result<(), AppError> {
        self.store.set_field(field, value)?;
        self.recompute();
        Ok(())
    }

    /// One-time startup FX refresh path (rate rounded before storing).
    pub fn apply_fx_rate(&mut self, rate: f64) -> Result<(), AppError> {
        self.store.set_fx(rate)?;
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        let scenario = self.store.get();
        self.indicators = compute_indicators(
            &self.series,
            &self.kenya_history,
            &self.india_history,
            scenario,
        );
        self.alerts = classify_alerts(scenario);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HistoryPoint, ScenarioInput};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn snapshot_with_price(price: f64) -> MarketSnapshot {
        MarketSnapshot {
            history: vec![HistoryPoint {
                date: d(2),
                price_lkr: price,
                kenya_usd: None,
                india_usd: None,
            }],
            ..MarketSnapshot::default()
        }
    }

    #[test]
    fn late_response_for_superseded_request_is_discarded() {
        let mut state = DashboardState::new(ScenarioStore::default());
        let ticket_a = state.issue_request();
        let ticket_b = state.issue_request();

        // B resolves first and wins.
        let outcome = state.apply_snapshot(ticket_b, Ok(snapshot_with_price(2000.0)));
        assert_eq!(outcome, SnapshotOutcome::Applied);

        // A resolves later; it must not clobber B.
        let outcome = state.apply_snapshot(ticket_a, Ok(snapshot_with_price(1000.0)));
        assert_eq!(outcome, SnapshotOutcome::Superseded);
        assert_eq!(state.series[0].actual, Some(2000.0));
        assert!(!state.is_loading());
    }

    #[test]
    fn early_response_for_superseded_request_is_discarded_too() {
        let mut state = DashboardState::new(ScenarioStore::default());
        let ticket_a = state.issue_request();
        let ticket_b = state.issue_request();

        // A arrives before B resolves; B was issued later, so A is stale.
        let outcome = state.apply_snapshot(ticket_a, Ok(snapshot_with_price(1000.0)));
        assert_eq!(outcome, SnapshotOutcome::Superseded);
        assert!(state.series.is_empty());
        assert!(state.is_loading());

        let outcome = state.apply_snapshot(ticket_b, Ok(snapshot_with_price(2000.0)));
        assert_eq!(outcome, SnapshotOutcome::Applied);
        assert_eq!(state.series[0].actual, Some(2000.0));
    }

    #[test]
    fn failure_keeps_last_known_good_state() {
        let mut state = DashboardState::new(ScenarioStore::default());
        let ticket = state.issue_request();
        state.apply_snapshot(ticket, Ok(snapshot_with_price(1500.0)));
        assert!(state.last_error.is_none());

        let ticket = state.issue_request();
        let outcome = state.apply_snapshot(ticket, Err(AppError::new(4, "connection refused")));
        assert_eq!(outcome, SnapshotOutcome::Failed);
        assert_eq!(state.series[0].actual, Some(1500.0), "stale-but-valid data stays");
        assert_eq!(state.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn success_clears_a_previous_error() {
        let mut state = DashboardState::new(ScenarioStore::default());
        let ticket = state.issue_request();
        state.apply_snapshot(ticket, Err(AppError::new(4, "boom")));
        assert!(state.last_error.is_some());

        let ticket = state.issue_request();
        state.apply_snapshot(ticket, Ok(snapshot_with_price(1500.0)));
        assert!(state.last_error.is_none());
    }

    #[test]
    fn alerts_follow_scenario_edits() {
        let mut state = DashboardState::new(ScenarioStore::new(ScenarioInput {
            temp_mean_c_w: 20.0,
            humidity_mean_w: 90.0,
            rain_mm_sum_w: 10.0,
            ..ScenarioInput::default()
        }));
        assert_eq!(state.alerts.len(), 1, "benign scenario starts with the sentinel");

        state.edit_field(ScenarioField::Temp, 28.0).unwrap();
        assert!(state.alerts.iter().any(|a| a.message.contains("temperature")));
    }

    #[test]
    fn spreads_follow_fx_edits() {
        let mut state = DashboardState::new(ScenarioStore::default());
        let ticket = state.issue_request();
        let snapshot = MarketSnapshot {
            kenya: vec![CompetitorPoint { date: d(2), price_usd: 3.0 }],
            ..snapshot_with_price(1200.0)
        };
        state.apply_snapshot(ticket, Ok(snapshot));

        state.edit_field(ScenarioField::Fx, 300.0).unwrap();
        assert_eq!(state.indicators.spread_vs_kenya, Some(1200.0 - 900.0));

        state.edit_field(ScenarioField::Fx, 400.0).unwrap();
        assert_eq!(state.indicators.spread_vs_kenya, Some(1200.0 - 1200.0));
    }

    #[test]
    fn rejected_edit_leaves_derived_state_alone() {
        let mut state = DashboardState::new(ScenarioStore::default());
        let before = state.indicators.clone();
        assert!(state.edit_field(ScenarioField::Temp, f64::NAN).is_err());
        assert_eq!(state.indicators, before);
    }
}
