//! Shared domain types: auction series, scenario inputs, derived metrics.

pub mod scenario;
pub mod types;

pub use scenario::{ScenarioField, ScenarioInput, ScenarioPatch, ScenarioStore};
pub use types::{
    Alert, AlertLevel, CompetitorPoint, ForecastPoint, HistoryPoint, Indicators, MarketSnapshot,
    MergedRow,
};
