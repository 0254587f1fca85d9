//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while deriving metrics
//! - exported to CSV
//! - reloaded later for offline replay

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One weekly auction observation for the domestic (Sri Lanka) benchmark.
///
/// Competitor reference prices ride along when the source publishes them for
/// the same auction week; they are frequently missing.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    /// Mid-country BOPF auction price, LKR/kg.
    pub price_lkr: f64,
    /// Mombasa BOPF reference, USD/kg.
    pub kenya_usd: Option<f64>,
    /// North-India BOPF reference, USD/kg.
    pub india_usd: Option<f64>,
}

/// A normalized competitor reference observation (USD/kg).
///
/// Competitor feeds arrive in more than one wire shape; they are normalized
/// into this single schema at the client boundary (`data::forecast`).
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorPoint {
    pub date: NaiveDate,
    pub price_usd: f64,
}

/// The model's point forecast for the next auction week.
///
/// At most one per response; replaced wholesale on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Predicted price, LKR/kg.
    pub price_lkr: f64,
    /// Qualitative confidence label as produced by the model service.
    pub confidence: String,
    /// Optional confidence-interval bounds, LKR/kg.
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Everything one successful forecast request yields, already normalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarketSnapshot {
    pub history: Vec<HistoryPoint>,
    pub forecast: Option<ForecastPoint>,
    pub kenya: Vec<CompetitorPoint>,
    pub india: Vec<CompetitorPoint>,
}

/// One row of the merged chart/export series.
///
/// Invariant: rows coming from history carry `actual` (plus optional
/// competitor USD prices); the single trailing forecast row (if any) carries
/// `predicted`/`lower`/`upper` and nothing else. See `series::merge_series`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub kenya_usd: Option<f64>,
    pub india_usd: Option<f64>,
}

impl MergedRow {
    /// An empty row at a given date (all value columns absent).
    pub fn at(date: NaiveDate) -> Self {
        Self {
            date,
            actual: None,
            predicted: None,
            lower: None,
            upper: None,
            kenya_usd: None,
            india_usd: None,
        }
    }
}

/// Derived market indicators.
///
/// Recomputed as a whole whenever the merged series or the scenario changes;
/// individual fields are never patched in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Indicators {
    /// Percent change of the latest actual vs four auctions earlier.
    pub trend_change_pct: Option<f64>,
    /// Population std dev of the 4 actuals preceding the latest one, LKR/kg.
    pub volatility: Option<f64>,
    /// Latest domestic actual minus FX-converted latest Kenya price, LKR/kg.
    pub spread_vs_kenya: Option<f64>,
    /// Latest domestic actual minus FX-converted latest India price, LKR/kg.
    pub spread_vs_india: Option<f64>,
    /// Composite weather pressure score, 0..=100.
    pub field_pressure: u8,
}

/// Qualitative severity of a field alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Warning,
    AllClear,
}

/// A derived field/market alert. Not persisted; recomputed from the scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Warning,
            message: message.into(),
        }
    }

    pub fn all_clear(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::AllClear,
            message: message.into(),
        }
    }
}
