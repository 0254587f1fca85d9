//! Forecast model service client.
//!
//! The service is an external collaborator: it takes the full scenario as a
//! JSON body and returns auction history, an optional point forecast, and the
//! competitor reference histories. All wire irregularities are resolved here,
//! so the rest of the crate only ever sees the normalized `MarketSnapshot`
//! schema.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{CompetitorPoint, ForecastPoint, HistoryPoint, MarketSnapshot, ScenarioInput};
use crate::error::AppError;

const DEFAULT_URL: &str = "http://127.0.0.1:5000/forecast";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct ForecastClient {
    client: Client,
    url: String,
}

impl ForecastClient {
    /// Build a client from the environment (`BOPF_FORECAST_URL` in `.env` or
    /// the process environment), falling back to the local development URL.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let url = std::env::var("BOPF_FORECAST_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::with_url(url)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Submit a scenario and return the normalized snapshot.
    ///
    /// Fails on network errors, non-success status, and malformed bodies. The
    /// caller decides what "fail" means for displayed state; a failed request
    /// never replaces previously fetched data.
    pub fn fetch_snapshot(&self, scenario: &ScenarioInput) -> Result<MarketSnapshot, AppError> {
        let resp = self
            .client
            .post(&self.url)
            .json(scenario)
            .send()
            .map_err(|e| AppError::new(4, format!("Forecast request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Forecast request failed with status {}.", resp.status()),
            ));
        }

        let body: WireResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse forecast response: {e}")))?;

        normalize_response(body)
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    history: Vec<WireHistoryPoint>,
    #[serde(default)]
    forecast: Option<WireForecastPoint>,
    #[serde(default)]
    kenya_history: Vec<WireCompetitorPoint>,
    #[serde(default)]
    india_history: Vec<WireCompetitorPoint>,
}

#[derive(Debug, Deserialize)]
struct WireHistoryPoint {
    auction_date_start: String,
    bopf_price_lkr_per_kg: f64,
    #[serde(default)]
    kenya_bopf_price_usd_w: Option<f64>,
    #[serde(default)]
    india_bopf_price_usd_w: Option<f64>,
}

/// Competitor feeds are not consistent about their value column: depending on
/// the upstream pipeline a row carries the full series name or a bare `price`.
/// Normalization happens here instead of deep inside the metric code.
#[derive(Debug, Deserialize)]
struct WireCompetitorPoint {
    auction_date_start: String,
    #[serde(default)]
    kenya_bopf_price_usd_w: Option<f64>,
    #[serde(default)]
    india_bopf_price_usd_w: Option<f64>,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireForecastPoint {
    auction_date_start: String,
    forecast_price_lkr: f64,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    ci_lower: Option<f64>,
    #[serde(default)]
    ci_upper: Option<f64>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| AppError::new(4, format!("Invalid auction date '{raw}': {e}")))
}

fn normalize_response(wire: WireResponse) -> Result<MarketSnapshot, AppError> {
    let mut history = Vec::with_capacity(wire.history.len());
    for h in wire.history {
        history.push(HistoryPoint {
            date: parse_date(&h.auction_date_start)?,
            price_lkr: h.bopf_price_lkr_per_kg,
            kenya_usd: h.kenya_bopf_price_usd_w,
            india_usd: h.india_bopf_price_usd_w,
        });
    }

    let forecast = match wire.forecast {
        Some(f) => Some(ForecastPoint {
            date: parse_date(&f.auction_date_start)?,
            price_lkr: f.forecast_price_lkr,
            confidence: f.confidence.unwrap_or_else(|| "n/a".to_string()),
            lower: f.ci_lower,
            upper: f.ci_upper,
        }),
        None => None,
    };

    let kenya = normalize_competitor(wire.kenya_history, |p| p.kenya_bopf_price_usd_w)?;
    let india = normalize_competitor(wire.india_history, |p| p.india_bopf_price_usd_w)?;

    Ok(MarketSnapshot {
        history,
        forecast,
        kenya,
        india,
    })
}

fn normalize_competitor(
    rows: Vec<WireCompetitorPoint>,
    named: fn(&WireCompetitorPoint) -> Option<f64>,
) -> Result<Vec<CompetitorPoint>, AppError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        // Prefer the named series column, fall back to bare `price`. Rows
        // with neither carry no information and are skipped.
        let Some(price_usd) = named(&row).or(row.price) else {
            continue;
        };
        out.push(CompetitorPoint {
            date: parse_date(&row.auction_date_start)?,
            price_usd,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse_wire(json: serde_json::Value) -> Result<MarketSnapshot, AppError> {
        let wire: WireResponse = serde_json::from_value(json).unwrap();
        normalize_response(wire)
    }

    #[test]
    fn full_response_normalizes() {
        let snapshot = parse_wire(serde_json::json!({
            "history": [
                {
                    "auction_date_start": "2025-06-02",
                    "bopf_price_lkr_per_kg": 1210.0,
                    "kenya_bopf_price_usd_w": 3.1
                }
            ],
            "forecast": {
                "auction_date_start": "2025-06-09",
                "forecast_price_lkr": 1235.5,
                "confidence": "medium",
                "ci_lower": 1200.0,
                "ci_upper": 1270.0
            },
            "kenya_history": [
                { "auction_date_start": "2025-06-02", "kenya_bopf_price_usd_w": 3.1 }
            ],
            "india_history": [
                { "auction_date_start": "2025-06-02", "india_bopf_price_usd_w": 2.8 }
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].price_lkr, 1210.0);
        assert_eq!(snapshot.history[0].kenya_usd, Some(3.1));
        assert_eq!(snapshot.history[0].india_usd, None);

        let forecast = snapshot.forecast.unwrap();
        assert_eq!(forecast.date, NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        assert_eq!(forecast.price_lkr, 1235.5);
        assert_eq!(forecast.confidence, "medium");
        assert_eq!(forecast.lower, Some(1200.0));

        assert_eq!(snapshot.kenya[0].price_usd, 3.1);
        assert_eq!(snapshot.india[0].price_usd, 2.8);
    }

    #[test]
    fn competitor_rows_fall_back_to_bare_price() {
        let snapshot = parse_wire(serde_json::json!({
            "kenya_history": [
                { "auction_date_start": "2025-06-02", "price": 3.05 },
                { "auction_date_start": "2025-06-09", "kenya_bopf_price_usd_w": 3.15, "price": 9.99 }
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.kenya.len(), 2);
        assert_eq!(snapshot.kenya[0].price_usd, 3.05);
        // The named column wins over the generic one.
        assert_eq!(snapshot.kenya[1].price_usd, 3.15);
    }

    #[test]
    fn competitor_rows_without_price_are_skipped() {
        let snapshot = parse_wire(serde_json::json!({
            "india_history": [
                { "auction_date_start": "2025-06-02" },
                { "auction_date_start": "2025-06-09", "india_bopf_price_usd_w": 2.75 }
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.india.len(), 1);
        assert_eq!(snapshot.india[0].price_usd, 2.75);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot = parse_wire(serde_json::json!({})).unwrap();
        assert!(snapshot.history.is_empty());
        assert!(snapshot.forecast.is_none());
        assert!(snapshot.kenya.is_empty());
        assert!(snapshot.india.is_empty());
    }

    #[test]
    fn bad_date_is_a_malformed_response() {
        let result = parse_wire(serde_json::json!({
            "history": [
                { "auction_date_start": "June 2nd", "bopf_price_lkr_per_kg": 1210.0 }
            ]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_confidence_defaults() {
        let snapshot = parse_wire(serde_json::json!({
            "forecast": { "auction_date_start": "2025-06-09", "forecast_price_lkr": 1235.5 }
        }))
        .unwrap();
        assert_eq!(snapshot.forecast.unwrap().confidence, "n/a");
    }
}
