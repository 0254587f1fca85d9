//! USD→LKR exchange-rate feed.
//!
//! The FX refresh is best-effort by design: any failure leaves the stored
//! scenario rate untouched and is never surfaced to the user. Callers decide
//! whether to log the error into a status line or drop it.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::AppError;

const DEFAULT_URL: &str = "https://api.exchangerate.host/latest?base=USD&symbols=LKR";

#[derive(Clone)]
pub struct FxClient {
    client: Client,
    url: String,
}

impl FxClient {
    /// Build a client from the environment (`BOPF_FX_URL` in `.env` or the
    /// process environment), falling back to the public rates endpoint.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let url = std::env::var("BOPF_FX_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self {
            client: Client::new(),
            url,
        }
    }

    /// Fetch the current USD→LKR rate.
    pub fn fetch_usd_lkr(&self) -> Result<f64, AppError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::new(4, format!("FX request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("FX request failed with status {}.", resp.status()),
            ));
        }

        let body: RatesResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse FX response: {e}")))?;

        let rate = body
            .rates
            .lkr
            .ok_or_else(|| AppError::new(4, "FX response has no LKR rate."))?;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(AppError::new(4, "FX response has an invalid LKR rate."));
        }
        Ok(rate)
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: Rates,
}

#[derive(Debug, Deserialize)]
struct Rates {
    #[serde(rename = "LKR")]
    lkr: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_body_parses() {
        let body: RatesResponse =
            serde_json::from_str(r#"{"base":"USD","rates":{"LKR":301.7}}"#).unwrap();
        assert_eq!(body.rates.lkr, Some(301.7));
    }

    #[test]
    fn missing_lkr_parses_to_none() {
        let body: RatesResponse = serde_json::from_str(r#"{"rates":{}}"#).unwrap();
        assert_eq!(body.rates.lkr, None);
    }
}
