//! Scenario inputs and the scenario store.
//!
//! The scenario is the full driver set submitted to the forecast service. It
//! is the only user-mutable state in the application; everything else (merged
//! series, indicators, alerts) is derived from it plus the latest response.
//!
//! Edits are validated at the field level: a non-finite number is rejected
//! before it can reach the stored state, so downstream metric code can treat
//! every scenario field as a finite value.

use chrono::Datelike;
use serde::Serialize;

use crate::error::AppError;

/// The forecast request body. Field names are the wire names expected by the
/// model service, so this serializes 1:1 into the POST payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioInput {
    /// USD→LKR exchange rate, monthly.
    pub fx_lkr_per_usd_m: f64,
    /// Mombasa BOPF spot, USD/kg, weekly.
    pub kenya_bopf_price_usd_w: f64,
    /// North-India BOPF spot, USD/kg, weekly.
    pub india_bopf_price_usd_w: f64,
    /// FOB weighted-average export price, Rs/kg, monthly.
    pub fob_rs_per_kg_wavg_m: f64,
    /// Rainfall sum over the week, mm.
    pub rain_mm_sum_w: f64,
    /// Mean field temperature over the week, °C.
    pub temp_mean_c_w: f64,
    /// Mean relative humidity over the week, %.
    pub humidity_mean_w: f64,
    /// Calendar month, 1..=12.
    pub month: u32,
    pub bopf_price_lkr_per_kg_lag1: f64,
    pub bopf_price_lkr_per_kg_lag4: f64,
    pub bopf_price_lkr_per_kg_lag8: f64,
    pub fx_lkr_per_usd_m_lag1: f64,
    pub kenya_bopf_price_usd_w_lag1: f64,
    pub india_bopf_price_usd_w_lag1: f64,
    /// Rainfall sum over the trailing 4 weeks, mm.
    pub rain_4w_sum: f64,
    /// 4-week moving average of the domestic price, LKR/kg.
    pub price_ma4w: f64,
}

impl Default for ScenarioInput {
    fn default() -> Self {
        Self {
            fx_lkr_per_usd_m: 300.0,
            kenya_bopf_price_usd_w: 3.1,
            india_bopf_price_usd_w: 2.8,
            fob_rs_per_kg_wavg_m: 1250.0,
            rain_mm_sum_w: 60.0,
            temp_mean_c_w: 22.0,
            humidity_mean_w: 82.0,
            month: chrono::Local::now().month(),
            bopf_price_lkr_per_kg_lag1: 1220.0,
            bopf_price_lkr_per_kg_lag4: 1190.0,
            bopf_price_lkr_per_kg_lag8: 1180.0,
            fx_lkr_per_usd_m_lag1: 298.0,
            kenya_bopf_price_usd_w_lag1: 3.0,
            india_bopf_price_usd_w_lag1: 2.7,
            rain_4w_sum: 240.0,
            price_ma4w: 1210.0,
        }
    }
}

/// User-editable scenario fields.
///
/// Drives both the CLI override flags and the TUI editor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioField {
    Fx,
    KenyaUsd,
    IndiaUsd,
    FobAvg,
    Rain,
    Temp,
    Humidity,
    Month,
    PriceLag1,
    PriceLag4,
    PriceLag8,
    FxLag1,
    KenyaUsdLag1,
    IndiaUsdLag1,
    Rain4w,
    PriceMa4w,
}

impl ScenarioField {
    pub const ALL: [ScenarioField; 16] = [
        ScenarioField::Fx,
        ScenarioField::KenyaUsd,
        ScenarioField::IndiaUsd,
        ScenarioField::FobAvg,
        ScenarioField::Rain,
        ScenarioField::Temp,
        ScenarioField::Humidity,
        ScenarioField::Month,
        ScenarioField::PriceLag1,
        ScenarioField::PriceLag4,
        ScenarioField::PriceLag8,
        ScenarioField::FxLag1,
        ScenarioField::KenyaUsdLag1,
        ScenarioField::IndiaUsdLag1,
        ScenarioField::Rain4w,
        ScenarioField::PriceMa4w,
    ];

    /// Human-readable label with unit, for the editor and reports.
    pub fn label(self) -> &'static str {
        match self {
            ScenarioField::Fx => "FX (LKR/USD)",
            ScenarioField::KenyaUsd => "Kenya (USD/kg)",
            ScenarioField::IndiaUsd => "India (USD/kg)",
            ScenarioField::FobAvg => "FOB avg (Rs/kg)",
            ScenarioField::Rain => "Rain, week (mm)",
            ScenarioField::Temp => "Temperature (°C)",
            ScenarioField::Humidity => "Humidity (%)",
            ScenarioField::Month => "Month (1-12)",
            ScenarioField::PriceLag1 => "Price lag 1w (LKR/kg)",
            ScenarioField::PriceLag4 => "Price lag 4w (LKR/kg)",
            ScenarioField::PriceLag8 => "Price lag 8w (LKR/kg)",
            ScenarioField::FxLag1 => "FX lag 1m (LKR/USD)",
            ScenarioField::KenyaUsdLag1 => "Kenya lag 1w (USD/kg)",
            ScenarioField::IndiaUsdLag1 => "India lag 1w (USD/kg)",
            ScenarioField::Rain4w => "Rain, 4w sum (mm)",
            ScenarioField::PriceMa4w => "Price MA 4w (LKR/kg)",
        }
    }

    /// Read the field's current value (month widened to f64).
    pub fn get(self, scenario: &ScenarioInput) -> f64 {
        match self {
            ScenarioField::Fx => scenario.fx_lkr_per_usd_m,
            ScenarioField::KenyaUsd => scenario.kenya_bopf_price_usd_w,
            ScenarioField::IndiaUsd => scenario.india_bopf_price_usd_w,
            ScenarioField::FobAvg => scenario.fob_rs_per_kg_wavg_m,
            ScenarioField::Rain => scenario.rain_mm_sum_w,
            ScenarioField::Temp => scenario.temp_mean_c_w,
            ScenarioField::Humidity => scenario.humidity_mean_w,
            ScenarioField::Month => scenario.month as f64,
            ScenarioField::PriceLag1 => scenario.bopf_price_lkr_per_kg_lag1,
            ScenarioField::PriceLag4 => scenario.bopf_price_lkr_per_kg_lag4,
            ScenarioField::PriceLag8 => scenario.bopf_price_lkr_per_kg_lag8,
            ScenarioField::FxLag1 => scenario.fx_lkr_per_usd_m_lag1,
            ScenarioField::KenyaUsdLag1 => scenario.kenya_bopf_price_usd_w_lag1,
            ScenarioField::IndiaUsdLag1 => scenario.india_bopf_price_usd_w_lag1,
            ScenarioField::Rain4w => scenario.rain_4w_sum,
            ScenarioField::PriceMa4w => scenario.price_ma4w,
        }
    }
}

/// A partial scenario update: the fields to change and nothing else.
///
/// Used both for CLI overrides and for transient what-if views. Later edits to
/// the same field replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ScenarioPatch {
    edits: Vec<(ScenarioField, f64)>,
}

impl ScenarioPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: ScenarioField, value: f64) {
        if let Some(slot) = self.edits.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = value;
        } else {
            self.edits.push((field, value));
        }
    }

    pub fn get(&self, field: ScenarioField) -> Option<f64> {
        self.edits.iter().find(|(f, _)| *f == field).map(|(_, v)| *v)
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScenarioField, f64)> + '_ {
        self.edits.iter().copied()
    }
}

/// Holds the baseline scenario for the session.
///
/// There is a single logical writer: edits come from the UI (or CLI flags) one
/// at a time, plus the one-time startup FX refresh.
#[derive(Debug, Clone, Default)]
pub struct ScenarioStore {
    current: ScenarioInput,
}

impl ScenarioStore {
    pub fn new(initial: ScenarioInput) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> &ScenarioInput {
        &self.current
    }

    /// Apply a validated partial update over the stored scenario.
    ///
    /// Fields not present in the patch are left unchanged. The first invalid
    /// edit aborts the apply; earlier edits from the same patch stick, which
    /// matches per-field edits arriving one at a time.
    pub fn apply(&mut self, patch: &ScenarioPatch) -> Result<(), AppError> {
        for (field, value) in patch.iter() {
            self.set_field(field, value)?;
        }
        Ok(())
    }

    /// Validate and store a single field edit.
    pub fn set_field(&mut self, field: ScenarioField, value: f64) -> Result<(), AppError> {
        set_field(&mut self.current, field, value)
    }

    /// A transient merged view for what-if runs. The stored baseline is not
    /// touched, so the live chart keeps reflecting committed inputs.
    pub fn with_override(&self, patch: &ScenarioPatch) -> Result<ScenarioInput, AppError> {
        let mut view = self.current.clone();
        for (field, value) in patch.iter() {
            set_field(&mut view, field, value)?;
        }
        Ok(view)
    }

    /// FX refresh path: the remote rate is rounded to whole rupees before it
    /// replaces the stored value.
    pub fn set_fx(&mut self, rate: f64) -> Result<(), AppError> {
        self.set_field(ScenarioField::Fx, rate.round())
    }
}

fn set_field(scenario: &mut ScenarioInput, field: ScenarioField, value: f64) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::new(
            2,
            format!("Invalid value for {}: must be a finite number.", field.label()),
        ));
    }

    if field == ScenarioField::Month {
        if value.fract() != 0.0 || !(1.0..=12.0).contains(&value) {
            return Err(AppError::new(
                2,
                "Invalid value for Month (1-12): must be a whole number in 1..=12.",
            ));
        }
        scenario.month = value as u32;
        return Ok(());
    }

    let slot = match field {
        ScenarioField::Fx => &mut scenario.fx_lkr_per_usd_m,
        ScenarioField::KenyaUsd => &mut scenario.kenya_bopf_price_usd_w,
        ScenarioField::IndiaUsd => &mut scenario.india_bopf_price_usd_w,
        ScenarioField::FobAvg => &mut scenario.fob_rs_per_kg_wavg_m,
        ScenarioField::Rain => &mut scenario.rain_mm_sum_w,
        ScenarioField::Temp => &mut scenario.temp_mean_c_w,
        ScenarioField::Humidity => &mut scenario.humidity_mean_w,
        ScenarioField::Month => unreachable!("handled above"),
        ScenarioField::PriceLag1 => &mut scenario.bopf_price_lkr_per_kg_lag1,
        ScenarioField::PriceLag4 => &mut scenario.bopf_price_lkr_per_kg_lag4,
        ScenarioField::PriceLag8 => &mut scenario.bopf_price_lkr_per_kg_lag8,
        ScenarioField::FxLag1 => &mut scenario.fx_lkr_per_usd_m_lag1,
        ScenarioField::KenyaUsdLag1 => &mut scenario.kenya_bopf_price_usd_w_lag1,
        ScenarioField::IndiaUsdLag1 => &mut scenario.india_bopf_price_usd_w_lag1,
        ScenarioField::Rain4w => &mut scenario.rain_4w_sum,
        ScenarioField::PriceMa4w => &mut scenario.price_ma4w,
    };
    *slot = value;
    Ok(())
}
