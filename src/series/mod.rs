//! Merge actual history, the forecast point, and competitor references into
//! one date-ascending series.
//!
//! The merge is deliberately dumb: history rows are trusted as already
//! ordered and date-unique, so they map verbatim; the forecast (when present)
//! becomes exactly one trailing row. No interpolation, no gap-filling, no
//! reordering. The series is rebuilt wholesale from every successful
//! response, never patched incrementally.

use crate::domain::{ForecastPoint, HistoryPoint, MergedRow};

/// Build the merged series from history plus an optional forecast point.
pub fn merge_series(history: &[HistoryPoint], forecast: Option<&ForecastPoint>) -> Vec<MergedRow> {
    let mut rows = Vec::with_capacity(history.len() + usize::from(forecast.is_some()));

    for h in history {
        let mut row = MergedRow::at(h.date);
        row.actual = Some(h.price_lkr);
        row.kenya_usd = h.kenya_usd;
        row.india_usd = h.india_usd;
        rows.push(row);
    }

    if let Some(f) = forecast {
        let mut row = MergedRow::at(f.date);
        row.predicted = Some(f.price_lkr);
        row.lower = f.lower;
        row.upper = f.upper;
        rows.push(row);
    }

    rows
}

/// The ordered actual-only subsequence of the series.
pub fn actual_values(rows: &[MergedRow]) -> Vec<f64> {
    rows.iter().filter_map(|r| r.actual).collect()
}

/// The most recent actual price, if any.
pub fn last_actual(rows: &[MergedRow]) -> Option<f64> {
    rows.iter().rev().find_map(|r| r.actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn history_point(day: u32, price: f64) -> HistoryPoint {
        HistoryPoint {
            date: d(day),
            price_lkr: price,
            kenya_usd: Some(3.1),
            india_usd: None,
        }
    }

    fn forecast_point(day: u32) -> ForecastPoint {
        ForecastPoint {
            date: d(day),
            price_lkr: 1260.0,
            confidence: "medium".to_string(),
            lower: Some(1220.0),
            upper: Some(1300.0),
        }
    }

    #[test]
    fn history_rows_map_verbatim_in_order() {
        let history = vec![history_point(1, 1200.0), history_point(8, 1210.0)];
        let rows = merge_series(&history, None);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(1));
        assert_eq!(rows[0].actual, Some(1200.0));
        assert_eq!(rows[0].kenya_usd, Some(3.1));
        assert_eq!(rows[0].india_usd, None);
        assert_eq!(rows[0].predicted, None);
        assert_eq!(rows[1].date, d(8));
        assert_eq!(rows[1].actual, Some(1210.0));
    }

    #[test]
    fn forecast_appends_exactly_one_trailing_row() {
        let history = vec![history_point(1, 1200.0)];
        let rows = merge_series(&history, Some(&forecast_point(8)));

        assert_eq!(rows.len(), 2);
        let last = rows.last().unwrap();
        assert_eq!(last.date, d(8));
        assert_eq!(last.predicted, Some(1260.0));
        assert_eq!(last.lower, Some(1220.0));
        assert_eq!(last.upper, Some(1300.0));
        assert_eq!(last.actual, None, "forecast row must not carry an actual");
        assert_eq!(last.kenya_usd, None);
        assert_eq!(last.india_usd, None);

        // Only the last row carries predicted/bounds.
        for row in &rows[..rows.len() - 1] {
            assert_eq!(row.predicted, None);
            assert_eq!(row.lower, None);
            assert_eq!(row.upper, None);
        }
    }

    #[test]
    fn empty_history_with_forecast_gives_single_forecast_row() {
        let rows = merge_series(&[], Some(&forecast_point(8)));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].predicted, Some(1260.0));
        assert_eq!(rows[0].actual, None);
        assert_eq!(rows[0].kenya_usd, None);
        assert_eq!(rows[0].india_usd, None);
    }

    #[test]
    fn empty_inputs_give_empty_series() {
        assert!(merge_series(&[], None).is_empty());
    }

    #[test]
    fn actual_accessors_skip_forecast_row() {
        let history = vec![history_point(1, 1200.0), history_point(8, 1210.0)];
        let rows = merge_series(&history, Some(&forecast_point(15)));

        assert_eq!(actual_values(&rows), vec![1200.0, 1210.0]);
        assert_eq!(last_actual(&rows), Some(1210.0));
    }

    #[test]
    fn last_actual_none_on_forecast_only_series() {
        let rows = merge_series(&[], Some(&forecast_point(8)));
        assert_eq!(last_actual(&rows), None);
        assert!(actual_values(&rows).is_empty());
    }
}
