//! Export the merged series to CSV, and parse such a file back.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per merged-series row, missing values as empty fields.
//! The parser is the exact inverse (empty field ⇔ absent value), which lets
//! `bopf replay` recompute indicators from a saved export without touching
//! the network.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::MergedRow;
use crate::error::AppError;

pub const CSV_HEADER: &str = "date,actual,predicted,lower,upper,kenya_usd,india_usd";

/// Render the series as CSV text.
///
/// Numbers use `f64`'s shortest round-trip formatting so a parse of the
/// output recovers the exact values.
pub fn format_series_csv(rows: &[MergedRow]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            row.date,
            fmt_opt(row.actual),
            fmt_opt(row.predicted),
            fmt_opt(row.lower),
            fmt_opt(row.upper),
            fmt_opt(row.kenya_usd),
            fmt_opt(row.india_usd),
        ));
    }
    out
}

/// Write the series to a CSV file.
pub fn write_series_csv(path: &Path, rows: &[MergedRow]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    file.write_all(format_series_csv(rows).as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Parse CSV text produced by `format_series_csv`.
pub fn parse_series_csv(text: &str) -> Result<Vec<MergedRow>, AppError> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| AppError::new(2, "Series CSV is empty."))?;
    if header.trim() != CSV_HEADER {
        return Err(AppError::new(
            2,
            format!("Unexpected series CSV header '{header}' (expected '{CSV_HEADER}')."),
        ));
    }

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 7 {
            return Err(AppError::new(
                2,
                format!("Series CSV row {} has {} fields (expected 7).", idx + 2, fields.len()),
            ));
        }

        let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d")
            .map_err(|e| AppError::new(2, format!("Invalid date '{}' in series CSV: {e}", fields[0])))?;

        rows.push(MergedRow {
            date,
            actual: parse_opt(fields[1], idx)?,
            predicted: parse_opt(fields[2], idx)?,
            lower: parse_opt(fields[3], idx)?,
            upper: parse_opt(fields[4], idx)?,
            kenya_usd: parse_opt(fields[5], idx)?,
            india_usd: parse_opt(fields[6], idx)?,
        });
    }
    Ok(rows)
}

/// Read a series CSV file from disk.
pub fn read_series_csv(path: &Path) -> Result<Vec<MergedRow>, AppError> {
    let mut file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open series CSV '{}': {e}", path.display())))?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| AppError::new(2, format!("Failed to read series CSV '{}': {e}", path.display())))?;
    parse_series_csv(&text)
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => String::new(),
    }
}

fn parse_opt(raw: &str, row_idx: usize) -> Result<Option<f64>, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let v = trimmed
        .parse::<f64>()
        .map_err(|e| AppError::new(2, format!("Invalid number '{trimmed}' in series CSV row {}: {e}", row_idx + 2)))?;
    Ok(Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn sample_rows() -> Vec<MergedRow> {
        let mut first = MergedRow::at(d(2));
        first.actual = Some(1210.25);
        first.kenya_usd = Some(3.1);

        let mut second = MergedRow::at(d(9));
        second.actual = Some(1216.0);
        second.india_usd = Some(2.8);

        let mut forecast = MergedRow::at(d(16));
        forecast.predicted = Some(1235.5);
        forecast.lower = Some(1200.0);
        forecast.upper = Some(1271.125);

        vec![first, second, forecast]
    }

    #[test]
    fn header_and_empty_fields() {
        let csv = format_series_csv(&sample_rows());
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(lines.next(), Some("2025-06-02,1210.25,,,,3.1,"));
        assert_eq!(lines.next(), Some("2025-06-09,1216,,,,,2.8"));
        assert_eq!(lines.next(), Some("2025-06-16,,1235.5,1200,1271.125,,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn round_trips_through_text() {
        let rows = sample_rows();
        let parsed = parse_series_csv(&format_series_csv(&rows)).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn round_trips_through_a_file() {
        let rows = sample_rows();
        let path = std::env::temp_dir().join("bopf_export_roundtrip_test.csv");
        write_series_csv(&path, &rows).unwrap();
        let parsed = read_series_csv(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(parsed, rows);
    }

    #[test]
    fn empty_series_is_just_the_header() {
        let csv = format_series_csv(&[]);
        assert_eq!(csv, format!("{CSV_HEADER}\n"));
        assert!(parse_series_csv(&csv).unwrap().is_empty());
    }

    #[test]
    fn rejects_wrong_header_and_bad_rows() {
        assert!(parse_series_csv("nope\n").is_err());
        assert!(parse_series_csv(&format!("{CSV_HEADER}\n2025-06-02,1,2\n")).is_err());
        assert!(parse_series_csv(&format!("{CSV_HEADER}\n2025-06-02,abc,,,,,\n")).is_err());
        assert!(parse_series_csv(&format!("{CSV_HEADER}\nnot-a-date,,,,,,\n")).is_err());
    }
}
