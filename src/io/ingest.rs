//! CSV ingest and normalization.
//!
//! This module turns an uploaded daily price CSV into a `CanonicalRecordSet`.
//!
//! Design goals:
//! - **Strict timestamps**: one fixed `YYYY-MM-DD` pattern, and a single bad date
//!   rejects the whole file (no partial ingestion)
//! - **Lenient numbers**: non-numeric price cells are kept and only fail when a
//!   view tries to format them
//! - **Pure**: nothing is committed here; callers swap in the result on success

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::debug;

use crate::domain::{CanonicalRecordSet, Field, SourceColumn, StockRecord, ValueColumn};
use crate::error::PipelineError;

const TIMESTAMP_COLUMN: &str = "timestamp";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d";

/// Raw bytes of an uploaded file plus the name shown in status messages.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a whole file from disk.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path).map_err(|e| {
            PipelineError::Ingest(format!("Failed to read '{}': {e}", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Parse raw CSV bytes into a canonical (descending, stable) record set.
pub fn parse(bytes: &[u8]) -> Result<CanonicalRecordSet, PipelineError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PipelineError::Ingest(format!("File is not valid UTF-8 text: {e}")))?;

    if text.trim().is_empty() {
        return Err(PipelineError::Ingest("No columns to parse from file.".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Ingest(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    if !header_map.contains_key(TIMESTAMP_COLUMN) {
        return Err(PipelineError::Ingest(format!(
            "Missing required column: `{TIMESTAMP_COLUMN}`"
        )));
    }

    let (layout, extra_idx) = source_layout(&headers);

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        let record =
            result.map_err(|e| PipelineError::Ingest(format!("Line {line}: CSV parse error: {e}")))?;
        let row = parse_row(&record, &header_map, &extra_idx)
            .map_err(|msg| PipelineError::Ingest(format!("Line {line}: {msg}")))?;
        records.push(row);
    }

    debug!(rows = records.len(), columns = layout.len(), "parsed CSV");
    Ok(CanonicalRecordSet::with_layout(records, layout))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated header names.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Non-timestamp columns in header order, plus the cell index of each extra.
fn source_layout(headers: &StringRecord) -> (Vec<SourceColumn>, Vec<usize>) {
    let mut layout = Vec::new();
    let mut extra_idx = Vec::new();
    for (idx, raw) in headers.iter().enumerate() {
        let name = normalize_header_name(raw);
        if name == TIMESTAMP_COLUMN {
            continue;
        }
        let col = match ValueColumn::from_name(&name) {
            Some(v) => SourceColumn::Value(v),
            None => SourceColumn::Extra(name),
        };
        if layout.contains(&col) {
            continue;
        }
        if matches!(col, SourceColumn::Extra(_)) {
            extra_idx.push(idx);
        }
        layout.push(col);
    }
    (layout, extra_idx)
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    extra_idx: &[usize],
) -> Result<StockRecord, String> {
    let raw_ts = get_cell(record, header_map, TIMESTAMP_COLUMN).unwrap_or("");
    let timestamp = parse_timestamp(raw_ts)?;

    Ok(StockRecord {
        timestamp,
        open: parse_price(record, header_map, ValueColumn::Open),
        high: parse_price(record, header_map, ValueColumn::High),
        low: parse_price(record, header_map, ValueColumn::Low),
        close: parse_price(record, header_map, ValueColumn::Close),
        volume: parse_volume(record, header_map),
        extras: extra_idx
            .iter()
            .map(|&i| record.get(i).unwrap_or("").trim().to_string())
            .collect(),
    })
}

/// Strict `YYYY-MM-DD`; single-digit months or days are rejected.
pub fn parse_timestamp(s: &str) -> Result<NaiveDate, String> {
    let b = s.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return Err(format!("Invalid timestamp '{s}'. Expected YYYY-MM-DD."));
    }
    NaiveDate::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| format!("Invalid timestamp '{s}': {e}"))
}

fn get_cell<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim)
}

fn parse_price(record: &StringRecord, header_map: &HashMap<String, usize>, column: ValueColumn) -> Field<f64> {
    let Some(raw) = get_cell(record, header_map, column.name()) else {
        return Field::Missing;
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Field::Value(v),
        _ => Field::Invalid(raw.to_string()),
    }
}

fn parse_volume(record: &StringRecord, header_map: &HashMap<String, usize>) -> Field<u64> {
    let Some(raw) = get_cell(record, header_map, ValueColumn::Volume.name()) else {
        return Field::Missing;
    };
    if let Ok(v) = raw.parse::<u64>() {
        return Field::Value(v);
    }
    // Some exports write whole volumes as `1200.0`.
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Field::Value(v as u64)
        }
        _ => Field::Invalid(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn sorts_descending_by_timestamp() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   2024-01-03,1,2,0.5,1.5,100\n\
                   2024-01-01,1,2,0.5,1.5,100\n\
                   2024-01-02,1,2,0.5,1.5,100\n";
        let set = parse(csv.as_bytes()).unwrap();
        let dates: Vec<NaiveDate> = set.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(dates, vec![d(2024, 1, 3), d(2024, 1, 2), d(2024, 1, 1)]);
    }

    #[test]
    fn ties_keep_file_order() {
        let csv = "timestamp,close\n\
                   2024-01-01,1\n\
                   2024-01-02,2\n\
                   2024-01-01,3\n\
                   2024-01-01,4\n";
        let set = parse(csv.as_bytes()).unwrap();
        let closes: Vec<f64> = set.records().iter().map(|r| *r.close.value().unwrap()).collect();
        assert_eq!(closes, vec![2.0, 1.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_input_is_an_ingest_error() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(err, PipelineError::Ingest(_)));

        let err = parse(b"  \n").unwrap_err();
        assert!(matches!(err, PipelineError::Ingest(_)));
    }

    #[test]
    fn missing_timestamp_column_is_rejected() {
        let err = parse(b"date,close\n2024-01-01,1\n").unwrap_err();
        assert_eq!(
            err,
            PipelineError::Ingest("Missing required column: `timestamp`".to_string())
        );
    }

    #[test]
    fn one_bad_date_rejects_the_whole_file() {
        let csv = "timestamp,close\n2024-01-01,1\n01/02/2024,2\n";
        let err = parse(csv.as_bytes()).unwrap_err();
        match err {
            PipelineError::Ingest(msg) => {
                assert!(msg.starts_with("Line 3:"), "{msg}");
                assert!(msg.contains("01/02/2024"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timestamp_pattern_is_strict() {
        assert!(parse_timestamp("2024-1-05").is_err());
        assert!(parse_timestamp("2024-01-5").is_err());
        assert!(parse_timestamp("2024-02-30").is_err());
        assert!(parse_timestamp("2024-01-05T00:00").is_err());
        assert_eq!(parse_timestamp("2024-01-05").unwrap(), d(2024, 1, 5));
    }

    #[test]
    fn non_numeric_prices_are_kept_for_later() {
        let csv = "timestamp,open,high,low,close,volume\n2024-01-01,1,2,0.5,abc,1e3\n";
        let set = parse(csv.as_bytes()).unwrap();
        let r = &set.records()[0];
        assert_eq!(r.close, Field::Invalid("abc".to_string()));
        assert_eq!(r.volume, Field::Value(1000));
        assert_eq!(r.open, Field::Value(1.0));
    }

    #[test]
    fn absent_columns_are_missing_and_extras_carried() {
        let csv = "\u{feff}timestamp,note,close\n2024-01-01,hello,10.5\n";
        let set = parse(csv.as_bytes()).unwrap();
        assert_eq!(set.columns(), &[ValueColumn::Close]);
        assert_eq!(
            set.layout(),
            &[
                SourceColumn::Extra("note".to_string()),
                SourceColumn::Value(ValueColumn::Close)
            ]
        );
        let r = &set.records()[0];
        assert_eq!(r.close, Field::Value(10.5));
        assert_eq!(r.volume, Field::Missing);
        assert_eq!(r.extras, vec!["hello".to_string()]);
    }

    #[test]
    fn header_only_yields_empty_set() {
        let set = parse(b"timestamp,open,high,low,close,volume\n").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.columns().len(), 5);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "timestamp,close\n2024-01-01,1,extra\n";
        assert!(matches!(parse(csv.as_bytes()), Err(PipelineError::Ingest(_))));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(parse(&[0xff, 0xfe, 0x00]), Err(PipelineError::Ingest(_))));
    }
}
