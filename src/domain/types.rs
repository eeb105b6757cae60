//! Shared domain types.
//!
//! These types are plain data so every pipeline stage can be tested without a
//! terminal or a network connection:
//!
//! - parsed input rows (`StockRecord`, `CanonicalRecordSet`)
//! - derived presentation values (`DisplayView`, `ChartSeries`)
//! - the insight outcome (`AnalysisResult`)
//! - run configuration (`InsightConfig`, `SessionConfig`)

use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of rows in the "last seven" window.
pub const LAST_SEVEN_WINDOW: usize = 7;

pub const DEFAULT_SYMBOL: &str = "IBM";
pub const DEFAULT_MODEL: &str = "palmyra-fin-32k";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 250;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A numeric cell as it came out of the CSV.
///
/// Ingest only rejects bad timestamps. Price and volume cells that do not
/// parse are kept verbatim and fail later, when a view tries to format them.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Value(T),
    /// Present but not numeric (raw text kept for error messages).
    Invalid(String),
    /// The column does not exist in the file.
    Missing,
}

impl<T> Field<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Value(v) => Field::Value(f(v)),
            Field::Invalid(raw) => Field::Invalid(raw),
            Field::Missing => Field::Missing,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Price/volume columns, in their storage (lower-case) spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl ValueColumn {
    pub const ALL: [ValueColumn; 5] = [
        ValueColumn::Open,
        ValueColumn::High,
        ValueColumn::Low,
        ValueColumn::Close,
        ValueColumn::Volume,
    ];

    /// Column name as it appears in the input header.
    pub fn name(self) -> &'static str {
        match self {
            ValueColumn::Open => "open",
            ValueColumn::High => "high",
            ValueColumn::Low => "low",
            ValueColumn::Close => "close",
            ValueColumn::Volume => "volume",
        }
    }

    /// Capitalized display header.
    pub fn header(self) -> &'static str {
        match self {
            ValueColumn::Open => "Open",
            ValueColumn::High => "High",
            ValueColumn::Low => "Low",
            ValueColumn::Close => "Close",
            ValueColumn::Volume => "Volume",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// One daily row of input.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub timestamp: NaiveDate,
    pub open: Field<f64>,
    pub high: Field<f64>,
    pub low: Field<f64>,
    pub close: Field<f64>,
    pub volume: Field<u64>,
    /// Cells of any other header columns, verbatim, in `SourceColumn::Extra` order.
    pub extras: Vec<String>,
}

impl StockRecord {
    /// Numeric view of a column, with volume widened to `f64`.
    pub fn value(&self, column: ValueColumn) -> Field<f64> {
        match column {
            ValueColumn::Open => self.open.clone(),
            ValueColumn::High => self.high.clone(),
            ValueColumn::Low => self.low.clone(),
            ValueColumn::Close => self.close.clone(),
            ValueColumn::Volume => self.volume.clone().map(|v| v as f64),
        }
    }
}

/// A non-timestamp header column, in the order the file listed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceColumn {
    Value(ValueColumn),
    /// Any other column; carried through as text.
    Extra(String),
}

/// The parsed upload: records sorted descending by timestamp.
///
/// The sort is stable, so rows sharing a date keep their file order. The set is
/// built once per upload and never edited afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecordSet {
    records: Vec<StockRecord>,
    layout: Vec<SourceColumn>,
    columns: Vec<ValueColumn>,
}

impl CanonicalRecordSet {
    /// Build a set from rows in file order.
    ///
    /// `columns` is the order in which value columns appeared in the header.
    pub fn from_file_order(records: Vec<StockRecord>, columns: Vec<ValueColumn>) -> Self {
        Self::with_layout(records, columns.into_iter().map(SourceColumn::Value).collect())
    }

    /// Like `from_file_order`, with extra columns interleaved in `layout`.
    pub fn with_layout(mut records: Vec<StockRecord>, layout: Vec<SourceColumn>) -> Self {
        sort_descending(&mut records);
        let columns = layout
            .iter()
            .filter_map(|c| match c {
                SourceColumn::Value(v) => Some(*v),
                SourceColumn::Extra(_) => None,
            })
            .collect();
        Self {
            records,
            layout,
            columns,
        }
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    /// Value columns in source order.
    pub fn columns(&self) -> &[ValueColumn] {
        &self.columns
    }

    /// Every non-timestamp column in source order.
    pub fn layout(&self) -> &[SourceColumn] {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Newest and oldest dates, if any rows exist.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let newest = self.records.first()?.timestamp;
        let oldest = self.records.last()?.timestamp;
        Some((oldest, newest))
    }
}

/// Stable descending sort by timestamp.
pub fn sort_descending(records: &mut [StockRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Which window of the canonical set a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    /// Every record.
    All,
    /// Seven records chosen by the configured `TailPolicy`.
    LastSeven,
}

impl ViewKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ViewKind::All => "all records",
            ViewKind::LastSeven => "last seven records",
        }
    }
}

/// How the "last seven" window is cut from the descending canonical set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TailPolicy {
    /// Trailing seven rows of the descending sequence, i.e. the seven oldest dates.
    CanonicalTail,
    /// The seven newest dates.
    MostRecent,
}

/// A column of a display view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayColumn {
    Date,
    Value(ValueColumn),
    /// Source name of a pass-through column.
    Extra(String),
}

impl DisplayColumn {
    pub fn header(&self) -> String {
        match self {
            DisplayColumn::Date => "Date".to_string(),
            DisplayColumn::Value(c) => c.header().to_string(),
            DisplayColumn::Extra(name) => capitalize(name),
        }
    }
}

/// First character upper-cased, the rest lower-cased (`"adj CLOSE"` → `"Adj close"`).
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// One formatted row; `cells` lines up with `DisplayView::columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub cells: Vec<String>,
}

/// A formatted, possibly windowed projection of the canonical set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayView {
    pub kind: ViewKind,
    pub columns: Vec<DisplayColumn>,
    pub rows: Vec<DisplayRow>,
}

impl DisplayView {
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(DisplayColumn::header).collect()
    }

    pub fn column_index(&self, column: DisplayColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn cell(&self, row: usize, column: DisplayColumn) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.cells.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices in ascending date order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.date, self.points.last()?.date))
    }

    pub fn close_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for p in &self.points {
            lo = lo.min(p.close);
            hi = hi.max(p.close);
        }
        if lo.is_finite() && hi.is_finite() { Some((lo, hi)) } else { None }
    }
}

/// Outcome of one insight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    Insight(String),
    Failed(String),
}

impl AnalysisResult {
    pub fn text(&self) -> &str {
        match self {
            AnalysisResult::Insight(t) | AnalysisResult::Failed(t) => t,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResult::Failed(_))
    }
}

/// Fixed parameters for the completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightConfig {
    /// Ticker named in the prompt and the UI title.
    pub symbol: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Session-level behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub tail_policy: TailPolicy,
    /// When false, uploads skip the completion call entirely.
    pub insight_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tail_policy: TailPolicy::CanonicalTail,
            insight_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(date: (i32, u32, u32), close: f64) -> StockRecord {
        StockRecord {
            timestamp: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            open: Field::Value(close),
            high: Field::Value(close),
            low: Field::Value(close),
            close: Field::Value(close),
            volume: Field::Value(100),
            extras: Vec::new(),
        }
    }

    #[test]
    fn canonical_set_is_descending_and_stable() {
        let set = CanonicalRecordSet::from_file_order(
            vec![
                rec((2024, 1, 1), 1.0),
                rec((2024, 1, 2), 2.0),
                rec((2024, 1, 1), 3.0),
            ],
            ValueColumn::ALL.to_vec(),
        );

        let closes: Vec<f64> = set.records().iter().map(|r| *r.close.value().unwrap()).collect();
        assert_eq!(closes, vec![2.0, 1.0, 3.0]);
        assert_eq!(
            set.date_span(),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
            ))
        );
    }

    #[test]
    fn layout_keeps_extras_and_columns_keeps_values() {
        let set = CanonicalRecordSet::with_layout(
            vec![rec((2024, 1, 1), 1.0)],
            vec![
                SourceColumn::Value(ValueColumn::Close),
                SourceColumn::Extra("note".to_string()),
                SourceColumn::Value(ValueColumn::Open),
            ],
        );
        assert_eq!(set.columns(), &[ValueColumn::Close, ValueColumn::Open]);
        assert_eq!(set.layout().len(), 3);
    }

    #[test]
    fn extra_headers_are_capitalized() {
        assert_eq!(DisplayColumn::Extra("adj CLOSE".to_string()).header(), "Adj close");
        assert_eq!(capitalize(""), "");
        assert_eq!(DisplayColumn::Value(ValueColumn::Volume).header(), "Volume");
    }

    #[test]
    fn volume_widens_to_f64() {
        let r = rec((2024, 1, 1), 1.0);
        assert_eq!(r.value(ValueColumn::Volume), Field::Value(100.0));
    }
}
