//! Display views derived from the canonical record set.
//!
//! A view is a fully formatted table: `Date` first (`MM/DD/YYYY`), then every
//! other column in the order the file listed them. Price and volume cells are
//! rendered with exactly two decimals; other columns pass through as text.
//! Views are rebuilt from scratch on every toggle.

use tracing::debug;

use crate::domain::{
    CanonicalRecordSet, DisplayColumn, DisplayRow, DisplayView, Field, LAST_SEVEN_WINDOW, SourceColumn,
    StockRecord, TailPolicy, ValueColumn, ViewKind, sort_descending,
};
use crate::error::PipelineError;

pub const DISPLAY_DATE_FORMAT: &str = "%m/%d/%Y";

/// Two-decimal rendering used for every price and volume cell.
pub fn format_decimal(v: f64) -> String {
    format!("{v:.2}")
}

/// Build the view of every record.
///
/// Returns `Ok(None)` for an absent or empty set so callers can hide the table.
pub fn build_all_view(set: Option<&CanonicalRecordSet>) -> Result<Option<DisplayView>, PipelineError> {
    let Some(set) = set.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    build_view(ViewKind::All, set.records(), set.layout()).map(Some)
}

/// Build the seven-record view.
///
/// With `TailPolicy::CanonicalTail` this is the trailing seven rows of the
/// descending set, which are the seven *oldest* dates.
pub fn build_last_seven_view(
    set: Option<&CanonicalRecordSet>,
    policy: TailPolicy,
) -> Result<Option<DisplayView>, PipelineError> {
    let Some(set) = set.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let window = last_seven_window(set.records(), policy);
    build_view(ViewKind::LastSeven, window, set.layout()).map(Some)
}

/// Dispatch on `kind`.
pub fn build(
    kind: ViewKind,
    set: Option<&CanonicalRecordSet>,
    policy: TailPolicy,
) -> Result<Option<DisplayView>, PipelineError> {
    match kind {
        ViewKind::All => build_all_view(set),
        ViewKind::LastSeven => build_last_seven_view(set, policy),
    }
}

fn last_seven_window(records: &[StockRecord], policy: TailPolicy) -> &[StockRecord] {
    match policy {
        TailPolicy::CanonicalTail => &records[records.len().saturating_sub(LAST_SEVEN_WINDOW)..],
        TailPolicy::MostRecent => &records[..records.len().min(LAST_SEVEN_WINDOW)],
    }
}

fn build_view(
    kind: ViewKind,
    records: &[StockRecord],
    layout: &[SourceColumn],
) -> Result<DisplayView, PipelineError> {
    for col in ValueColumn::ALL {
        if !layout.contains(&SourceColumn::Value(col)) {
            return Err(PipelineError::Format(format!(
                "Missing column `{}`; cannot build {} view.",
                col.name(),
                kind.display_name()
            )));
        }
    }

    let mut rows_in = records.to_vec();
    sort_descending(&mut rows_in);

    let mut columns = Vec::with_capacity(layout.len() + 1);
    columns.push(DisplayColumn::Date);
    columns.extend(layout.iter().map(|c| match c {
        SourceColumn::Value(v) => DisplayColumn::Value(*v),
        SourceColumn::Extra(name) => DisplayColumn::Extra(name.clone()),
    }));

    let mut rows = Vec::with_capacity(rows_in.len());
    for (i, record) in rows_in.iter().enumerate() {
        let mut cells = Vec::with_capacity(columns.len());
        cells.push(record.timestamp.format(DISPLAY_DATE_FORMAT).to_string());
        let mut extras = record.extras.iter();
        for src in layout {
            match src {
                SourceColumn::Value(col) => cells.push(format_field(&record.value(*col), *col, i + 1)?),
                SourceColumn::Extra(_) => cells.push(extras.next().cloned().unwrap_or_default()),
            }
        }
        rows.push(DisplayRow { cells });
    }

    debug!(kind = ?kind, rows = rows.len(), "built display view");
    Ok(DisplayView { kind, columns, rows })
}

fn format_field(field: &Field<f64>, column: ValueColumn, row: usize) -> Result<String, PipelineError> {
    match field {
        Field::Value(v) => Ok(format_decimal(*v)),
        Field::Invalid(raw) => Err(PipelineError::Format(format!(
            "Row {row}: could not convert `{}` value '{raw}' to a number.",
            column.name()
        ))),
        Field::Missing => Err(PipelineError::Format(format!(
            "Row {row}: `{}` value is missing.",
            column.name()
        ))),
    }
}
