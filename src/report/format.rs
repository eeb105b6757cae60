//! Text formatting for terminal output and the insight prompt.
//!
//! We keep formatting code in one place so:
//! - the pipeline modules stay free of layout details
//! - output changes are localized (important for snapshot-style tests)

use crate::domain::{AnalysisResult, CanonicalRecordSet, ChartSeries, DisplayView, Field, SourceColumn, ValueColumn};

/// Render the canonical set as a plain, right-aligned text table.
///
/// No index column; timestamps as `YYYY-MM-DD`; numbers in their shortest
/// exact form. Cells that failed to parse are shown verbatim, absent ones as `NaN`.
pub fn format_records_text(set: &CanonicalRecordSet) -> String {
    let mut headers = vec!["timestamp".to_string()];
    headers.extend(set.layout().iter().map(|c| match c {
        SourceColumn::Value(v) => v.name().to_string(),
        SourceColumn::Extra(name) => name.clone(),
    }));

    let rows: Vec<Vec<String>> = set
        .records()
        .iter()
        .map(|r| {
            let mut cells = vec![r.timestamp.format("%Y-%m-%d").to_string()];
            let mut extras = r.extras.iter();
            for src in set.layout() {
                cells.push(match src {
                    SourceColumn::Value(ValueColumn::Volume) => field_text(&r.volume),
                    SourceColumn::Value(other) => field_text(&r.value(*other)),
                    SourceColumn::Extra(_) => extras.next().cloned().unwrap_or_default(),
                });
            }
            cells
        })
        .collect();

    right_aligned(&headers, &rows)
}

fn field_text<T: std::fmt::Display>(field: &Field<T>) -> String {
    match field {
        Field::Value(v) => v.to_string(),
        Field::Invalid(raw) => raw.clone(),
        Field::Missing => "NaN".to_string(),
    }
}

fn right_aligned(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{c:>w$}", w = *w))
        .collect();
    out.push_str(&parts.join(" "));
    out.push('\n');
}

/// Format a display view as a terminal table with a dashed rule under the header.
pub fn format_view_table(view: &DisplayView) -> String {
    let headers = view.headers();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len().max(10)).collect();
    for row in &view.rows {
        for (w, cell) in widths.iter_mut().zip(&row.cells) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{} ({} rows)\n", title_case(view.kind.display_name()), view.len()));
    push_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join(" "));
    out.push('\n');
    for row in &view.rows {
        push_line(&mut out, &row.cells, &widths);
    }
    out
}

/// One-line summary of a chart series.
pub fn format_series_summary(series: &ChartSeries) -> String {
    match (series.date_range(), series.close_range()) {
        (Some((d0, d1)), Some((lo, hi))) => format!(
            "Chart: {} points | {} → {} | close=[{lo:.2}, {hi:.2}]",
            series.len(),
            d0.format("%m/%d/%Y"),
            d1.format("%m/%d/%Y"),
        ),
        _ => "Chart: nothing to draw".to_string(),
    }
}

/// Heading + body for the analysis section.
pub fn format_analysis(result: &AnalysisResult) -> String {
    let heading = if result.is_error() { "Insight (failed)" } else { "Insight" };
    format!("=== {heading} ===\n{}\n", result.text())
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayColumn, DisplayRow, StockRecord, ViewKind};
    use chrono::NaiveDate;

    #[test]
    fn records_text_is_right_aligned_without_index() {
        let records = vec![
            StockRecord {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: Field::Value(10.5),
                high: Field::Value(11.0),
                low: Field::Value(10.0),
                close: Field::Value(10.75),
                volume: Field::Value(1200),
                extras: Vec::new(),
            },
            StockRecord {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                open: Field::Value(9.0),
                high: Field::Value(10.0),
                low: Field::Value(8.5),
                close: Field::Invalid("abc".to_string()),
                volume: Field::Value(80),
                extras: Vec::new(),
            },
        ];
        let set = CanonicalRecordSet::from_file_order(records, ValueColumn::ALL.to_vec());

        let txt = format_records_text(&set);
        let expected = concat!(
            " timestamp open high low close volume\n",
            "2024-01-02 10.5   11  10 10.75   1200\n",
            "2024-01-01    9   10 8.5   abc     80\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn records_text_includes_extra_columns() {
        let record = StockRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: Field::Missing,
            high: Field::Missing,
            low: Field::Missing,
            close: Field::Value(10.75),
            volume: Field::Missing,
            extras: vec!["IBM".to_string()],
        };
        let layout = vec![
            SourceColumn::Extra("ticker".to_string()),
            SourceColumn::Value(ValueColumn::Close),
        ];
        let set = CanonicalRecordSet::with_layout(vec![record], layout);
        assert_eq!(
            format_records_text(&set),
            " timestamp ticker close\n2024-01-02    IBM 10.75\n"
        );
    }

    #[test]
    fn view_table_has_title_header_and_rule() {
        let view = DisplayView {
            kind: ViewKind::LastSeven,
            columns: vec![DisplayColumn::Date, DisplayColumn::Value(ValueColumn::Close)],
            rows: vec![DisplayRow {
                cells: vec!["01/02/2024".to_string(), "10.75".to_string()],
            }],
        };
        let txt = format_view_table(&view);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Last seven records (1 rows)");
        assert_eq!(lines[1], "      Date      Close");
        assert_eq!(lines[2], "---------- ----------");
        assert_eq!(lines[3], "01/02/2024      10.75");
    }

    #[test]
    fn empty_series_summary() {
        assert_eq!(format_series_summary(&ChartSeries::default()), "Chart: nothing to draw");
    }
}
