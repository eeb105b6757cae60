//! Chart projection: display view → chronological (date, close) series.
//!
//! The view's strings are parsed back rather than reading the canonical set,
//! so the chart always shows exactly what the table shows.

use chrono::NaiveDate;

use crate::domain::{ChartPoint, ChartSeries, DisplayColumn, DisplayView, ValueColumn};
use crate::error::PipelineError;
use crate::view::DISPLAY_DATE_FORMAT;

/// Project a view into an ascending-by-date close series.
///
/// An absent or empty view yields an empty series ("nothing to draw").
/// Duplicate dates are kept as separate points, in view order.
pub fn project(view: Option<&DisplayView>) -> Result<ChartSeries, PipelineError> {
    let Some(view) = view.filter(|v| !v.is_empty()) else {
        return Ok(ChartSeries::default());
    };

    let close_idx = view
        .column_index(DisplayColumn::Value(ValueColumn::Close))
        .ok_or_else(|| PipelineError::Format("View has no `Close` column to chart.".to_string()))?;
    let date_idx = view
        .column_index(DisplayColumn::Date)
        .ok_or_else(|| PipelineError::Format("View has no `Date` column to chart.".to_string()))?;

    let mut points = Vec::with_capacity(view.len());
    for (i, row) in view.rows.iter().enumerate() {
        let raw_close = row.cells.get(close_idx).map(String::as_str).unwrap_or("");
        let close = raw_close
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                PipelineError::Format(format!("Row {}: Close '{raw_close}' is not a number.", i + 1))
            })?;

        let raw_date = row.cells.get(date_idx).map(String::as_str).unwrap_or("");
        let date = NaiveDate::parse_from_str(raw_date.trim(), DISPLAY_DATE_FORMAT).map_err(|e| {
            PipelineError::Format(format!("Row {}: Date '{raw_date}' is not a date: {e}", i + 1))
        })?;

        points.push(ChartPoint { date, close });
    }

    // Stable, so equal dates keep their view order.
    points.sort_by_key(|p| p.date);
    Ok(ChartSeries { points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayRow, ViewKind};

    fn view(rows: &[(&str, &str)]) -> DisplayView {
        DisplayView {
            kind: ViewKind::All,
            columns: vec![DisplayColumn::Date, DisplayColumn::Value(ValueColumn::Close)],
            rows: rows
                .iter()
                .map(|(d, c)| DisplayRow {
                    cells: vec![d.to_string(), c.to_string()],
                })
                .collect(),
        }
    }

    #[test]
    fn projects_in_ascending_date_order() {
        let v = view(&[("01/03/2024", "3.00"), ("01/01/2024", "1.00"), ("01/02/2024", "2.00")]);
        let series = project(Some(&v)).unwrap();
        let closes: Vec<f64> = series.points.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert!(series.points.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn duplicate_dates_are_separate_points() {
        let v = view(&[("01/02/2024", "5.00"), ("01/01/2024", "1.00"), ("01/02/2024", "6.00")]);
        let series = project(Some(&v)).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.points[1].close, 5.0);
        assert_eq!(series.points[2].close, 6.0);
    }

    #[test]
    fn unparseable_close_is_a_format_error() {
        let v = view(&[("01/01/2024", "n/a")]);
        assert!(matches!(project(Some(&v)), Err(PipelineError::Format(_))));
    }

    #[test]
    fn unparseable_date_is_a_format_error() {
        let v = view(&[("2024-01-01", "1.00")]);
        assert!(matches!(project(Some(&v)), Err(PipelineError::Format(_))));
    }

    #[test]
    fn nothing_to_draw_for_empty_or_absent_views() {
        assert!(project(None).unwrap().is_empty());
        assert!(project(Some(&view(&[]))).unwrap().is_empty());
    }

    #[test]
    fn ranges_cover_the_series() {
        let v = view(&[("01/03/2024", "3.50"), ("01/01/2024", "1.25")]);
        let series = project(Some(&v)).unwrap();
        assert_eq!(series.close_range(), Some((1.25, 3.5)));
        let (first, last) = series.date_range().unwrap();
        assert!(first < last);
    }
}
