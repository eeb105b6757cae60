//! Export a display view to CSV.
//!
//! The export mirrors what the table shows: capitalized headers, `MM/DD/YYYY`
//! dates and two-decimal numbers, so it opens cleanly in a spreadsheet.

use std::path::Path;

use crate::domain::DisplayView;
use crate::error::AppError;

/// Write a display view to a CSV file.
pub fn write_view_csv(path: &Path, view: &DisplayView) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(view.headers())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in &view.rows {
        writer
            .write_record(&row.cells)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayColumn, DisplayRow, ValueColumn, ViewKind};

    #[test]
    fn writes_headers_and_rows() {
        let view = DisplayView {
            kind: ViewKind::All,
            columns: vec![
                DisplayColumn::Date,
                DisplayColumn::Value(ValueColumn::Close),
                DisplayColumn::Value(ValueColumn::Volume),
            ],
            rows: vec![
                DisplayRow {
                    cells: vec!["01/02/2024".into(), "10.50".into(), "1200.00".into()],
                },
                DisplayRow {
                    cells: vec!["01/01/2024".into(), "9.00".into(), "800.00".into()],
                },
            ],
        };

        let path = std::env::temp_dir().join(format!("stocks_view_export_{}.csv", std::process::id()));
        write_view_csv(&path, &view).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(
            text,
            "Date,Close,Volume\n01/02/2024,10.50,1200.00\n01/01/2024,9.00,800.00\n"
        );
    }
}
