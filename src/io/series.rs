//! Read/write chart series JSON files.
//!
//! A series file is the portable form of a chart: the ticker, which view it
//! came from, and the ascending `(date, close)` points. `stocks plot` reads it
//! back without the source CSV.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ChartSeries, ViewKind};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFile {
    pub tool: String,
    pub symbol: String,
    pub view: ViewKind,
    #[serde(flatten)]
    pub series: ChartSeries,
}

/// Write a series JSON file.
pub fn write_series_json(path: &Path, symbol: &str, view: ViewKind, series: &ChartSeries) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create series JSON '{}': {e}", path.display())))?;

    let doc = SeriesFile {
        tool: "stocks".to_string(),
        symbol: symbol.to_string(),
        view,
        series: series.clone(),
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write series JSON: {e}")))?;

    Ok(())
}

/// Read a series JSON file.
pub fn read_series_json(path: &Path) -> Result<SeriesFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open series JSON '{}': {e}", path.display())))?;
    let doc: SeriesFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid series JSON: {e}")))?;
    Ok(doc)
}
