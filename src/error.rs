use std::path::PathBuf;
use thiserror::Error;

use crate::state::series::SeriesSlot;

/// Failures of the filtering/clipping pipeline for a single sheet.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("no qualifying rows: every category has data for fewer than two series")]
    EmptySeries,

    #[error("series {0} has no non-zero values among qualifying rows")]
    DegenerateSeries(SeriesSlot),
}

/// Errors raised while reading a table from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open workbook: {0}")]
    Workbook(String),

    #[error("cannot read sheet '{sheet}': {reason}")]
    Sheet { sheet: String, reason: String },

    #[error("cannot parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("cell at row {row}, column {col} is not numeric: {value:?}")]
    NotNumeric { row: usize, col: usize, value: String },

    #[error("table has no data rows (expected data from row {0})")]
    NoDataRows(usize),
}

/// Errors raised while drawing or encoding a chart.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("invalid figure size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected key=value, got {text:?}")]
    Syntax { line: usize, text: String },

    #[error("invalid parameter value: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// A failure that aborts one sheet but not the run.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// A failure that aborts the whole run.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("unsupported file format: {}", .0.display())]
    InvalidFileFormat(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
