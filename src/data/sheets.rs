use std::path::Path;

use crate::data::loader::{self, Cell, FileKind, Grid, SheetRef};
use crate::error::LoadError;
use crate::logging::ErrorLog;
use crate::processing::selection::CategoryRow;
use crate::state::series::SeriesSlot;

/// Where labels, period headers and series values sit in a sheet.
/// All indices are 0-based positions in the raw grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub label_col: usize,
    /// Columns of series A, B and C.
    pub series_cols: [usize; 3],
    /// Row holding the period (year) label of each series column.
    pub period_row: usize,
    pub data_start_row: usize,
}

impl Default for SheetLayout {
    /// Labels in column A, series A/B/C in columns E/D/C, years on the
    /// third row and data from the fourth row on.
    fn default() -> Self {
        Self {
            label_col: 0,
            series_cols: [4, 3, 2],
            period_row: 2,
            data_start_row: 3,
        }
    }
}

/// Category rows and period labels of one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub rows: Vec<CategoryRow>,
    pub periods: [String; 3],
}

impl SheetTable {
    pub fn period(&self, slot: SeriesSlot) -> &str {
        &self.periods[slot.index()]
    }
}

/// A sheet that passed type checking, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub sheet: SheetRef,
    pub table: SheetTable,
}

fn numeric(cell: &Cell, row: usize, col: usize) -> Result<f64, LoadError> {
    let not_numeric = || LoadError::NotNumeric { row, col, value: cell.text() };
    match cell {
        Cell::Empty => Ok(0.0),
        Cell::Number(v) if v.is_nan() => Ok(0.0),
        Cell::Number(v) if v.is_finite() => Ok(*v),
        Cell::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Cell::Number(_) | Cell::Text(_) | Cell::Invalid(_) => Err(not_numeric()),
    }
}

/// Build the category rows of a grid. Empty value cells read as 0
/// ("no data"); any non-numeric value cell fails the whole sheet.
pub fn extract_table(grid: &Grid, layout: &SheetLayout) -> Result<SheetTable, LoadError> {
    if grid.row_count() <= layout.data_start_row {
        return Err(LoadError::NoDataRows(layout.data_start_row));
    }

    let mut rows = Vec::with_capacity(grid.row_count() - layout.data_start_row);
    for r in layout.data_start_row..grid.row_count() {
        let mut series = [0.0; 3];
        for (value, &col) in series.iter_mut().zip(&layout.series_cols) {
            *value = numeric(grid.get(r, col), r, col)?;
        }
        rows.push(CategoryRow::new(grid.get(r, layout.label_col).text(), series));
    }

    let periods = SeriesSlot::ALL.map(|slot| {
        let text = grid.get(layout.period_row, layout.series_cols[slot.index()]).text();
        if text.is_empty() {
            format!("Series {slot}")
        } else {
            text
        }
    });

    Ok(SheetTable { rows, periods })
}

/// Enumerate the sheets of `path` that can be charted.
///
/// For spreadsheets, only sheets whose name contains `marker` are tried;
/// those whose series columns fail to parse are written to `errors` and
/// skipped. A CSV file is a single [`SheetRef::WholeFile`].
pub fn valid_sheets(
    path: &Path,
    marker: &str,
    layout: &SheetLayout,
    errors: &mut ErrorLog,
) -> Result<Vec<LoadedSheet>, LoadError> {
    let candidates = match loader::file_kind(path) {
        Some(FileKind::Excel) => loader::sheet_names(path)?
            .into_iter()
            .filter(|name| name.contains(marker))
            .map(SheetRef::Named)
            .collect(),
        _ => vec![SheetRef::WholeFile],
    };

    let mut valid = Vec::with_capacity(candidates.len());
    for sheet in candidates {
        let table = loader::load_grid(path, &sheet).and_then(|grid| extract_table(&grid, layout));
        match table {
            Ok(table) => valid.push(LoadedSheet { sheet, table }),
            Err(e) => {
                let msg = format!(
                    "Error processing sheet '{}': {e}",
                    sheet.display_name(path)
                );
                println!("{msg}");
                errors.record(&msg);
            }
        }
    }
    Ok(valid)
}
