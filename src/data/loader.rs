use std::path::Path;

use crate::error::LoadError;

/// Which part of an input file holds a chart's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRef {
    /// A worksheet of a spreadsheet, by name.
    Named(String),
    /// The whole file (CSV inputs have no sheets).
    WholeFile,
}

impl SheetRef {
    /// Name used for the output image and in messages.
    pub fn display_name<'a>(&'a self, path: &'a Path) -> &'a str {
        match self {
            SheetRef::Named(name) => name,
            SheetRef::WholeFile => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("chart"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

/// Classify a path by extension. Returns `None` for unsupported formats.
pub fn file_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => Some(FileKind::Csv),
        "xls" | "xlsx" => Some(FileKind::Excel),
        _ => None,
    }
}

pub fn is_supported(path: &Path) -> bool {
    file_kind(path).is_some()
}

/// A single cell of a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    /// Spreadsheet error values and other cells that can never be numbers.
    Invalid(String),
}

impl Cell {
    fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else if let Ok(v) = trimmed.parse::<f64>() {
            Cell::Number(v)
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Display text of the cell, as used for labels.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
            Cell::Number(v) => v.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Text(s) | Cell::Invalid(s) => s.clone(),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Row-major table of cells, positioned as in the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (row, col); missing cells read as empty.
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Names of all worksheets of a spreadsheet file.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, LoadError> {
    use calamine::{open_workbook_auto, Reader};

    let workbook = open_workbook_auto(path)
        .map_err(|e| LoadError::Workbook(e.to_string()))?;
    Ok(workbook.sheet_names())
}

/// Load one sheet (or a whole CSV file) into a [`Grid`].
pub fn load_grid(path: &Path, sheet: &SheetRef) -> Result<Grid, LoadError> {
    match (file_kind(path), sheet) {
        (Some(FileKind::Csv), _) => load_csv(path),
        (Some(FileKind::Excel), SheetRef::Named(name)) => load_excel(path, name),
        (Some(FileKind::Excel), SheetRef::WholeFile) => {
            let first = sheet_names(path)?
                .into_iter()
                .next()
                .ok_or_else(|| LoadError::Workbook("no sheets found".to_string()))?;
            load_excel(path, &first)
        }
        (None, _) => Err(LoadError::Workbook(format!(
            "unsupported file format: {}",
            path.display()
        ))),
    }
}

fn load_csv(path: &Path) -> Result<Grid, LoadError> {
    let content = std::fs::read(path)?;
    // Fallback: treat as latin1 (each byte maps to same Unicode code point)
    let text = match String::from_utf8(content) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(Grid { rows })
}

fn load_excel(path: &Path, sheet_name: &str) -> Result<Grid, LoadError> {
    use calamine::{open_workbook_auto, Data, Reader};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| LoadError::Workbook(e.to_string()))?;

    let range = workbook.worksheet_range(sheet_name)
        .map_err(|e| LoadError::Sheet {
            sheet: sheet_name.to_string(),
            reason: e.to_string(),
        })?;

    // Ranges start at the first used cell; read by absolute position so the
    // fixed row/column layout still lines up when leading cells are blank.
    let Some((last_row, last_col)) = range.end() else {
        return Ok(Grid::default());
    };

    let rows = (0..=last_row)
        .map(|r| {
            (0..=last_col)
                .map(|c| match range.get_value((r, c)) {
                    None | Some(Data::Empty) => Cell::Empty,
                    Some(Data::String(s)) => Cell::from_text(s),
                    Some(Data::Float(f)) => Cell::Number(*f),
                    Some(Data::Int(i)) => Cell::Number(*i as f64),
                    Some(Data::Bool(b)) => Cell::Bool(*b),
                    Some(Data::DateTime(dt)) => Cell::Invalid(dt.to_string()),
                    Some(Data::DateTimeIso(s)) => Cell::Text(s.clone()),
                    Some(Data::DurationIso(s)) => Cell::Text(s.clone()),
                    Some(Data::Error(e)) => Cell::Invalid(format!("{e:?}")),
                })
                .collect()
        })
        .collect();

    Ok(Grid { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn recognises_supported_extensions() {
        assert_eq!(file_kind(Path::new("data.csv")), Some(FileKind::Csv));
        assert_eq!(file_kind(Path::new("data.xlsx")), Some(FileKind::Excel));
        assert_eq!(file_kind(Path::new("data.XLS")), Some(FileKind::Excel));
        assert!(!is_supported(Path::new("data.txt")));
        assert!(!is_supported(Path::new("data")));
    }

    #[test]
    fn whole_file_is_named_after_stem() {
        let path = Path::new("/tmp/regions.csv");
        assert_eq!(SheetRef::WholeFile.display_name(path), "regions");
        assert_eq!(SheetRef::Named("Рис 1".into()).display_name(path), "Рис 1");
    }

    #[test]
    fn loads_csv_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Region,x,2024,2023,2022").unwrap();
        writeln!(file, "North, ,12.5,,7").unwrap();
        writeln!(file, "South,n/a").unwrap();
        drop(file);

        let grid = load_grid(&path, &SheetRef::WholeFile).unwrap();
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.get(0, 2), &Cell::Number(2024.0));
        assert_eq!(grid.get(1, 0), &Cell::Text("North".into()));
        assert_eq!(grid.get(1, 1), &Cell::Empty);
        assert_eq!(grid.get(1, 2), &Cell::Number(12.5));
        assert_eq!(grid.get(1, 3), &Cell::Empty);
        assert_eq!(grid.get(2, 1), &Cell::Text("n/a".into()));
        // Short rows read as empty past their end.
        assert_eq!(grid.get(2, 4), &Cell::Empty);
        assert_eq!(grid.get(99, 0), &Cell::Empty);
    }

    #[test]
    fn csv_falls_back_to_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        std::fs::write(&path, b"Caf\xe9,1,2\n").unwrap();
        let grid = load_grid(&path, &SheetRef::WholeFile).unwrap();
        assert_eq!(grid.get(0, 0), &Cell::Text("Café".into()));
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(Cell::Number(2022.0).text(), "2022");
        assert_eq!(Cell::Number(2.5).text(), "2.5");
        assert_eq!(Cell::Empty.text(), "");
    }
}
