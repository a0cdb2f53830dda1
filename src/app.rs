use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::data::loader::{self, SheetRef};
use crate::data::paths;
use crate::data::sheets::{self, LoadedSheet, SheetLayout};
use crate::error::{AppError, SheetError};
use crate::logging::ErrorLog;
use crate::processing::outliers::OutlierClipper;
use crate::processing::selection::select_rows;
use crate::render::bar_chart;
use crate::state::config::{ChartParams, PARAMETERS_FILE};
use crate::state::series::SeriesSlot;

pub const OUTPUT_DIR_BASE: &str = "Graphics";
pub const ERROR_LOG_STEM: &str = "errors";
pub const SUMMARY_FILE: &str = "summary.json";

/// Per-series figures reported for a rendered sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesReport {
    pub period: String,
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
    pub clipped: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SheetOutcome {
    Rendered {
        image: PathBuf,
        rows: usize,
        ceiling: f64,
        axis_near_max: f64,
        annotated: usize,
        series: Vec<SeriesReport>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: SheetOutcome,
}

/// Everything a run did, written to `summary.json` in the output directory.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub valid_sheets: Vec<String>,
    pub params: ChartParams,
    pub sheets: Vec<SheetReport>,
    /// Present when at least one failure was logged.
    pub error_log: Option<PathBuf>,
}

impl RunSummary {
    pub fn rendered_count(&self) -> usize {
        self.sheets
            .iter()
            .filter(|s| matches!(s.outcome, SheetOutcome::Rendered { .. }))
            .count()
    }
}

/// Use the command-line path if given, otherwise ask for one on stdin.
pub fn resolve_input(arg: Option<String>) -> io::Result<PathBuf> {
    if let Some(arg) = arg {
        return Ok(PathBuf::from(arg));
    }
    print!("Enter the name of the spreadsheet including its extension\n(if it is in the program's directory)\nor the full path to it: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(PathBuf::from(line.trim().trim_matches('"')))
}

/// Replace characters that cannot appear in file names.
fn file_name_for(sheet: &str) -> String {
    let cleaned: String = sheet
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    format!("{}.png", cleaned.trim())
}

fn describe(sheets: &[&LoadedSheet], input: &Path) -> String {
    match sheets {
        [only] if only.sheet == SheetRef::WholeFile => "CSV file".to_string(),
        _ => sheets
            .iter()
            .map(|s| s.sheet.display_name(input))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Filter, clip and render one sheet.
pub fn process_sheet(
    loaded: &LoadedSheet,
    name: &str,
    params: &ChartParams,
    output_dir: &Path,
) -> Result<SheetOutcome, SheetError> {
    let rows = select_rows(&loaded.table.rows, params.qualification)?;
    let chart = OutlierClipper::new(params.standard_deviation, params.qualification).clip(&rows)?;

    let image = output_dir.join(file_name_for(name));
    let rendered = bar_chart::render_sheet(&chart, &loaded.table.periods, params, &image)?;

    let series = SeriesSlot::ALL
        .iter()
        .map(|&slot| {
            let s = chart.series(slot);
            SeriesReport {
                period: loaded.table.period(slot).to_string(),
                mean: s.mean(),
                std_dev: s.stats.std_dev,
                threshold: s.threshold,
                clipped: s.clipped_count(),
            }
        })
        .collect();

    Ok(SheetOutcome::Rendered {
        image,
        rows: chart.len(),
        ceiling: chart.ceiling,
        axis_near_max: rendered.axis_near_max,
        annotated: rendered.annotated,
        series,
    })
}

/// Chart every valid sheet of `input`, writing into a fresh directory
/// under `work_dir`.
///
/// Only an unsupported input format (or an unusable working directory)
/// aborts the run; sheet failures are written to the error log.
pub fn run(input: &Path, work_dir: &Path) -> Result<RunSummary, AppError> {
    if !loader::is_supported(input) {
        return Err(AppError::InvalidFileFormat(input.to_path_buf()));
    }

    let mut errors = ErrorLog::new(paths::unique_log_path(work_dir, ERROR_LOG_STEM));
    let output_dir = paths::unique_dir(work_dir, OUTPUT_DIR_BASE)?;

    let params = match ChartParams::load_or_default(&work_dir.join(PARAMETERS_FILE)) {
        Ok(params) => params,
        Err(e) => {
            errors.record(&format!("Invalid {PARAMETERS_FILE}, using defaults: {e}"));
            ChartParams::default()
        }
    };
    let layout = SheetLayout::default();

    let valid = match sheets::valid_sheets(input, &params.sheet_marker, &layout, &mut errors) {
        Ok(valid) => valid,
        Err(e) => {
            errors.record(&format!("Cannot read {}: {e}", input.display()));
            Vec::new()
        }
    };
    if !valid.is_empty() {
        let all: Vec<&LoadedSheet> = valid.iter().collect();
        println!("All valid sheets: {}", describe(&all, input));
    }
    let valid_names: Vec<String> = valid
        .iter()
        .map(|s| s.sheet.display_name(input).to_string())
        .collect();

    let selected: Vec<&LoadedSheet> = match params.number {
        0 => valid.iter().collect(),
        n => match valid.get(n - 1) {
            Some(sheet) => vec![sheet],
            None => {
                errors.record(&format!(
                    "Sheet number {n} requested but only {} valid sheets exist",
                    valid.len()
                ));
                Vec::new()
            }
        },
    };

    let mut reports = Vec::with_capacity(selected.len());
    if selected.is_empty() {
        println!("No valid sheets to process.");
    } else {
        println!("Selected valid sheets: {}", describe(&selected, input));

        for loaded in selected {
            let name = loaded.sheet.display_name(input).to_string();
            let outcome = match process_sheet(loaded, &name, &params, &output_dir) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let msg = format!("Error processing sheet '{name}': {e}");
                    println!("{msg}");
                    errors.record(&msg);
                    SheetOutcome::Failed { error: e.to_string() }
                }
            };
            reports.push(SheetReport { name, outcome });
        }
    }

    let summary = RunSummary {
        input: input.to_path_buf(),
        output_dir: output_dir.clone(),
        valid_sheets: valid_names,
        params,
        sheets: reports,
        error_log: (errors.count() > 0).then(|| errors.path().to_path_buf()),
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => std::fs::write(output_dir.join(SUMMARY_FILE), json)?,
        Err(e) => tracing::error!("Failed to serialize run summary: {e}"),
    }

    println!(
        "Done: {} of {} selected sheets rendered into {:?}.",
        summary.rendered_count(),
        summary.sheets.len(),
        output_dir
    );
    Ok(summary)
}
