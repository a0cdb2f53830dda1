use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::ConfigError;
use crate::processing::selection::QualificationPolicy;

/// Name of the parameter file looked up in the working directory.
pub const PARAMETERS_FILE: &str = "parameters.txt";

/// Chart generation options read from `parameters.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartParams {
    /// Outlier coefficient `k` in `mean + k * stddev`.
    pub standard_deviation: f64,
    /// Annotate clipped and off-scale bars with their true value.
    pub show_original_values: bool,
    /// `true` for vertical bars, `false` for horizontal bars.
    pub orientation: bool,
    /// Figure width in inches.
    pub width: f64,
    /// Figure height in inches.
    pub height: f64,
    /// Process only the Nth valid sheet (1-based). 0 processes all.
    pub number: usize,
    pub dpi: u32,
    pub qualification: QualificationPolicy,
    /// Substring a sheet name must contain to be considered.
    pub sheet_marker: String,
}

impl Default for ChartParams {
    fn default() -> Self {
        Self {
            standard_deviation: 4.0,
            show_original_values: true,
            orientation: true,
            width: 10.0,
            height: 6.0,
            number: 0,
            dpi: 200,
            qualification: QualificationPolicy::default(),
            sheet_marker: "Рис".to_string(),
        }
    }
}

impl ChartParams {
    /// Load parameters from a file, falling back to defaults when it is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!("Parameter file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse `key=value` lines. Blank lines and `#` comments are skipped;
    /// unknown keys are ignored.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut map = Map::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Syntax {
                line: idx + 1,
                text: raw.to_string(),
            })?;
            map.insert(key.trim().to_string(), coerce_value(value.trim()));
        }
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Pixel dimensions of the rendered figure.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi);
        (
            (self.width * dpi).round().max(0.0) as u32,
            (self.height * dpi).round().max(0.0) as u32,
        )
    }
}

/// Turn a raw parameter value into the most specific JSON value it reads as.
fn coerce_value(value: &str) -> Value {
    match value.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = value.parse::<u64>() {
        return Value::from(i);
    }
    if let Ok(i) = value.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_known_keys() {
        let params = ChartParams::parse(
            "standard_deviation=3.5\nshow_original_values=False\norientation=false\nwidth=12\nheight=7.5\nnumber=2\n",
        )
        .unwrap();
        assert_eq!(params.standard_deviation, 3.5);
        assert!(!params.show_original_values);
        assert!(!params.orientation);
        assert_eq!(params.width, 12.0);
        assert_eq!(params.height, 7.5);
        assert_eq!(params.number, 2);
        assert_eq!(params.dpi, 200);
    }

    #[test]
    fn integer_coefficient_reads_as_float() {
        let params = ChartParams::parse("standard_deviation=4").unwrap();
        assert_eq!(params.standard_deviation, 4.0);
    }

    #[test]
    fn unknown_keys_and_comments_are_ignored() {
        let params = ChartParams::parse("# comment\n\ncolour=red\nwidth=8\n").unwrap();
        assert_eq!(params.width, 8.0);
        assert_eq!(params.height, 6.0);
    }

    #[test]
    fn qualification_policy_is_configurable() {
        let params = ChartParams::parse("qualification=at_least_two_or_c").unwrap();
        assert_eq!(params.qualification, QualificationPolicy::AtLeastTwoOrSeriesC);
    }

    #[test]
    fn missing_separator_is_a_syntax_error() {
        let err = ChartParams::parse("width=3\norientation\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 2, .. }));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = ChartParams::parse("show_original_values=maybe").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let params = ChartParams::load_or_default(&dir.path().join(PARAMETERS_FILE)).unwrap();
        assert_eq!(params, ChartParams::default());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PARAMETERS_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "number=1").unwrap();
        writeln!(file, "dpi=100").unwrap();
        let params = ChartParams::load_or_default(&path).unwrap();
        assert_eq!(params.number, 1);
        assert_eq!(params.pixel_size(), (1000, 600));
    }
}
