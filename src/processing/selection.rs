use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::state::series::SeriesSlot;

/// One labelled category with a value per series. A value of 0 means
/// "no data" for that series.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub label: String,
    pub series: [f64; 3],
}

impl CategoryRow {
    pub fn new(label: impl Into<String>, series: [f64; 3]) -> Self {
        Self { label: label.into(), series }
    }
}

fn count_non_zero(series: &[f64; 3]) -> usize {
    series.iter().filter(|v| **v != 0.0).count()
}

/// Rule deciding which rows take part in a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualificationPolicy {
    /// At least two of the three series carry data.
    #[default]
    #[serde(rename = "at_least_two")]
    AtLeastTwo,
    /// At least two series carry data, or series C alone does.
    #[serde(rename = "at_least_two_or_c")]
    AtLeastTwoOrSeriesC,
}

impl QualificationPolicy {
    pub fn qualifies(&self, series: &[f64; 3]) -> bool {
        let enough = count_non_zero(series) > 1;
        match self {
            QualificationPolicy::AtLeastTwo => enough,
            QualificationPolicy::AtLeastTwoOrSeriesC => {
                enough || series[SeriesSlot::C.index()] != 0.0
            }
        }
    }
}

/// Qualifying rows in chart order, as parallel label/value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRows {
    pub labels: Vec<String>,
    pub series: [Vec<f64>; 3],
}

impl FilteredRows {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn values(&self, slot: SeriesSlot) -> &[f64] {
        &self.series[slot.index()]
    }

    /// The three values of row `idx`, in slot order.
    pub fn row(&self, idx: usize) -> [f64; 3] {
        [self.series[0][idx], self.series[1][idx], self.series[2][idx]]
    }
}

/// Drop rows that fail `policy` and order the rest by their series C value.
///
/// The sort is stable: rows with equal series C values keep their input
/// order. Fails with [`PipelineError::EmptySeries`] when nothing qualifies.
pub fn select_rows(
    rows: &[CategoryRow],
    policy: QualificationPolicy,
) -> Result<FilteredRows, PipelineError> {
    let mut kept: Vec<&CategoryRow> = rows
        .iter()
        .filter(|row| policy.qualifies(&row.series))
        .collect();

    if kept.is_empty() {
        return Err(PipelineError::EmptySeries);
    }

    let c = SeriesSlot::C.index();
    kept.sort_by(|a, b| a.series[c].total_cmp(&b.series[c]));

    let mut out = FilteredRows {
        labels: Vec::with_capacity(kept.len()),
        series: [
            Vec::with_capacity(kept.len()),
            Vec::with_capacity(kept.len()),
            Vec::with_capacity(kept.len()),
        ],
    };
    for row in kept {
        out.labels.push(row.label.clone());
        for (column, value) in out.series.iter_mut().zip(row.series) {
            column.push(value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(label: &str, series: [f64; 3]) -> CategoryRow {
        CategoryRow::new(label, series)
    }

    #[test]
    fn drops_single_series_rows_and_sorts_by_series_c() {
        let rows = vec![
            row("R1", [10.0, 0.0, 12.0]),
            row("R2", [5.0, 6.0, 7.0]),
            row("R3", [0.0, 0.0, 1.0]),
        ];
        let out = select_rows(&rows, QualificationPolicy::AtLeastTwo).unwrap();
        assert_eq!(out.labels, vec!["R2", "R1"]);
        assert_eq!(out.values(SeriesSlot::A), &[5.0, 10.0]);
        assert_eq!(out.values(SeriesSlot::B), &[6.0, 0.0]);
        assert_eq!(out.values(SeriesSlot::C), &[7.0, 12.0]);
    }

    #[test]
    fn series_c_exemption_keeps_c_only_rows() {
        let rows = vec![
            row("R1", [10.0, 0.0, 12.0]),
            row("R3", [0.0, 0.0, 1.0]),
            row("R4", [3.0, 0.0, 0.0]),
        ];
        let out = select_rows(&rows, QualificationPolicy::AtLeastTwoOrSeriesC).unwrap();
        assert_eq!(out.labels, vec!["R3", "R1"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let rows = vec![
            row("first", [1.0, 1.0, 5.0]),
            row("low", [1.0, 1.0, 2.0]),
            row("second", [2.0, 2.0, 5.0]),
            row("third", [3.0, 0.0, 5.0]),
        ];
        let out = select_rows(&rows, QualificationPolicy::AtLeastTwo).unwrap();
        assert_eq!(out.labels, vec!["low", "first", "second", "third"]);
    }

    #[test]
    fn nothing_qualifying_is_empty_series() {
        let rows = vec![row("a", [0.0, 0.0, 0.0]), row("b", [0.0, 4.0, 0.0])];
        assert_eq!(
            select_rows(&rows, QualificationPolicy::AtLeastTwo),
            Err(PipelineError::EmptySeries)
        );
        assert_eq!(
            select_rows(&[], QualificationPolicy::AtLeastTwoOrSeriesC),
            Err(PipelineError::EmptySeries)
        );
    }

    fn arb_rows() -> impl Strategy<Value = Vec<CategoryRow>> {
        let value = prop_oneof![Just(0.0), 0.0f64..1000.0, (0u8..5).prop_map(f64::from)].boxed();
        prop::collection::vec([value.clone(), value.clone(), value], 0..40).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, series)| CategoryRow::new(format!("row{i}"), series))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn output_never_contains_all_zero_rows(rows in arb_rows()) {
            for policy in [QualificationPolicy::AtLeastTwo, QualificationPolicy::AtLeastTwoOrSeriesC] {
                if let Ok(out) = select_rows(&rows, policy) {
                    for i in 0..out.len() {
                        prop_assert!(count_non_zero(&out.row(i)) > 0);
                        prop_assert!(policy.qualifies(&out.row(i)));
                    }
                }
            }
        }

        #[test]
        fn output_is_stably_sorted_by_series_c(rows in arb_rows()) {
            if let Ok(out) = select_rows(&rows, QualificationPolicy::AtLeastTwo) {
                let c = out.values(SeriesSlot::C);
                let position = |label: &str| rows.iter().position(|r| r.label == label).unwrap();
                for i in 1..out.len() {
                    prop_assert!(c[i - 1] <= c[i]);
                    if c[i - 1] == c[i] {
                        prop_assert!(position(&out.labels[i - 1]) < position(&out.labels[i]));
                    }
                }
            }
        }

        #[test]
        fn columns_stay_aligned(rows in arb_rows()) {
            if let Ok(out) = select_rows(&rows, QualificationPolicy::AtLeastTwoOrSeriesC) {
                for column in &out.series {
                    prop_assert_eq!(column.len(), out.labels.len());
                }
            }
        }
    }
}
