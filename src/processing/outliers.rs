//! Outlier suppression for grouped bar charts.
//!
//! Each series gets an outlier threshold `mean + k * stddev` computed over
//! its non-zero values in qualifying rows. The tallest value that stays
//! within its own series' threshold becomes a ceiling shared by all three
//! series; outliers above that ceiling are drawn at the ceiling and flagged
//! so the renderer can mark the cut and print the true value.

use serde::Serialize;

use crate::error::PipelineError;
use crate::processing::selection::{FilteredRows, QualificationPolicy};
use crate::processing::statistics::SeriesStats;
use crate::state::series::SeriesSlot;

pub const DEFAULT_COEFFICIENT: f64 = 4.0;

/// Height a bar is drawn at, and whether it was cut down to get there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdjustedValue {
    pub displayed_height: f64,
    pub was_clipped: bool,
}

/// Fit `value` under the shared ceiling if it is an outlier of its series.
pub fn adjust(value: f64, threshold: f64, ceiling: f64) -> AdjustedValue {
    if value > threshold && value > ceiling {
        AdjustedValue { displayed_height: ceiling, was_clipped: true }
    } else {
        AdjustedValue { displayed_height: value, was_clipped: false }
    }
}

/// Whether the true value of a bar should be printed next to it.
///
/// That is the case for clipped bars, and for any bar taller than the axis'
/// highest labelled gridline (`axis_near_max`), which the renderer owns.
pub fn is_annotated(value: f64, threshold: f64, ceiling: f64, axis_near_max: f64) -> bool {
    (value > threshold && value > ceiling) || value > axis_near_max
}

/// One series after clipping.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedSeries {
    pub slot: SeriesSlot,
    pub raw: Vec<f64>,
    pub adjusted: Vec<AdjustedValue>,
    pub stats: SeriesStats,
    pub threshold: f64,
}

impl ClippedSeries {
    pub fn mean(&self) -> f64 {
        self.stats.mean
    }

    pub fn clipped_count(&self) -> usize {
        self.adjusted.iter().filter(|a| a.was_clipped).count()
    }

    pub fn annotated(&self, idx: usize, ceiling: f64, axis_near_max: f64) -> bool {
        is_annotated(self.raw[idx], self.threshold, ceiling, axis_near_max)
    }

    /// Largest value of this series that is not an outlier.
    fn max_within_threshold(&self) -> f64 {
        self.raw
            .iter()
            .copied()
            .filter(|v| *v <= self.threshold)
            .fold(0.0, f64::max)
    }
}

/// A sheet ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedChart {
    pub labels: Vec<String>,
    pub series: [ClippedSeries; 3],
    pub ceiling: f64,
}

impl ClippedChart {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn series(&self, slot: SeriesSlot) -> &ClippedSeries {
        &self.series[slot.index()]
    }

    /// Tallest drawn bar across all series.
    pub fn max_displayed(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.adjusted.iter().map(|a| a.displayed_height))
            .fold(0.0, f64::max)
    }
}

/// Computes thresholds and the shared ceiling for a set of filtered rows.
#[derive(Debug, Clone, Copy)]
pub struct OutlierClipper {
    coefficient: f64,
    policy: QualificationPolicy,
}

impl Default for OutlierClipper {
    fn default() -> Self {
        Self::new(DEFAULT_COEFFICIENT, QualificationPolicy::default())
    }
}

impl OutlierClipper {
    pub fn new(coefficient: f64, policy: QualificationPolicy) -> Self {
        Self { coefficient, policy }
    }

    /// Statistics for one series over its non-zero values in qualifying rows.
    pub fn series_stats(
        &self,
        rows: &FilteredRows,
        slot: SeriesSlot,
    ) -> Result<SeriesStats, PipelineError> {
        let values = rows.values(slot);
        let contributing = (0..rows.len())
            .filter(|&i| self.policy.qualifies(&rows.row(i)))
            .map(|i| values[i])
            .filter(|v| *v != 0.0);
        SeriesStats::compute(contributing).ok_or(PipelineError::DegenerateSeries(slot))
    }

    pub fn clip(&self, rows: &FilteredRows) -> Result<ClippedChart, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::EmptySeries);
        }

        let stats = [
            self.series_stats(rows, SeriesSlot::A)?,
            self.series_stats(rows, SeriesSlot::B)?,
            self.series_stats(rows, SeriesSlot::C)?,
        ];

        let mut series = SeriesSlot::ALL.map(|slot| {
            let stats = stats[slot.index()].clone();
            ClippedSeries {
                slot,
                raw: rows.values(slot).to_vec(),
                adjusted: Vec::new(),
                threshold: stats.mean + self.coefficient * stats.std_dev,
                stats,
            }
        });

        let ceiling = series
            .iter()
            .map(ClippedSeries::max_within_threshold)
            .fold(0.0, f64::max);

        for s in series.iter_mut() {
            s.adjusted = s.raw.iter().map(|&v| adjust(v, s.threshold, ceiling)).collect();
            tracing::debug!(
                "{} threshold={:.3} clipped={}",
                s.stats.report(s.slot.label()),
                s.threshold,
                s.clipped_count()
            );
        }

        Ok(ClippedChart {
            labels: rows.labels.clone(),
            series,
            ceiling,
        })
    }
}
