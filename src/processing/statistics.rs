use serde::Serialize;

/// Summary statistics over the contributing values of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation (divisor N).
    pub std_dev: f64,
}

impl SeriesStats {
    /// Compute statistics from the given values, ignoring non-finite entries.
    /// Returns `None` when nothing remains.
    pub fn compute(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let vals: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return None;
        }

        let count = vals.len();
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = vals.iter().sum::<f64>() / count as f64;

        let variance = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let std_dev = variance.sqrt();

        Some(SeriesStats {
            count,
            min,
            max,
            mean,
            std_dev,
        })
    }

    /// Format as a one-line report string.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}: n={} min={:.3} max={:.3} mean={:.3} std={:.3}",
            label, self.count, self.min, self.max, self.mean, self.std_dev
        )
    }
}
