/// Headroom above the tallest bar before choosing ticks.
const AXIS_MARGIN: f64 = 0.05;

/// Pick a tick step of 1, 2, 2.5 or 5 times a power of ten that splits
/// `span` into at most `max_ticks` intervals.
fn nice_step(span: f64, max_ticks: usize) -> f64 {
    let raw = span / max_ticks.max(1) as f64;
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude)
}

/// Ticks of a value axis that starts at 0 and shows bars up to `max_value`.
///
/// The list ends at the first tick at or above the padded top of the axis,
/// so the second-to-last tick is the highest gridline inside the plot.
pub fn nice_ticks(max_value: f64, max_ticks: usize) -> Vec<f64> {
    let top = max_value.max(0.0) * (1.0 + AXIS_MARGIN);
    if top <= 0.0 || !top.is_finite() {
        return vec![0.0, 1.0];
    }
    let step = nice_step(top, max_ticks);
    let mut ticks = vec![0.0];
    let mut i = 1usize;
    loop {
        let tick = step * i as f64;
        ticks.push(tick);
        if tick >= top {
            break;
        }
        i += 1;
    }
    ticks
}

/// Highest labelled gridline of the value axis, truncated to an integer.
/// Bars taller than this get their value printed.
pub fn axis_near_max(ticks: &[f64]) -> f64 {
    if ticks.len() >= 2 {
        ticks[ticks.len() - 2].trunc()
    } else {
        0.0
    }
}

/// Integer part of `value` with spaces between thousands: `1 234 567`.
pub fn format_thousands(value: f64) -> String {
    let int = value.trunc() as i64;
    let digits = int.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if int < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_cover_padded_maximum() {
        let ticks = nice_ticks(100.0, 8);
        assert_eq!(ticks.first(), Some(&0.0));
        assert!(*ticks.last().unwrap() >= 105.0);
        assert_eq!(ticks, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 120.0]);
        assert_eq!(axis_near_max(&ticks), 100.0);
    }

    #[test]
    fn near_max_truncates() {
        let ticks = nice_ticks(3.0, 8);
        assert_eq!(ticks, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5]);
        assert_eq!(axis_near_max(&ticks), 3.0);
        assert_eq!(axis_near_max(&[0.0, 0.5, 1.0]), 0.0);
        assert_eq!(axis_near_max(&[5.0]), 0.0);
    }

    #[test]
    fn zero_data_still_has_an_axis() {
        assert_eq!(nice_ticks(0.0, 8), vec![0.0, 1.0]);
    }

    #[test]
    fn thousands_use_spaces() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.9), "999");
        assert_eq!(format_thousands(1234.0), "1 234");
        assert_eq!(format_thousands(1_234_567.0), "1 234 567");
        assert_eq!(format_thousands(-45_000.0), "-45 000");
    }
}
