use crate::history_chart::ProgressSeries;

/// X (run index) and Y (WPM) upper bounds for the progress chart.
/// A single run still gets a visible x range.
pub fn compute_chart_bounds(series: &ProgressSeries) -> (f64, f64) {
    let x_max = series.len().max(2) as f64;
    // ~10% headroom above the best run
    let top = series.max_wpm().max(1);
    let y_max = (top + top.div_ceil(10)) as f64;
    (x_max, y_max)
}

/// First and last date labels for the x axis
pub fn x_axis_labels(series: &ProgressSeries) -> (String, String) {
    let first = series.labels.first().cloned().unwrap_or_default();
    let last = series.labels.last().cloned().unwrap_or_default();
    (first, last)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
