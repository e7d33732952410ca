//! ASCII chart rendering
//!
//! All charts draw into a fixed 80x25 character canvas and emit their lines
//! through the output channel, so tests can assert on captured text. Data
//! coordinates map linearly onto the canvas; flat ranges get a synthetic
//! spread so a constant series still renders.

use crate::output::Output;
use crate::value::{format_number, RuntimeError};

const WIDTH: usize = 80;
const HEIGHT: usize = 25;
const BAR_WIDTH: usize = 60;
const POINT: char = '●';
const BAR: char = '█';

struct Canvas {
    cells: Vec<Vec<char>>,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

fn bounds(values: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min == max {
        // Flat series: pad so the transform stays finite.
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

impl Canvas {
    fn new(x: &[f64], y: &[f64]) -> Canvas {
        let (x_min, x_max) = bounds(x);
        let (y_min, y_max) = bounds(y);
        Canvas {
            cells: vec![vec![' '; WIDTH]; HEIGHT],
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Maps a data point to a cell; y grows upward, rows grow downward.
    fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        let col = (x - self.x_min) / (self.x_max - self.x_min) * (WIDTH - 1) as f64;
        let row = (y - self.y_min) / (self.y_max - self.y_min) * (HEIGHT - 1) as f64;
        (
            (col.round() as usize).min(WIDTH - 1),
            HEIGHT - 1 - (row.round() as usize).min(HEIGHT - 1),
        )
    }

    fn mark(&mut self, x: f64, y: f64, glyph: char) {
        let (col, row) = self.cell(x, y);
        self.cells[row][col] = glyph;
    }

    /// Bresenham segment between two data points.
    fn segment(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, glyph: char) {
        let (c0, r0) = self.cell(x0, y0);
        let (c1, r1) = self.cell(x1, y1);
        let (mut col, mut row) = (c0 as i64, r0 as i64);
        let (end_col, end_row) = (c1 as i64, r1 as i64);
        let d_col = (end_col - col).abs();
        let d_row = -(end_row - row).abs();
        let step_col = if col < end_col { 1 } else { -1 };
        let step_row = if row < end_row { 1 } else { -1 };
        let mut error = d_col + d_row;
        loop {
            self.cells[row as usize][col as usize] = glyph;
            if col == end_col && row == end_row {
                break;
            }
            let doubled = 2 * error;
            if doubled >= d_row {
                error += d_row;
                col += step_col;
            }
            if doubled <= d_col {
                error += d_col;
                row += step_row;
            }
        }
    }

    fn emit(self, out: &mut Output, title: &str) {
        emit_title(out, title);
        for row in self.cells {
            out.line(row.into_iter().collect::<String>());
        }
        out.line("=".repeat(WIDTH));
        out.line(format!(
            "x: [{}, {}]  y: [{}, {}]",
            format_number(self.x_min),
            format_number(self.x_max),
            format_number(self.y_min),
            format_number(self.y_max)
        ));
    }
}

fn emit_title(out: &mut Output, title: &str) {
    out.line("=".repeat(WIDTH));
    out.line(format!("{title:^WIDTH$}"));
    out.line("=".repeat(WIDTH));
}

fn check_series(x: &[f64], y: &[f64]) -> Result<(), RuntimeError> {
    if x.is_empty() {
        return Err(RuntimeError::DimensionMismatch(
            "nothing to plot".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(RuntimeError::DimensionMismatch(format!(
            "{} x values but {} y values",
            x.len(),
            y.len()
        )));
    }
    Ok(())
}

/// Connected line chart: consecutive points joined by segments.
pub fn line(out: &mut Output, x: &[f64], y: &[f64], title: &str) -> Result<(), RuntimeError> {
    check_series(x, y)?;
    let mut canvas = Canvas::new(x, y);
    for window in x.iter().zip(y).collect::<Vec<_>>().windows(2) {
        let (&x0, &y0) = window[0];
        let (&x1, &y1) = window[1];
        canvas.segment(x0, y0, x1, y1, POINT);
    }
    if x.len() == 1 {
        canvas.mark(x[0], y[0], POINT);
    }
    canvas.emit(out, title);
    Ok(())
}

/// Unconnected point chart.
pub fn scatter(out: &mut Output, x: &[f64], y: &[f64], title: &str) -> Result<(), RuntimeError> {
    check_series(x, y)?;
    let mut canvas = Canvas::new(x, y);
    for (&px, &py) in x.iter().zip(y) {
        canvas.mark(px, py, POINT);
    }
    canvas.emit(out, title);
    Ok(())
}

/// Horizontal bar chart, one labeled row per value. Bars scale to the
/// largest magnitude; zero/negative values render as empty bars.
pub fn bar(
    out: &mut Output,
    labels: &[String],
    values: &[f64],
    title: &str,
) -> Result<(), RuntimeError> {
    if labels.is_empty() {
        return Err(RuntimeError::DimensionMismatch(
            "nothing to plot".to_string(),
        ));
    }
    if labels.len() != values.len() {
        return Err(RuntimeError::DimensionMismatch(format!(
            "{} labels but {} values",
            labels.len(),
            values.len()
        )));
    }

    let label_width = labels.iter().map(String::len).max().unwrap_or(0);
    let peak = values.iter().cloned().fold(0.0f64, f64::max);

    emit_title(out, title);
    for (label, &value) in labels.iter().zip(values) {
        let length = if peak > 0.0 && value > 0.0 {
            ((value / peak) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        out.line(format!(
            "{label:<label_width$} | {} {}",
            BAR.to_string().repeat(length),
            format_number(value)
        ));
    }
    out.line("=".repeat(WIDTH));
    Ok(())
}

/// Frequency histogram: values binned into `bins` equal intervals, drawn as
/// a bar chart of counts with `[lo, hi)` interval labels.
pub fn histogram(
    out: &mut Output,
    data: &[f64],
    bins: usize,
    title: &str,
) -> Result<(), RuntimeError> {
    if data.is_empty() {
        return Err(RuntimeError::DimensionMismatch(
            "nothing to plot".to_string(),
        ));
    }
    if bins == 0 {
        return Err(RuntimeError::DimensionMismatch(
            "histogram needs at least one bin".to_string(),
        ));
    }

    let (min, max) = bounds(data);
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in data {
        let bin = (((v - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    let labels: Vec<String> = (0..bins)
        .map(|b| {
            format!(
                "[{:.2}, {:.2})",
                min + b as f64 * width,
                min + (b + 1) as f64 * width
            )
        })
        .collect();
    let values: Vec<f64> = counts.into_iter().map(|c| c as f64).collect();
    bar(out, &labels, &values, title)
}

/// Scatter of the samples with the least-squares line drawn through them.
/// Returns the fitted (slope, intercept).
pub fn regression(
    out: &mut Output,
    x: &[f64],
    y: &[f64],
    title: &str,
) -> Result<(f64, f64), RuntimeError> {
    check_series(x, y)?;
    if x.len() < 2 {
        return Err(RuntimeError::DimensionMismatch(
            "regression plot needs at least two points".to_string(),
        ));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (&px, &py) in x.iter().zip(y) {
        covariance += (px - mean_x) * (py - mean_y);
        variance += (px - mean_x) * (px - mean_x);
    }
    if variance == 0.0 {
        return Err(RuntimeError::SingularMatrix);
    }
    let slope = covariance / variance;
    let intercept = mean_y - slope * mean_x;

    let fitted: Vec<f64> = x.iter().map(|&px| slope * px + intercept).collect();
    let mut all_y = y.to_vec();
    all_y.extend_from_slice(&fitted);
    let x_doubled: Vec<f64> = x.iter().chain(x).copied().collect();

    let mut canvas = Canvas::new(&x_doubled, &all_y);
    let (x_lo, x_hi) = bounds(x);
    canvas.segment(x_lo, slope * x_lo + intercept, x_hi, slope * x_hi + intercept, '-');
    for (&px, &py) in x.iter().zip(y) {
        canvas.mark(px, py, POINT);
    }
    canvas.emit(out, title);
    out.line(format!(
        "fit: y = {}x + {}",
        format_number(slope),
        format_number(intercept)
    ));
    Ok((slope, intercept))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(f: impl FnOnce(&mut Output)) -> Vec<String> {
        let mut out = Output::capture();
        f(&mut out);
        out.lines().to_vec()
    }

    #[test]
    fn line_chart_has_title_canvas_and_bounds() {
        let lines = captured(|out| {
            line(out, &[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0], "growth").unwrap();
        });
        // 3 title lines + 25 canvas rows + rule + bounds footer.
        assert_eq!(lines.len(), 3 + HEIGHT + 2);
        assert!(lines[1].contains("growth"));
        assert_eq!(lines.last().unwrap(), "x: [0, 2]  y: [0, 4]");
        assert!(lines.iter().any(|l| l.contains(POINT)));
    }

    #[test]
    fn scatter_marks_every_point() {
        let lines = captured(|out| {
            scatter(out, &[0.0, 5.0], &[0.0, 5.0], "points").unwrap();
        });
        let marks: usize = lines.iter().map(|l| l.matches(POINT).count()).sum();
        assert_eq!(marks, 2);
    }

    #[test]
    fn flat_series_still_renders() {
        let lines = captured(|out| {
            line(out, &[0.0, 1.0], &[3.0, 3.0], "flat").unwrap();
        });
        assert_eq!(lines.last().unwrap(), "x: [0, 1]  y: [2, 4]");
    }

    #[test]
    fn bar_chart_scales_to_largest_value() {
        let lines = captured(|out| {
            bar(
                out,
                &["a".to_string(), "b".to_string()],
                &[30.0, 60.0],
                "counts",
            )
            .unwrap();
        });
        let bar_a = lines.iter().find(|l| l.starts_with('a')).unwrap();
        let bar_b = lines.iter().find(|l| l.starts_with('b')).unwrap();
        assert_eq!(bar_a.matches(BAR).count(), BAR_WIDTH / 2);
        assert_eq!(bar_b.matches(BAR).count(), BAR_WIDTH);
        assert!(bar_b.ends_with("60"));
    }

    #[test]
    fn histogram_counts_values_into_bins() {
        let data = vec![0.0, 0.1, 0.2, 0.9, 1.0];
        let lines = captured(|out| {
            histogram(out, &data, 2, "dist").unwrap();
        });
        // First bin holds three values, second holds two.
        let rows: Vec<&String> = lines.iter().filter(|l| l.contains('|')).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with('3'));
        assert!(rows[1].ends_with('2'));
    }

    #[test]
    fn regression_recovers_the_fit() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let (slope, intercept) = captured_fit(&x, &y);
        assert!((slope - 2.0).abs() < 1e-9);
        assert!((intercept - 1.0).abs() < 1e-9);
    }

    fn captured_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
        let mut out = Output::capture();
        regression(&mut out, x, y, "fit").unwrap()
    }

    #[test]
    fn regression_rejects_vertical_data() {
        let mut out = Output::capture();
        let result = regression(&mut out, &[1.0, 1.0], &[0.0, 5.0], "fit");
        assert_eq!(result, Err(RuntimeError::SingularMatrix));
    }

    #[test]
    fn mismatched_series_are_rejected() {
        let mut out = Output::capture();
        assert!(line(&mut out, &[1.0], &[1.0, 2.0], "t").is_err());
        assert!(scatter(&mut out, &[], &[], "t").is_err());
    }
}
