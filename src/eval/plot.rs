//! Text plots for evaluation results.
//!
//! Plots render to plain text so they can be printed in a terminal, written
//! to a report file, or snapshot-tested.

use std::fmt;

use super::metrics::{ConfusionMatrix, PrCurve, RocCurve};

const CANVAS_WIDTH: usize = 50;
const CANVAS_HEIGHT: usize = 16;

/// Intensity ramp for confusion matrix cells drawn without values.
const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// What a [`Plot`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    /// Confusion matrix heat table
    ConfusionMatrix,
    /// Precision-recall curve
    PrCurve,
    /// ROC curve
    RocCurve,
}

/// A rendered plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    /// Plot kind.
    pub kind: PlotKind,
    /// Title line.
    pub title: String,
    /// Legend label (e.g. `AP = 0.83`).
    pub label: Option<String>,
    body: String,
}

impl Plot {
    /// Confusion matrix table. Cells show counts when `include_values` is
    /// set, otherwise a shade proportional to the count.
    pub fn confusion_matrix(cm: &ConfusionMatrix, include_values: bool) -> Self {
        let max = cm.counts.iter().flatten().copied().max().unwrap_or(0);
        let cell_width = cm
            .labels
            .iter()
            .map(|l| l.chars().count())
            .chain(std::iter::once(max.to_string().len()))
            .max()
            .unwrap_or(1)
            .max(3);
        let row_header = cm
            .labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max("truth".len());

        let mut body = format!("{:>w$} |", "truth", w = row_header);
        for label in &cm.labels {
            body.push_str(&format!(" {:>w$}", label, w = cell_width));
        }
        body.push('\n');
        body.push_str(&"-".repeat(row_header + 1));
        body.push('+');
        body.push_str(&"-".repeat((cell_width + 1) * cm.labels.len()));
        body.push('\n');

        for (label, row) in cm.labels.iter().zip(&cm.counts) {
            body.push_str(&format!("{:>w$} |", label, w = row_header));
            for &count in row {
                let cell = if include_values {
                    count.to_string()
                } else {
                    shade(count, max).to_string()
                };
                body.push_str(&format!(" {:>w$}", cell, w = cell_width));
            }
            body.push('\n');
        }
        body.push_str(&format!("{:>w$}   (columns: predicted)\n", "", w = row_header));

        Self {
            kind: PlotKind::ConfusionMatrix,
            title: "Confusion matrix".to_string(),
            label: None,
            body,
        }
    }

    /// Precision-recall curve labelled with the average precision.
    pub fn pr_curve(curve: &PrCurve, average_precision: f64) -> Self {
        let points: Vec<(f64, f64)> = curve
            .recall
            .iter()
            .copied()
            .zip(curve.precision.iter().copied())
            .collect();
        let label = format!("AP = {:.2}", average_precision);
        Self {
            kind: PlotKind::PrCurve,
            title: "Precision-recall curve".to_string(),
            body: render_curve(&points, "Recall", "Precision", &label),
            label: Some(label),
        }
    }

    /// ROC curve labelled with the area under the curve.
    pub fn roc_curve(curve: &RocCurve) -> Self {
        let points: Vec<(f64, f64)> = curve
            .fpr
            .iter()
            .copied()
            .zip(curve.tpr.iter().copied())
            .collect();
        let label = format!("AUC = {:.2}", curve.auc());
        Self {
            kind: PlotKind::RocCurve,
            title: "ROC curve".to_string(),
            body: render_curve(&points, "False Positive Rate", "True Positive Rate", &label),
            label: Some(label),
        }
    }

    /// Full text of the plot, title included.
    pub fn render(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}

impl fmt::Display for Plot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn shade(count: usize, max: usize) -> char {
    if max == 0 || count == 0 {
        return SHADES[0];
    }
    let idx = (count as f64 / max as f64 * (SHADES.len() - 1) as f64).round() as usize;
    SHADES[idx.clamp(1, SHADES.len() - 1)]
}

/// Draw a polyline through `points` (both axes in `[0, 1]`).
fn render_curve(points: &[(f64, f64)], x_label: &str, y_label: &str, legend: &str) -> String {
    let mut canvas = vec![vec![' '; CANVAS_WIDTH]; CANVAS_HEIGHT];
    let to_cell = |x: f64, y: f64| -> (usize, usize) {
        let col = (x.clamp(0.0, 1.0) * (CANVAS_WIDTH - 1) as f64).round() as usize;
        let row = ((1.0 - y.clamp(0.0, 1.0)) * (CANVAS_HEIGHT - 1) as f64).round() as usize;
        (col, row)
    };

    let finite: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    for pair in finite.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let steps = CANVAS_WIDTH.max(CANVAS_HEIGHT) * 2;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let (col, row) = to_cell(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
            canvas[row][col] = '*';
        }
    }
    if let [(x, y)] = finite.as_slice() {
        let (col, row) = to_cell(*x, *y);
        canvas[row][col] = '*';
    }

    let mut out = format!("{}\n", y_label);
    for (row, cells) in canvas.iter().enumerate() {
        let tick = if row == 0 {
            "1.00"
        } else if row == CANVAS_HEIGHT / 2 {
            "0.50"
        } else if row == CANVAS_HEIGHT - 1 {
            "0.00"
        } else {
            ""
        };
        out.push_str(&format!("{:>4} |", tick));
        out.extend(cells.iter());
        out.push('\n');
    }
    out.push_str(&format!("     +{}\n", "-".repeat(CANVAS_WIDTH)));
    out.push_str(&format!(
        "     0.00{:>w$}\n",
        "1.00",
        w = CANVAS_WIDTH - 3
    ));
    out.push_str(&format!("{:^w$}\n", x_label, w = CANVAS_WIDTH + 6));
    out.push_str(&format!("[*] {}\n", legend));
    out
}
