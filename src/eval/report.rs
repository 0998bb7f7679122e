//! Per-class classification report.
//!
//! # Example
//!
//! ```rust
//! use verdict::eval::report::ClassificationReport;
//!
//! let ytrue: Vec<String> = ["cat", "dog", "cat"].iter().map(|s| s.to_string()).collect();
//! let ypred: Vec<String> = ["cat", "cat", "dog"].iter().map(|s| s.to_string()).collect();
//! let labels = vec!["cat".to_string(), "dog".to_string()];
//!
//! let report = ClassificationReport::compute(&ytrue, &ypred, &labels);
//! assert_eq!(report.classes.len(), 2);
//! println!("{}", report.format(2));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::metrics::{self, Average};

/// Heading of the widest summary row, which sets the minimum name column width.
const WIDEST_HEADING: &str = "weighted avg";

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Class name or average heading.
    pub label: String,
    /// Precision
    pub precision: f64,
    /// Recall
    pub recall: f64,
    /// F1 score
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    /// Number of true samples
    pub support: usize,
}

/// Per-class precision / recall / F1 / support with summary rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// One row per requested class, in order.
    pub classes: Vec<ReportRow>,
    /// Overall accuracy, present when the classes cover every observed label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Micro average, present when `accuracy` is not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub micro_avg: Option<ReportRow>,
    /// Unweighted mean over classes.
    pub macro_avg: ReportRow,
    /// Support-weighted mean over classes.
    pub weighted_avg: ReportRow,
    /// Total support over the requested classes.
    pub total_support: usize,
}

impl ClassificationReport {
    /// Compute the report for `labels`. Zero divisions yield zero.
    pub fn compute(ytrue: &[String], ypred: &[String], labels: &[String]) -> Self {
        let scores = metrics::per_class_scores(ytrue, ypred, labels, 1.0);
        let total_support: usize = scores.iter().map(|s| s.support).sum();

        let classes = labels
            .iter()
            .zip(&scores)
            .map(|(label, s)| ReportRow {
                label: label.clone(),
                precision: s.precision,
                recall: s.recall,
                f1_score: s.fscore,
                support: s.support,
            })
            .collect();

        let averaged = |average: Average| {
            let (precision, recall, f1_score) =
                metrics::averaged_scores(ytrue, ypred, labels, average, 1.0);
            ReportRow {
                label: format!("{} avg", average),
                precision,
                recall,
                f1_score,
                support: total_support,
            }
        };

        let label_set: HashSet<&str> = labels.iter().map(String::as_str).collect();
        let micro_is_accuracy = ytrue
            .iter()
            .chain(ypred)
            .all(|l| label_set.contains(l.as_str()));

        let micro = averaged(Average::Micro);
        let (accuracy, micro_avg) = if micro_is_accuracy {
            (Some(micro.f1_score), None)
        } else {
            (None, Some(micro))
        };

        Self {
            classes,
            accuracy,
            micro_avg,
            macro_avg: averaged(Average::Macro),
            weighted_avg: averaged(Average::Weighted),
            total_support,
        }
    }

    /// Row for a class.
    pub fn class(&self, label: &str) -> Option<&ReportRow> {
        self.classes.iter().find(|r| r.label == label)
    }

    /// Format as a text table with `digits` decimals.
    ///
    /// ```text
    ///              precision    recall  f1-score   support
    ///
    ///          cat       0.50      0.50      0.50         2
    ///          dog       0.00      0.00      0.00         1
    ///
    ///     accuracy                           0.33         3
    ///    macro avg       0.25      0.25      0.25         3
    /// weighted avg       0.33      0.33      0.33         3
    /// ```
    pub fn format(&self, digits: usize) -> String {
        let name_width = self
            .classes
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);
        let width = name_width.max(WIDEST_HEADING.len()).max(digits);

        let mut out = format!("{:>width$} ", "", width = width);
        for header in ["precision", "recall", "f1-score", "support"] {
            out.push_str(&format!(" {:>9}", header));
        }
        out.push_str("\n\n");

        for row in &self.classes {
            out.push_str(&format_row(row, &row.label, width, digits));
        }
        out.push('\n');

        if let Some(acc) = self.accuracy {
            out.push_str(&format!(
                "{:>width$}  {:>9} {:>9} {:>9.digits$} {:>9}\n",
                "accuracy",
                "",
                "",
                acc,
                self.total_support,
                width = width,
                digits = digits
            ));
        }
        if let Some(micro) = &self.micro_avg {
            out.push_str(&format_row(micro, &micro.label, width, digits));
        }
        out.push_str(&format_row(&self.macro_avg, &self.macro_avg.label, width, digits));
        out.push_str(&format_row(
            &self.weighted_avg,
            &self.weighted_avg.label,
            width,
            digits,
        ));

        out
    }
}

fn format_row(row: &ReportRow, heading: &str, width: usize, digits: usize) -> String {
    format!(
        "{:>width$}  {:>9.digits$} {:>9.digits$} {:>9.digits$} {:>9}\n",
        heading,
        row.precision,
        row.recall,
        row.f1_score,
        row.support,
        width = width,
        digits = digits
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_accuracy_row_when_labels_cover_observed() {
        let report = ClassificationReport::compute(
            &s(&["cat", "dog", "cat"]),
            &s(&["cat", "cat", "dog"]),
            &s(&["cat", "dog"]),
        );

        let acc = report.accuracy.unwrap();
        assert!((acc - 1.0 / 3.0).abs() < 1e-12);
        assert!(report.micro_avg.is_none());
        assert_eq!(report.total_support, 3);

        let cat = report.class("cat").unwrap();
        assert!((cat.precision - 0.5).abs() < 1e-12);
        assert_eq!(cat.support, 2);
    }

    #[test]
    fn test_micro_row_when_labels_subset() {
        let report = ClassificationReport::compute(
            &s(&["cat", "dog", "bird"]),
            &s(&["cat", "cat", "bird"]),
            &s(&["cat", "dog"]),
        );

        assert!(report.accuracy.is_none());
        let micro = report.micro_avg.as_ref().unwrap();
        assert_eq!(micro.label, "micro avg");
        assert!((micro.precision - 0.5).abs() < 1e-12);
        assert_eq!(micro.support, 2);
    }

    #[test]
    fn test_format_layout() {
        let report = ClassificationReport::compute(
            &s(&["cat", "dog", "cat"]),
            &s(&["cat", "cat", "dog"]),
            &s(&["cat", "dog"]),
        );
        let text = report.format(2);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "              precision    recall  f1-score   support"
        );
        assert_eq!(lines[1], "");
        assert_eq!(
            lines[2],
            "         cat       0.50      0.50      0.50         2"
        );
        assert_eq!(
            lines[5],
            "    accuracy                           0.33         3"
        );
        assert!(lines[6].starts_with("   macro avg"));
        assert!(lines[7].starts_with("weighted avg"));
    }

    #[test]
    fn test_serializes_sklearn_keys() {
        let report = ClassificationReport::compute(&s(&["a"]), &s(&["a"]), &s(&["a"]));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["classes"][0].get("f1-score").is_some());
        assert_eq!(json["accuracy"], serde_json::json!(1.0));
    }
}
