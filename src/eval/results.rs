//! Results of a classification evaluation.
//!
//! Results own the cleaned label arrays and compute every derived artifact
//! (report, metrics, confusion matrix, curves) on demand.

use serde::{Deserialize, Serialize};

use super::metrics::{self, Average, ConfusionMatrix, PrCurve, RocCurve};
use super::plot::Plot;
use super::report::ClassificationReport;
use crate::{Error, Result};

/// Default missing-label sentinel.
pub const DEFAULT_MISSING: &str = "none";

/// Summary metrics returned by [`ClassificationResults::metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Fraction of samples whose prediction equals the truth.
    pub accuracy: f64,
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F-beta.
    pub fscore: f64,
}

// =============================================================================
// ClassificationResults
// =============================================================================

/// Results of a classification evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResults {
    /// Ground truth labels, missing replaced by `missing`.
    pub ytrue: Vec<String>,
    /// Predicted labels, missing replaced by `missing`.
    pub ypred: Vec<String>,
    /// Prediction confidences.
    pub confs: Vec<Option<f64>>,
    /// Classes considered when computing per-class statistics.
    pub classes: Vec<String>,
    /// Missing-label sentinel.
    pub missing: String,
}

impl ClassificationResults {
    /// Build results from raw label arrays.
    ///
    /// When `classes` is `None` the sorted set of observed labels is used.
    /// The `missing` sentinel is appended to the classes when any label was
    /// absent.
    pub fn new(
        ytrue: Vec<Option<String>>,
        ypred: Vec<Option<String>>,
        confs: Vec<Option<f64>>,
        classes: Option<Vec<String>>,
        missing: impl Into<String>,
    ) -> Result<Self> {
        if ytrue.len() != ypred.len() || ytrue.len() != confs.len() {
            return Err(Error::invalid_input(format!(
                "label arrays must have equal length (ytrue={}, ypred={}, confs={})",
                ytrue.len(),
                ypred.len(),
                confs.len()
            )));
        }

        let missing = missing.into();
        let (ytrue, ypred, classes) = parse_labels(ytrue, ypred, classes, &missing);

        Ok(Self {
            ytrue,
            ypred,
            confs,
            classes,
            missing,
        })
    }

    /// Number of evaluated samples.
    pub fn len(&self) -> usize {
        self.ytrue.len()
    }

    /// Whether no samples were evaluated.
    pub fn is_empty(&self) -> bool {
        self.ytrue.is_empty()
    }

    fn labels<'a>(&'a self, classes: Option<&'a [String]>) -> &'a [String] {
        classes.unwrap_or(&self.classes)
    }

    /// Per-class precision / recall / F1 / support, plus averages.
    pub fn report(&self, classes: Option<&[String]>) -> ClassificationReport {
        ClassificationReport::compute(&self.ytrue, &self.ypred, self.labels(classes))
    }

    /// Accuracy plus averaged precision, recall and F-beta.
    pub fn metrics(&self, classes: Option<&[String]>, average: Average, beta: f64) -> Metrics {
        let labels = self.labels(classes);
        let (precision, recall, fscore) =
            metrics::averaged_scores(&self.ytrue, &self.ypred, labels, average, beta);
        Metrics {
            accuracy: metrics::accuracy(&self.ytrue, &self.ypred),
            precision,
            recall,
            fscore,
        }
    }

    /// Confusion matrix over `classes` (defaults to the results' classes).
    pub fn confusion_matrix(&self, classes: Option<&[String]>) -> ConfusionMatrix {
        ConfusionMatrix::compute(&self.ytrue, &self.ypred, self.labels(classes))
    }

    /// Text classification report with `digits` decimals.
    pub fn format_report(&self, classes: Option<&[String]>, digits: usize) -> String {
        self.report(classes).format(digits)
    }

    /// Print the text classification report to stdout.
    pub fn print_report(&self, classes: Option<&[String]>, digits: usize) {
        print!("{}", self.format_report(classes, digits));
    }

    /// Confusion matrix plot.
    pub fn plot_confusion_matrix(&self, classes: Option<&[String]>, include_values: bool) -> Plot {
        Plot::confusion_matrix(&self.confusion_matrix(classes), include_values)
    }
}

// =============================================================================
// BinaryClassificationResults
// =============================================================================

/// Results of a binary classification evaluation.
///
/// Missing truth or predicted labels count as the negative class, and a
/// missing confidence counts as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryClassificationResults {
    base: ClassificationResults,
    pos_label: String,
    scores: Vec<f64>,
}

impl BinaryClassificationResults {
    /// Build results for `classes = [negative, positive]`.
    pub fn new(
        ytrue: Vec<Option<String>>,
        ypred: Vec<Option<String>>,
        confs: Vec<Option<f64>>,
        classes: [String; 2],
    ) -> Result<Self> {
        let [neg_label, pos_label] = classes;
        let scores = to_binary_scores(&ypred, &confs, &pos_label);
        let base = ClassificationResults::new(
            ytrue,
            ypred,
            confs,
            Some(vec![neg_label.clone(), pos_label.clone()]),
            neg_label,
        )?;
        Ok(Self {
            base,
            pos_label,
            scores,
        })
    }

    /// The general classification results.
    pub fn base(&self) -> &ClassificationResults {
        &self.base
    }

    /// Negative class label.
    pub fn neg_label(&self) -> &str {
        &self.base.missing
    }

    /// Positive class label.
    pub fn pos_label(&self) -> &str {
        &self.pos_label
    }

    /// Per-sample positive-class scores.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Average precision of the positive-class scores.
    pub fn average_precision(&self) -> Result<f64> {
        metrics::average_precision(&self.base.ytrue, &self.scores, &self.pos_label)
    }

    /// Precision-recall curve of the positive-class scores.
    pub fn pr_curve(&self) -> Result<PrCurve> {
        metrics::precision_recall_curve(&self.base.ytrue, &self.scores, &self.pos_label)
    }

    /// ROC curve of the positive-class scores.
    pub fn roc_curve(&self) -> Result<RocCurve> {
        metrics::roc_curve(&self.base.ytrue, &self.scores, &self.pos_label)
    }

    /// PR curve plot, labelled with the average precision.
    pub fn plot_pr_curve(&self) -> Result<Plot> {
        let curve = self.pr_curve()?;
        let ap = self.average_precision()?;
        Ok(Plot::pr_curve(&curve, ap))
    }

    /// ROC curve plot, labelled with the area under the curve.
    pub fn plot_roc_curve(&self) -> Result<Plot> {
        Ok(Plot::roc_curve(&self.roc_curve()?))
    }
}

impl std::ops::Deref for BinaryClassificationResults {
    type Target = ClassificationResults;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

// =============================================================================
// Label normalization
// =============================================================================

/// Clean both label arrays and resolve the class list.
///
/// Without explicit `classes`, the sorted union of non-missing labels is
/// used. `missing` is appended when any label was absent and it is not
/// already a class.
pub fn parse_labels(
    ytrue: Vec<Option<String>>,
    ypred: Vec<Option<String>>,
    classes: Option<Vec<String>>,
    missing: &str,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut classes = classes.unwrap_or_else(|| {
        let mut observed: Vec<String> = ytrue
            .iter()
            .chain(ypred.iter())
            .flatten()
            .cloned()
            .collect();
        observed.sort();
        observed.dedup();
        observed
    });

    let (ytrue, found_missing_true) = clean_labels(ytrue, missing);
    let (ypred, found_missing_pred) = clean_labels(ypred, missing);

    if (found_missing_true || found_missing_pred) && !classes.iter().any(|c| c == missing) {
        classes.push(missing.to_string());
    }

    (ytrue, ypred, classes)
}

/// Replace absent labels with `missing`, reporting whether any were absent.
pub fn clean_labels(labels: Vec<Option<String>>, missing: &str) -> (Vec<String>, bool) {
    let mut found_missing = false;
    let cleaned = labels
        .into_iter()
        .map(|label| {
            label.unwrap_or_else(|| {
                found_missing = true;
                missing.to_string()
            })
        })
        .collect();
    (cleaned, found_missing)
}

/// Positive-class score per sample: the confidence when the prediction is
/// `pos_label`, otherwise `1 - confidence`. Missing confidences are `0.0`.
pub fn to_binary_scores(
    ypred: &[Option<String>],
    confs: &[Option<f64>],
    pos_label: &str,
) -> Vec<f64> {
    ypred
        .iter()
        .zip(confs)
        .map(|(label, conf)| {
            let conf = conf.unwrap_or(0.0);
            if label.as_deref() == Some(pos_label) {
                conf
            } else {
                1.0 - conf
            }
        })
        .collect()
}
