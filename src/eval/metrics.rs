//! Classification statistics.
//!
//! Definitions follow scikit-learn's `sklearn.metrics` so that numbers are
//! comparable with the wider ecosystem:
//!
//! - Zero-division cases (no predictions / no support for a class) yield `0.0`
//! - `labels` restricts which classes are counted; samples whose labels fall
//!   outside it are ignored by per-class statistics but not by accuracy
//! - Curves are built from distinct score thresholds in decreasing order

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// =============================================================================
// Averaging
// =============================================================================

/// Averaging strategy for multi-class precision / recall / F-beta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Average {
    /// Count TP / FP / FN globally across classes.
    #[default]
    Micro,
    /// Unweighted mean of per-class scores.
    Macro,
    /// Mean of per-class scores weighted by support.
    Weighted,
}

impl Average {
    /// Name used in reports (`"micro"`, `"macro"`, `"weighted"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Average::Micro => "micro",
            Average::Macro => "macro",
            Average::Weighted => "weighted",
        }
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Average {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            other => Err(Error::invalid_input(format!(
                "Unsupported averaging strategy '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// Per-class counts and scores
// =============================================================================

/// Raw counts for one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelCounts {
    /// Samples predicted as this class that truly are this class.
    pub true_positives: usize,
    /// Samples predicted as this class.
    pub predicted: usize,
    /// Samples that truly are this class.
    pub support: usize,
}

/// Precision / recall / F-beta / support for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    /// TP / predicted
    pub precision: f64,
    /// TP / support
    pub recall: f64,
    /// F-beta of precision and recall
    pub fscore: f64,
    /// Number of true samples
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// F-beta score. `0.0` when both precision and recall are zero.
#[must_use]
pub fn fbeta(precision: f64, recall: f64, beta: f64) -> f64 {
    let beta2 = beta * beta;
    let denom = beta2 * precision + recall;
    if denom <= 0.0 {
        0.0
    } else {
        (1.0 + beta2) * precision * recall / denom
    }
}

/// Fraction of samples whose prediction equals the truth. `0.0` when empty.
#[must_use]
pub fn accuracy(ytrue: &[String], ypred: &[String]) -> f64 {
    let correct = ytrue.iter().zip(ypred).filter(|(t, p)| t == p).count();
    ratio(correct, ytrue.len())
}

/// Per-class counts for each of `labels`, in order.
#[must_use]
pub fn label_counts(ytrue: &[String], ypred: &[String], labels: &[String]) -> Vec<LabelCounts> {
    let index: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    let mut counts = vec![LabelCounts::default(); labels.len()];

    for (t, p) in ytrue.iter().zip(ypred) {
        if let Some(&i) = index.get(t.as_str()) {
            counts[i].support += 1;
        }
        if let Some(&j) = index.get(p.as_str()) {
            counts[j].predicted += 1;
            if t == p {
                counts[j].true_positives += 1;
            }
        }
    }

    counts
}

/// Precision, recall, F-beta and support for each of `labels`.
#[must_use]
pub fn per_class_scores(
    ytrue: &[String],
    ypred: &[String],
    labels: &[String],
    beta: f64,
) -> Vec<ClassScores> {
    label_counts(ytrue, ypred, labels)
        .into_iter()
        .map(|c| {
            let precision = ratio(c.true_positives, c.predicted);
            let recall = ratio(c.true_positives, c.support);
            ClassScores {
                precision,
                recall,
                fscore: fbeta(precision, recall, beta),
                support: c.support,
            }
        })
        .collect()
}

/// Averaged `(precision, recall, fscore)` over `labels`.
#[must_use]
pub fn averaged_scores(
    ytrue: &[String],
    ypred: &[String],
    labels: &[String],
    average: Average,
    beta: f64,
) -> (f64, f64, f64) {
    match average {
        Average::Micro => {
            let counts = label_counts(ytrue, ypred, labels);
            let tp: usize = counts.iter().map(|c| c.true_positives).sum();
            let predicted: usize = counts.iter().map(|c| c.predicted).sum();
            let support: usize = counts.iter().map(|c| c.support).sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            (precision, recall, fbeta(precision, recall, beta))
        }
        Average::Macro => {
            let scores = per_class_scores(ytrue, ypred, labels, beta);
            if scores.is_empty() {
                return (0.0, 0.0, 0.0);
            }
            let n = scores.len() as f64;
            (
                scores.iter().map(|s| s.precision).sum::<f64>() / n,
                scores.iter().map(|s| s.recall).sum::<f64>() / n,
                scores.iter().map(|s| s.fscore).sum::<f64>() / n,
            )
        }
        Average::Weighted => {
            let scores = per_class_scores(ytrue, ypred, labels, beta);
            let total: usize = scores.iter().map(|s| s.support).sum();
            if total == 0 {
                return (0.0, 0.0, 0.0);
            }
            let w = |f: fn(&ClassScores) -> f64| -> f64 {
                scores.iter().map(|s| f(s) * s.support as f64).sum::<f64>() / total as f64
            };
            (w(|s| s.precision), w(|s| s.recall), w(|s| s.fscore))
        }
    }
}

// =============================================================================
// Confusion matrix
// =============================================================================

/// Confusion matrix: rows are truth labels, columns are predicted labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Row / column labels.
    pub labels: Vec<String>,
    /// `counts[i][j]`: samples with truth `labels[i]` predicted as `labels[j]`.
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Build from label arrays. Samples whose truth or prediction is not in
    /// `labels` are not counted.
    #[must_use]
    pub fn compute(ytrue: &[String], ypred: &[String], labels: &[String]) -> Self {
        let index: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let mut counts = vec![vec![0; labels.len()]; labels.len()];

        for (t, p) in ytrue.iter().zip(ypred) {
            if let (Some(&i), Some(&j)) = (index.get(t.as_str()), index.get(p.as_str())) {
                counts[i][j] += 1;
            }
        }

        Self {
            labels: labels.to_vec(),
            counts,
        }
    }

    /// Count for a (truth, predicted) pair.
    pub fn get(&self, truth: &str, predicted: &str) -> Option<usize> {
        let i = self.labels.iter().position(|l| l == truth)?;
        let j = self.labels.iter().position(|l| l == predicted)?;
        Some(self.counts[i][j])
    }

    /// Total number of counted samples.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of counted samples on the diagonal.
    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }
}

// =============================================================================
// Ranking curves
// =============================================================================

/// Precision-recall curve, ordered by increasing threshold.
///
/// `precision` and `recall` have one more entry than `thresholds`: the final
/// point `(recall = 0, precision = 1)` has no threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrCurve {
    /// Precision at each threshold.
    pub precision: Vec<f64>,
    /// Recall at each threshold.
    pub recall: Vec<f64>,
    /// Distinct score thresholds, increasing.
    pub thresholds: Vec<f64>,
}

/// Receiver operating characteristic curve, ordered by decreasing threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    /// False positive rate at each threshold.
    pub fpr: Vec<f64>,
    /// True positive rate at each threshold.
    pub tpr: Vec<f64>,
    /// Score thresholds, decreasing. The first is `+inf`.
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Area under the curve.
    pub fn auc(&self) -> f64 {
        auc(&self.fpr, &self.tpr)
    }
}

/// Cumulative false/true positive counts at each distinct threshold, in
/// decreasing score order.
struct ThresholdCounts {
    fps: Vec<f64>,
    tps: Vec<f64>,
    thresholds: Vec<f64>,
}

fn binary_counts(ytrue: &[String], scores: &[f64], pos_label: &str) -> Result<ThresholdCounts> {
    if ytrue.len() != scores.len() {
        return Err(Error::invalid_input(format!(
            "got {} labels but {} scores",
            ytrue.len(),
            scores.len()
        )));
    }
    if ytrue.is_empty() {
        return Err(Error::evaluation("cannot compute a curve over zero samples"));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let mut thresholds = Vec::new();
    let mut tp = 0.0;
    let mut fp = 0.0;

    for (rank, &idx) in order.iter().enumerate() {
        if ytrue[idx] == pos_label {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_value = order
            .get(rank + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_value {
            fps.push(fp);
            tps.push(tp);
            thresholds.push(scores[idx]);
        }
    }

    Ok(ThresholdCounts {
        fps,
        tps,
        thresholds,
    })
}

/// Precision-recall pairs for a binary problem.
///
/// When there are no positive samples every recall is `1.0`.
pub fn precision_recall_curve(
    ytrue: &[String],
    scores: &[f64],
    pos_label: &str,
) -> Result<PrCurve> {
    let counts = binary_counts(ytrue, scores, pos_label)?;
    let total_pos = counts.tps.last().copied().unwrap_or(0.0);
    if total_pos == 0.0 {
        log::warn!("No positive samples in ground truth; recall is set to 1 for all thresholds");
    }

    let mut precision: Vec<f64> = counts
        .tps
        .iter()
        .zip(&counts.fps)
        .map(|(&tp, &fp)| if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 })
        .rev()
        .collect();
    let mut recall: Vec<f64> = counts
        .tps
        .iter()
        .map(|&tp| if total_pos > 0.0 { tp / total_pos } else { 1.0 })
        .rev()
        .collect();
    precision.push(1.0);
    recall.push(0.0);

    Ok(PrCurve {
        precision,
        recall,
        thresholds: counts.thresholds.into_iter().rev().collect(),
    })
}

/// Average precision: `Σ (R_n - R_{n-1}) P_n` over the PR curve.
pub fn average_precision(ytrue: &[String], scores: &[f64], pos_label: &str) -> Result<f64> {
    let curve = precision_recall_curve(ytrue, scores, pos_label)?;
    let ap = curve
        .recall
        .windows(2)
        .zip(&curve.precision)
        .map(|(r, &p)| (r[0] - r[1]) * p)
        .sum::<f64>();
    Ok(ap.max(0.0))
}

/// ROC curve for a binary problem.
///
/// Collinear intermediate points are dropped. If there are no negative
/// (positive) samples, the false (true) positive rates are NaN.
pub fn roc_curve(ytrue: &[String], scores: &[f64], pos_label: &str) -> Result<RocCurve> {
    let counts = binary_counts(ytrue, scores, pos_label)?;
    let n = counts.fps.len();

    let keep: Vec<usize> = if n > 2 {
        (0..n)
            .filter(|&i| {
                if i == 0 || i == n - 1 {
                    return true;
                }
                let d2 = |v: &[f64]| v[i + 1] - 2.0 * v[i] + v[i - 1];
                d2(&counts.fps) != 0.0 || d2(&counts.tps) != 0.0
            })
            .collect()
    } else {
        (0..n).collect()
    };

    let mut fps = vec![0.0];
    let mut tps = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];
    for i in keep {
        fps.push(counts.fps[i]);
        tps.push(counts.tps[i]);
        thresholds.push(counts.thresholds[i]);
    }

    let total_neg = fps.last().copied().unwrap_or(0.0);
    let total_pos = tps.last().copied().unwrap_or(0.0);
    if total_neg == 0.0 {
        log::warn!("No negative samples in ground truth; false positive rate is undefined");
    }
    if total_pos == 0.0 {
        log::warn!("No positive samples in ground truth; true positive rate is undefined");
    }
    let rate = |v: f64, total: f64| if total > 0.0 { v / total } else { f64::NAN };

    Ok(RocCurve {
        fpr: fps.iter().map(|&v| rate(v, total_neg)).collect(),
        tpr: tps.iter().map(|&v| rate(v, total_pos)).collect(),
        thresholds,
    })
}

/// Trapezoidal area under a curve with monotonic `x`.
#[must_use]
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum();
    let decreasing = x.windows(2).all(|w| w[1] <= w[0]) && x.len() > 1;
    if decreasing {
        -area
    } else {
        area
    }
}
