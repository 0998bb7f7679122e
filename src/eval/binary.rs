//! Binary evaluation over `(negative, positive)` classes.
//!
//! Missing ground truth or predictions count as the negative class (with
//! zero confidence, for predictions). With a run key, each sample is tagged
//! with its [`BinaryStatus`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::results::BinaryClassificationResults;
use crate::collection::{float_values, string_values, FieldKind, SampleCollection};
use crate::{Error, Result};

/// Outcome of a single binary prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryStatus {
    /// Positive truth, positive prediction
    TP,
    /// Positive truth, negative prediction
    FN,
    /// Negative truth, negative prediction
    TN,
    /// Negative truth, positive prediction
    FP,
}

impl BinaryStatus {
    /// Classify one sample against `pos_label`.
    pub fn classify(truth: Option<&str>, pred: Option<&str>, pos_label: &str) -> Self {
        let truth_pos = truth == Some(pos_label);
        let pred_pos = pred == Some(pos_label);
        match (truth_pos, pred_pos) {
            (true, true) => BinaryStatus::TP,
            (true, false) => BinaryStatus::FN,
            (false, false) => BinaryStatus::TN,
            (false, true) => BinaryStatus::FP,
        }
    }

    /// Two-letter code stored on samples.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryStatus::TP => "TP",
            BinaryStatus::FN => "FN",
            BinaryStatus::TN => "TN",
            BinaryStatus::FP => "FP",
        }
    }
}

impl fmt::Display for BinaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that exactly two classes were given, returning `[neg, pos]`.
pub(crate) fn parse_binary_classes(classes: Option<&[String]>) -> Result<[String; 2]> {
    match classes {
        Some([neg, pos]) => Ok([neg.clone(), pos.clone()]),
        _ => Err(Error::invalid_input(
            "You must provide the (neg_label, pos_label) labels for your task via \
             `classes` in order to run binary evaluation",
        )),
    }
}

pub(crate) fn evaluate_samples<C: SampleCollection + ?Sized>(
    samples: &mut C,
    pred_field: &str,
    gt_field: &str,
    eval_key: Option<&str>,
    classes: Option<&[String]>,
) -> Result<BinaryClassificationResults> {
    let classes = parse_binary_classes(classes)?;
    let pos_label = classes[1].as_str();

    let ytrue = string_values(samples, &format!("{}.label", gt_field))?;
    let ypred = string_values(samples, &format!("{}.label", pred_field))?;
    let confs = float_values(samples, &format!("{}.confidence", pred_field))?;

    if let Some(eval_key) = eval_key {
        let statuses: Vec<Value> = ytrue
            .iter()
            .zip(&ypred)
            .map(|(t, p)| {
                let status = BinaryStatus::classify(t.as_deref(), p.as_deref(), pos_label);
                Value::String(status.as_str().to_string())
            })
            .collect();
        samples.ensure_field(eval_key, FieldKind::String)?;
        samples.set_values(eval_key, statuses)?;
    }

    BinaryClassificationResults::new(ytrue, ypred, confs, classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(BinaryStatus::classify(Some("pos"), Some("pos"), "pos"), BinaryStatus::TP);
        assert_eq!(BinaryStatus::classify(Some("pos"), Some("neg"), "pos"), BinaryStatus::FN);
        assert_eq!(BinaryStatus::classify(Some("neg"), Some("neg"), "pos"), BinaryStatus::TN);
        assert_eq!(BinaryStatus::classify(Some("neg"), Some("pos"), "pos"), BinaryStatus::FP);
        // missing counts as negative
        assert_eq!(BinaryStatus::classify(Some("pos"), None, "pos"), BinaryStatus::FN);
        assert_eq!(BinaryStatus::classify(None, Some("pos"), "pos"), BinaryStatus::FP);
        assert_eq!(BinaryStatus::classify(None, None, "pos"), BinaryStatus::TN);
    }

    #[test]
    fn test_parse_binary_classes() {
        let two = vec!["neg".to_string(), "pos".to_string()];
        assert_eq!(
            parse_binary_classes(Some(&two)).unwrap(),
            ["neg".to_string(), "pos".to_string()]
        );

        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(parse_binary_classes(Some(&three)).is_err());
        assert!(parse_binary_classes(None).is_err());
    }
}
