//! Simple evaluation: a prediction is correct iff its label equals the
//! ground truth label.

use serde_json::Value;

use super::results::ClassificationResults;
use crate::collection::{float_values, string_values, FieldKind, SampleCollection};
use crate::Result;

/// Evaluate `pred_field` against `gt_field`, writing a boolean correctness
/// field under `eval_key` when given.
pub(crate) fn evaluate_samples<C: SampleCollection + ?Sized>(
    samples: &mut C,
    pred_field: &str,
    gt_field: &str,
    eval_key: Option<&str>,
    classes: Option<&[String]>,
    missing: &str,
) -> Result<ClassificationResults> {
    let ytrue = string_values(samples, &format!("{}.label", gt_field))?;
    let ypred = string_values(samples, &format!("{}.label", pred_field))?;
    let confs = float_values(samples, &format!("{}.confidence", pred_field))?;

    if let Some(eval_key) = eval_key {
        let correct: Vec<Value> = ytrue
            .iter()
            .zip(&ypred)
            .map(|(t, p)| Value::Bool(t == p))
            .collect();
        samples.ensure_field(eval_key, FieldKind::Boolean)?;
        samples.set_values(eval_key, correct)?;
    }

    ClassificationResults::new(ytrue, ypred, confs, classes.map(<[String]>::to_vec), missing)
}
