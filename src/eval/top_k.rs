//! Top-k evaluation over prediction logits.
//!
//! A prediction is correct when the ground truth's logit is among the `k`
//! largest. In that case the truth label becomes the *effective* prediction
//! for the results, so downstream metrics (accuracy, reports) measure top-k
//! accuracy. The model's actual top-1 label is only kept for incorrect
//! samples.
//!
//! Samples without logits have no prediction: their effective prediction,
//! confidence and correctness are all absent, and a warning is logged.

use std::collections::HashMap;

use serde_json::Value;

use super::config::TopKConfig;
use super::results::ClassificationResults;
use crate::collection::{float_vector_values, string_values, FieldKind, SampleCollection};
use crate::{Error, Result};

/// Per-sample outcome of a top-k pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TopKPass {
    /// Effective predictions.
    pub ypred: Vec<Option<String>>,
    /// Softmax probability of the effective prediction.
    pub confs: Vec<Option<f64>>,
    /// Whether the truth was in the top-k. `None` without logits.
    pub correct: Vec<Option<bool>>,
    /// Number of samples that had no logits.
    pub num_missing_logits: usize,
}

/// Indices of the `k` largest values (unordered). `k` is clamped to the
/// number of values.
#[must_use]
pub fn top_k_indices(logits: &[f64], k: usize) -> Vec<usize> {
    let k = k.min(logits.len());
    let mut indices: Vec<usize> = (0..logits.len()).collect();
    if k == 0 {
        indices.clear();
        return indices;
    }
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, |&a, &b| logits[b].total_cmp(&logits[a]));
        indices.truncate(k);
    }
    indices
}

/// Softmax probability of `logits[idx]` over the full vector.
#[must_use]
pub fn softmax_prob(logits: &[f64], idx: usize) -> f64 {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let denom: f64 = logits.iter().map(|&l| (l - max).exp()).sum();
    (logits[idx] - max).exp() / denom
}

/// Compute effective predictions, confidences and correctness.
///
/// `classes` maps each logit position to a class name.
pub fn top_k_pass(
    ytrue: &[Option<String>],
    mut ypred: Vec<Option<String>>,
    logits: &[Option<Vec<f64>>],
    classes: &[String],
    k: usize,
) -> Result<TopKPass> {
    if ytrue.len() != ypred.len() || ytrue.len() != logits.len() {
        return Err(Error::invalid_input(format!(
            "label arrays must have equal length (ytrue={}, ypred={}, logits={})",
            ytrue.len(),
            ypred.len(),
            logits.len()
        )));
    }
    if classes.is_empty() {
        return Err(Error::invalid_input("top-k evaluation requires at least one class"));
    }

    let targets: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(idx, label)| (label.as_str(), idx))
        .collect();
    let target_of = |label: &str| -> Result<usize> {
        targets.get(label).copied().ok_or_else(|| {
            Error::invalid_input(format!("label '{}' is not in the provided classes", label))
        })
    };

    let mut confs = Vec::with_capacity(ytrue.len());
    let mut correct = Vec::with_capacity(ytrue.len());
    let mut num_missing_logits = 0;

    for (idx, (truth, sample_logits)) in ytrue.iter().zip(logits).enumerate() {
        let Some(sample_logits) = sample_logits else {
            log::warn!(
                "Found sample(s) with no logits. Logits are required to compute top-k accuracy"
            );
            num_missing_logits += 1;
            ypred[idx] = None;
            confs.push(None);
            correct.push(None);
            continue;
        };

        if sample_logits.len() != classes.len() {
            return Err(Error::invalid_input(format!(
                "sample {} has {} logits but {} classes were provided",
                idx,
                sample_logits.len(),
                classes.len()
            )));
        }

        let target = truth.as_deref().map(target_of).transpose()?;
        let top_k = top_k_indices(sample_logits, k);

        let (logit_idx, is_correct) = match target {
            Some(target) if top_k.contains(&target) => {
                ypred[idx] = truth.clone();
                (target, true)
            }
            _ => match ypred[idx].as_deref() {
                Some(pred) => (target_of(pred)?, false),
                None => {
                    let argmax = top_k_indices(sample_logits, 1)[0];
                    ypred[idx] = Some(classes[argmax].clone());
                    (argmax, false)
                }
            },
        };

        confs.push(Some(softmax_prob(sample_logits, logit_idx)));
        correct.push(Some(is_correct));
    }

    Ok(TopKPass {
        ypred,
        confs,
        correct,
        num_missing_logits,
    })
}

pub(crate) fn evaluate_samples<C: SampleCollection + ?Sized>(
    config: &TopKConfig,
    samples: &mut C,
    pred_field: &str,
    gt_field: &str,
    eval_key: Option<&str>,
    classes: Option<&[String]>,
    missing: &str,
) -> Result<ClassificationResults> {
    let classes = classes.ok_or_else(|| {
        Error::invalid_input(
            "You must provide the list of classes corresponding to your logits in order \
             to run top-k classification evaluation",
        )
    })?;

    let ytrue = string_values(samples, &format!("{}.label", gt_field))?;
    let ypred = string_values(samples, &format!("{}.label", pred_field))?;
    let logits = float_vector_values(samples, &format!("{}.logits", pred_field))?;

    let pass = top_k_pass(&ytrue, ypred, &logits, classes, config.k)?;
    if pass.num_missing_logits > 0 {
        log::info!(
            "{} of {} samples had no logits and were treated as unpredicted",
            pass.num_missing_logits,
            ytrue.len()
        );
    }

    if let Some(eval_key) = eval_key {
        let correct: Vec<Value> = pass
            .correct
            .iter()
            .map(|c| c.map_or(Value::Null, Value::Bool))
            .collect();
        samples.ensure_field(eval_key, FieldKind::Boolean)?;
        samples.set_values(eval_key, correct)?;
    }

    ClassificationResults::new(
        ytrue,
        pass.ypred,
        pass.confs,
        Some(classes.to_vec()),
        missing,
    )
}
