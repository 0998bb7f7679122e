//! Classification evaluation.
//!
//! # Overview
//!
//! [`evaluate_classifications`] compares a predicted label field against a
//! ground truth label field of a [`SampleCollection`] and returns results
//! that compute reports, metrics, confusion matrices and curves on demand.
//!
//! | Method   | Correctness per sample                       | Results |
//! |----------|----------------------------------------------|---------|
//! | `simple` | predicted label == truth label               | [`ClassificationResults`] |
//! | `top-k`  | truth logit among the `k` largest logits     | [`ClassificationResults`] |
//! | `binary` | `TP` / `FN` / `TN` / `FP` vs. the positive class | [`BinaryClassificationResults`] |
//!
//! When a run key is given, the per-sample outcome is stored in a field of
//! that name and the run is recorded in the collection's [`RunRegistry`]
//! until [`delete_evaluation`] removes both.
//!
//! # Example
//!
//! ```rust
//! use verdict::eval::{evaluate_classifications, EvaluateOptions};
//! use verdict::{Classification, Dataset, Sample};
//!
//! let mut dataset = Dataset::new("pets");
//! for (gt, pred) in [("cat", "cat"), ("dog", "cat"), ("cat", "dog")] {
//!     let mut sample = Sample::new(format!("/images/{}.png", gt));
//!     sample.set_label("ground_truth", Classification::new(gt)).unwrap();
//!     sample.set_label("predictions", Classification::new(pred)).unwrap();
//!     dataset.add_sample(sample).unwrap();
//! }
//!
//! let results = evaluate_classifications(
//!     &mut dataset,
//!     "predictions",
//!     "ground_truth",
//!     EvaluateOptions::new().eval_key("eval"),
//! )
//! .unwrap();
//!
//! let metrics = results.as_classification().metrics(None, Default::default(), 1.0);
//! assert!((metrics.accuracy - 1.0 / 3.0).abs() < 1e-9);
//! ```

pub mod binary;
pub mod config;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod results;
pub mod simple;
pub mod top_k;

pub use binary::BinaryStatus;
pub use config::{BinaryConfig, EvaluationConfig, SimpleConfig, TopKConfig};
pub use metrics::{Average, ConfusionMatrix, PrCurve, RocCurve};
pub use plot::{Plot, PlotKind};
pub use report::{ClassificationReport, ReportRow};
pub use results::{
    BinaryClassificationResults, ClassificationResults, Metrics, DEFAULT_MISSING,
};
pub use top_k::{top_k_pass, TopKPass};

use serde::{Deserialize, Serialize};

use crate::collection::{RunRegistry, SampleCollection};
use crate::{Error, Result};

// =============================================================================
// Run info
// =============================================================================

/// Record of an evaluation run stored in the collection's run registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInfo {
    /// Run key; also the name of the per-sample outcome field.
    pub eval_key: String,
    /// Predicted label field.
    pub pred_field: String,
    /// Ground truth label field.
    pub gt_field: String,
    /// Method and parameters.
    pub config: EvaluationConfig,
    /// Classes passed to the run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    /// RFC 3339 time the run was recorded.
    pub timestamp: String,
}

// =============================================================================
// Options
// =============================================================================

/// Options for [`evaluate_classifications`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Run key under which per-sample outcomes are stored.
    pub eval_key: Option<String>,
    /// Ordered class list. Required for `top-k` (maps logits to labels)
    /// and `binary` (`[neg, pos]`).
    pub classes: Option<Vec<String>>,
    /// Sentinel for absent labels.
    pub missing: String,
    /// Explicit config; takes precedence over `method` / `params`.
    pub config: Option<EvaluationConfig>,
    /// Method name, `simple` when absent.
    pub method: Option<String>,
    /// Method parameters as a JSON object.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            eval_key: None,
            classes: None,
            missing: DEFAULT_MISSING.to_string(),
            config: None,
            method: None,
            params: serde_json::Value::Null,
        }
    }
}

impl EvaluateOptions {
    /// Defaults: no run key, no classes, `simple` method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store per-sample outcomes under `key`.
    pub fn eval_key(mut self, key: impl Into<String>) -> Self {
        self.eval_key = Some(key.into());
        self
    }

    /// Set the ordered class list.
    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the missing-label sentinel.
    pub fn missing(mut self, missing: impl Into<String>) -> Self {
        self.missing = missing.into();
        self
    }

    /// Use an explicit config.
    pub fn config(mut self, config: EvaluationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Select a method by name with its parameters.
    pub fn method(mut self, method: impl Into<String>, params: serde_json::Value) -> Self {
        self.method = Some(method.into());
        self.params = params;
        self
    }
}

// =============================================================================
// Results
// =============================================================================

/// Results of [`evaluate_classifications`], by method family.
#[derive(Debug, Clone, PartialEq)]
pub enum Results {
    /// `simple` and `top-k` results
    Classification(ClassificationResults),
    /// `binary` results
    Binary(BinaryClassificationResults),
}

impl Results {
    /// The general classification results. Binary results expose their
    /// underlying results.
    pub fn as_classification(&self) -> &ClassificationResults {
        match self {
            Results::Classification(results) => results,
            Results::Binary(results) => results.base(),
        }
    }

    /// Binary results, if this was a binary evaluation.
    pub fn as_binary(&self) -> Option<&BinaryClassificationResults> {
        match self {
            Results::Binary(results) => Some(results),
            Results::Classification(_) => None,
        }
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Evaluate the classifications in `pred_field` against `gt_field`.
///
/// The config is resolved from `options` (explicit config, then method name
/// and parameters, then `simple`). With a run key, the key is validated
/// before anything is written, the per-sample outcome field is written, and
/// the run is recorded.
///
/// # Errors
///
/// Invalid-input errors for an unknown method or bad parameters, missing or
/// malformed classes, an invalid or taken run key, and label data the method
/// cannot use. Field errors when a label field holds the wrong kind of
/// value.
pub fn evaluate_classifications<C>(
    samples: &mut C,
    pred_field: &str,
    gt_field: &str,
    options: EvaluateOptions,
) -> Result<Results>
where
    C: SampleCollection + RunRegistry + ?Sized,
{
    let EvaluateOptions {
        eval_key,
        classes,
        missing,
        config,
        method,
        params,
    } = options;

    let config = EvaluationConfig::resolve(config, method.as_deref(), params)?;
    let eval_key = eval_key.as_deref();
    if let Some(key) = eval_key {
        validate_evaluation(&*samples, key)?;
    }

    log::info!(
        "Evaluating '{}' against '{}' ({}, {} samples)",
        pred_field,
        gt_field,
        config,
        samples.len()
    );

    let classes_ref = classes.as_deref();
    let results = match &config {
        EvaluationConfig::Simple(_) => Results::Classification(simple::evaluate_samples(
            samples, pred_field, gt_field, eval_key, classes_ref, &missing,
        )?),
        EvaluationConfig::TopK(top_k_config) => Results::Classification(top_k::evaluate_samples(
            top_k_config,
            samples,
            pred_field,
            gt_field,
            eval_key,
            classes_ref,
            &missing,
        )?),
        EvaluationConfig::Binary(_) => Results::Binary(binary::evaluate_samples(
            samples, pred_field, gt_field, eval_key, classes_ref,
        )?),
    };

    if let Some(key) = eval_key {
        samples.save_evaluation_info(EvaluationInfo {
            eval_key: key.to_string(),
            pred_field: pred_field.to_string(),
            gt_field: gt_field.to_string(),
            config,
            classes,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })?;
        log::debug!("Recorded evaluation '{}'", key);
    }

    Ok(results)
}

/// Check that `eval_key` can be used for a new evaluation.
///
/// The key must be an identifier (`[A-Za-z_][A-Za-z0-9_]*`), must not name
/// an existing evaluation, and must not collide with an existing field.
pub fn validate_evaluation<C>(samples: &C, eval_key: &str) -> Result<()>
where
    C: SampleCollection + RunRegistry + ?Sized,
{
    if !is_identifier(eval_key) {
        return Err(Error::invalid_input(format!(
            "Invalid evaluation key '{}'. Keys must be valid identifiers",
            eval_key
        )));
    }
    if samples.evaluation_info(eval_key).is_some() {
        return Err(Error::invalid_input(format!(
            "An evaluation with key '{}' already exists",
            eval_key
        )));
    }
    if samples.has_field(eval_key) {
        return Err(Error::invalid_input(format!(
            "Evaluation key '{}' conflicts with an existing field",
            eval_key
        )));
    }
    Ok(())
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Keys of all recorded evaluations, sorted.
pub fn list_evaluations<C: RunRegistry + ?Sized>(samples: &C) -> Vec<String> {
    samples.list_evaluations()
}

/// Info for a recorded evaluation.
pub fn get_evaluation_info<C: RunRegistry + ?Sized>(
    samples: &C,
    eval_key: &str,
) -> Result<EvaluationInfo> {
    samples
        .evaluation_info(eval_key)
        .cloned()
        .ok_or_else(|| Error::evaluation(format!("No evaluation with key '{}'", eval_key)))
}

/// Delete a recorded evaluation and its per-sample outcome field.
pub fn delete_evaluation<C>(samples: &mut C, eval_key: &str) -> Result<EvaluationInfo>
where
    C: SampleCollection + RunRegistry + ?Sized,
{
    let info = get_evaluation_info(&*samples, eval_key)?;
    if samples.has_field(eval_key) {
        samples.delete_field(eval_key)?;
    }
    samples.remove_evaluation_info(eval_key);
    log::info!("Deleted evaluation '{}'", eval_key);
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Classification, Dataset, Sample};

    fn pets() -> Dataset {
        let mut dataset = Dataset::new("pets");
        for (gt, pred, conf) in [("cat", "cat", 0.9), ("dog", "cat", 0.4), ("cat", "dog", 0.6)] {
            let mut sample = Sample::new(format!("/images/{}.png", gt));
            sample
                .set_label("ground_truth", Classification::new(gt))
                .unwrap();
            sample
                .set_label("predictions", Classification::new(pred).with_confidence(conf))
                .unwrap();
            dataset.add_sample(sample).unwrap();
        }
        dataset
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("eval"));
        assert!(is_identifier("_eval_2"));
        assert!(!is_identifier("2eval"));
        assert!(!is_identifier("eval-key"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_simple_records_run() {
        let mut dataset = pets();
        let results = evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new().eval_key("eval"),
        )
        .unwrap();

        assert!(results.as_binary().is_none());
        assert_eq!(list_evaluations(&dataset), vec!["eval".to_string()]);
        let info = get_evaluation_info(&dataset, "eval").unwrap();
        assert_eq!(info.pred_field, "predictions");
        assert_eq!(info.config.method(), "simple");
        assert_eq!(
            dataset.values("eval").unwrap(),
            vec![
                serde_json::json!(true),
                serde_json::json!(false),
                serde_json::json!(false)
            ]
        );
    }

    #[test]
    fn test_run_key_validation() {
        let mut dataset = pets();
        let opts = || EvaluateOptions::new().eval_key("eval");
        evaluate_classifications(&mut dataset, "predictions", "ground_truth", opts()).unwrap();

        let again = evaluate_classifications(&mut dataset, "predictions", "ground_truth", opts());
        assert!(matches!(again, Err(Error::InvalidInput(_))));

        let clash = evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new().eval_key("predictions"),
        );
        assert!(clash.is_err());

        let bad = evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new().eval_key("not a key"),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_delete_evaluation() {
        let mut dataset = pets();
        evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new().eval_key("eval"),
        )
        .unwrap();

        let info = delete_evaluation(&mut dataset, "eval").unwrap();
        assert_eq!(info.eval_key, "eval");
        assert!(list_evaluations(&dataset).is_empty());
        assert!(!dataset.has_field("eval"));
        assert!(delete_evaluation(&mut dataset, "eval").is_err());
    }

    #[test]
    fn test_without_key_writes_nothing() {
        let mut dataset = pets();
        evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new(),
        )
        .unwrap();
        assert!(list_evaluations(&dataset).is_empty());
        assert!(!dataset.has_field("eval"));
    }

    #[test]
    fn test_binary_dispatch() {
        let mut dataset = pets();
        let results = evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new()
                .method("binary", serde_json::Value::Null)
                .classes(["dog", "cat"])
                .eval_key("bin"),
        )
        .unwrap();

        let binary = results.as_binary().unwrap();
        assert_eq!(binary.pos_label(), "cat");
        assert_eq!(
            dataset.values("bin").unwrap(),
            vec![
                serde_json::json!("TP"),
                serde_json::json!("FP"),
                serde_json::json!("FN")
            ]
        );
    }

    #[test]
    fn test_failed_validation_leaves_no_trace() {
        let mut dataset = pets();
        let result = evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new().method("top-k", serde_json::Value::Null).eval_key("topk"),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(!dataset.has_field("topk"));
        assert!(list_evaluations(&dataset).is_empty());
    }

    #[test]
    fn test_explicit_top_k_zero_rejected() {
        let mut dataset = Dataset::new("logits");
        let mut sample = Sample::new("/images/0.png");
        sample.set_label("ground_truth", Classification::new("cat")).unwrap();
        sample
            .set_label("predictions", Classification::new("cat").with_logits(vec![5.0, 0.0]))
            .unwrap();
        dataset.add_sample(sample).unwrap();

        let result = evaluate_classifications(
            &mut dataset,
            "predictions",
            "ground_truth",
            EvaluateOptions::new()
                .config(EvaluationConfig::TopK(TopKConfig { k: 0 }))
                .classes(["cat", "dog"])
                .eval_key("topk"),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(!dataset.has_field("topk"));
        assert!(list_evaluations(&dataset).is_empty());
    }
}
