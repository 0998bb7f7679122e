//! Sample collection capability.
//!
//! Evaluation never touches a storage engine directly. It only needs two
//! things from whatever holds the samples:
//!
//! - fetch the values at a dotted field path for every sample, in order
//! - persist one value per sample into a named field, in order
//!
//! [`SampleCollection`] is that narrow interface and [`RunRegistry`] records
//! which evaluations have been run against the collection.
//! [`crate::Dataset`] implements both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::eval::EvaluationInfo;
use crate::{Error, Result};

/// Declared type of a sample field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// `true` / `false`
    Boolean,
    /// Free-form string
    String,
    /// Floating-point number
    Float,
    /// A [`crate::Classification`] object
    Classification,
    /// Any other JSON value
    Json,
}

impl FieldKind {
    /// Whether a value may be stored in a field of this kind. `null` is
    /// accepted everywhere.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (FieldKind::String, Value::String(_)) => true,
            (FieldKind::Float, Value::Number(_)) => true,
            (FieldKind::Classification, Value::Object(map)) => map.contains_key("label"),
            (FieldKind::Json, _) => true,
            _ => false,
        }
    }

    /// Infer the kind of a freshly seen value. Returns `None` for `null`.
    pub fn infer(value: &Value) -> Option<FieldKind> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(FieldKind::Boolean),
            Value::String(_) => Some(FieldKind::String),
            Value::Number(_) => Some(FieldKind::Float),
            Value::Object(map) if map.contains_key("label") => Some(FieldKind::Classification),
            _ => Some(FieldKind::Json),
        }
    }
}

/// Per-field read/write access to an ordered collection of samples.
pub trait SampleCollection {
    /// Number of samples.
    fn len(&self) -> usize;

    /// Whether the collection has no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values at `path` (e.g. `"predictions.label"`) for every sample, in
    /// iteration order. Absent values are `Value::Null`.
    fn values(&self, path: &str) -> Result<Vec<Value>>;

    /// Whether a top-level field with this name is declared.
    fn has_field(&self, name: &str) -> bool;

    /// Declare `name` with `kind` unless it already exists. Fails if the
    /// field exists with an incompatible kind.
    fn ensure_field(&mut self, name: &str, kind: FieldKind) -> Result<()>;

    /// Overwrite `name` on every sample. `values` must have one entry per
    /// sample, in iteration order.
    fn set_values(&mut self, name: &str, values: Vec<Value>) -> Result<()>;

    /// Remove `name` from the schema and from every sample.
    fn delete_field(&mut self, name: &str) -> Result<()>;
}

/// Registry of evaluation runs recorded against a collection.
pub trait RunRegistry {
    /// Keys of all recorded evaluations, sorted.
    fn list_evaluations(&self) -> Vec<String>;

    /// Info for the evaluation with this key.
    fn evaluation_info(&self, eval_key: &str) -> Option<&EvaluationInfo>;

    /// Record an evaluation. Replaces any info with the same key.
    fn save_evaluation_info(&mut self, info: EvaluationInfo) -> Result<()>;

    /// Forget an evaluation, returning its info if it was recorded.
    fn remove_evaluation_info(&mut self, eval_key: &str) -> Option<EvaluationInfo>;
}

// =============================================================================
// Typed extraction
// =============================================================================

/// Values at `path` as optional strings.
pub fn string_values<C: SampleCollection + ?Sized>(
    samples: &C,
    path: &str,
) -> Result<Vec<Option<String>>> {
    samples
        .values(path)?
        .into_iter()
        .enumerate()
        .map(|(idx, value)| match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(Error::field(format!(
                "expected a string at '{}' for sample {}, found {}",
                path, idx, other
            ))),
        })
        .collect()
}

/// Values at `path` as optional floats.
pub fn float_values<C: SampleCollection + ?Sized>(
    samples: &C,
    path: &str,
) -> Result<Vec<Option<f64>>> {
    samples
        .values(path)?
        .into_iter()
        .enumerate()
        .map(|(idx, value)| match value {
            Value::Null => Ok(None),
            Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| {
                Error::field(format!("non-finite number at '{}' for sample {}", path, idx))
            }),
            other => Err(Error::field(format!(
                "expected a number at '{}' for sample {}, found {}",
                path, idx, other
            ))),
        })
        .collect()
}

/// Values at `path` as optional float vectors.
pub fn float_vector_values<C: SampleCollection + ?Sized>(
    samples: &C,
    path: &str,
) -> Result<Vec<Option<Vec<f64>>>> {
    samples
        .values(path)?
        .into_iter()
        .enumerate()
        .map(|(idx, value)| match value {
            Value::Null => Ok(None),
            Value::Array(items) => items
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| {
                        Error::field(format!(
                            "expected numbers in '{}' for sample {}, found {}",
                            path, idx, v
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
                .map(Some),
            other => Err(Error::field(format!(
                "expected an array at '{}' for sample {}, found {}",
                path, idx, other
            ))),
        })
        .collect()
}

/// Walk a dotted path inside a JSON value.
pub(crate) fn lookup_path<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_kind_accepts() {
        assert!(FieldKind::Boolean.accepts(&json!(true)));
        assert!(FieldKind::Boolean.accepts(&Value::Null));
        assert!(!FieldKind::Boolean.accepts(&json!("TP")));
        assert!(FieldKind::String.accepts(&json!("TP")));
        assert!(FieldKind::Classification.accepts(&json!({ "label": "cat" })));
        assert!(!FieldKind::Classification.accepts(&json!({ "name": "cat" })));
        assert!(FieldKind::Json.accepts(&json!([1, 2])));
    }

    #[test]
    fn test_field_kind_infer() {
        assert_eq!(FieldKind::infer(&Value::Null), None);
        assert_eq!(FieldKind::infer(&json!(1.5)), Some(FieldKind::Float));
        assert_eq!(
            FieldKind::infer(&json!({ "label": null })),
            Some(FieldKind::Classification)
        );
        assert_eq!(FieldKind::infer(&json!([1])), Some(FieldKind::Json));
    }

    #[test]
    fn test_lookup_path() {
        let v = json!({ "pred": { "label": "cat", "confidence": 0.5 } });
        assert_eq!(lookup_path(&v, &["pred", "label"]), Some(&json!("cat")));
        assert_eq!(lookup_path(&v, &["pred", "logits"]), None);
        assert_eq!(lookup_path(&v, &["gt", "label"]), None);
    }
}
