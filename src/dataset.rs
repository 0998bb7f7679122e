//! In-memory dataset of samples, persistable as JSON.
//!
//! # Example
//!
//! ```rust
//! use verdict::{Classification, Dataset, Sample, SampleCollection};
//!
//! let mut dataset = Dataset::new("pets");
//! let mut sample = Sample::new("/data/pets/001.png").with_tag("train");
//! sample.set_label("ground_truth", Classification::new("cat")).unwrap();
//! dataset.add_sample(sample).unwrap();
//!
//! let labels = dataset.values("ground_truth.label").unwrap();
//! assert_eq!(labels, vec![serde_json::json!("cat")]);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::{lookup_path, FieldKind, RunRegistry, SampleCollection};
use crate::eval::EvaluationInfo;
use crate::labels::Classification;
use crate::{Error, Result};

/// Fields every sample has, which cannot be declared, written or deleted.
pub const BUILTIN_FIELDS: &[&str] = &["id", "filepath", "tags"];

// =============================================================================
// Sample
// =============================================================================

/// A single media sample with its labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Identifier assigned when the sample is added to a dataset.
    #[serde(default)]
    pub id: u64,
    /// Path to the media file.
    pub filepath: PathBuf,
    /// Free-form tags (e.g. the partition name).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Named fields (labels, evaluation outcomes, ...).
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Sample {
    /// Create a sample with no tags or fields.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            id: 0,
            filepath: filepath.into(),
            tags: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replace the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set a field to any serializable value.
    pub fn set_field<T: Serialize>(&mut self, name: &str, value: T) -> Result<()> {
        if BUILTIN_FIELDS.contains(&name) {
            return Err(Error::field(format!("'{}' is a built-in field", name)));
        }
        self.fields
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Set a classification field.
    pub fn set_label(&mut self, name: &str, label: Classification) -> Result<()> {
        self.set_field(name, label)
    }

    /// Raw value of a field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A field decoded as a classification. `None` if absent or not a
    /// classification.
    pub fn label(&self, name: &str) -> Option<Classification> {
        self.fields
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn builtin_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "filepath" => Some(Value::String(self.filepath.to_string_lossy().into_owned())),
            "tags" => Some(Value::from(self.tags.clone())),
            _ => None,
        }
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// An ordered, named collection of samples with a declared field schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    samples: Vec<Sample>,
    #[serde(default)]
    schema: BTreeMap<String, FieldKind>,
    #[serde(default)]
    evaluations: BTreeMap<String, EvaluationInfo>,
    #[serde(default)]
    next_id: u64,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
            schema: BTreeMap::new(),
            evaluations: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Samples in iteration order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterate over samples.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Sample with the given id.
    pub fn get(&self, id: u64) -> Option<&Sample> {
        self.samples.iter().find(|s| s.id == id)
    }

    /// Declared fields and their kinds.
    pub fn field_schema(&self) -> &BTreeMap<String, FieldKind> {
        &self.schema
    }

    /// Add one sample, returning its id.
    pub fn add_sample(&mut self, sample: Sample) -> Result<u64> {
        let ids = self.add_samples(std::iter::once(sample))?;
        Ok(ids[0])
    }

    /// Add samples, returning their ids.
    ///
    /// Field values are checked against the schema (and each other) before
    /// anything is inserted, so a rejected batch leaves the dataset unchanged.
    pub fn add_samples<I>(&mut self, samples: I) -> Result<Vec<u64>>
    where
        I: IntoIterator<Item = Sample>,
    {
        let samples: Vec<Sample> = samples.into_iter().collect();
        let mut schema = self.schema.clone();

        for sample in &samples {
            for (name, value) in &sample.fields {
                if BUILTIN_FIELDS.contains(&name.as_str()) {
                    return Err(Error::field(format!("'{}' is a built-in field", name)));
                }
                match schema.get(name) {
                    Some(kind) if !kind.accepts(value) => {
                        return Err(Error::field(format!(
                            "value {} does not match {:?} field '{}'",
                            value, kind, name
                        )));
                    }
                    Some(_) => {}
                    None => {
                        if let Some(kind) = FieldKind::infer(value) {
                            schema.insert(name.clone(), kind);
                        }
                    }
                }
            }
        }

        self.schema = schema;
        let mut ids = Vec::with_capacity(samples.len());
        for mut sample in samples {
            sample.id = self.next_id;
            self.next_id += 1;
            ids.push(sample.id);
            self.samples.push(sample);
        }

        log::debug!("Added {} samples to dataset '{}'", ids.len(), self.name);
        Ok(ids)
    }

    /// Number of samples carrying each tag.
    pub fn count_tags(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.samples.iter().flat_map(|s| s.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Write the dataset (samples, schema and evaluation runs) as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        log::debug!("Saved dataset '{}' to {}", self.name, path.display());
        Ok(())
    }

    /// Read a dataset written by [`Dataset::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| {
            Error::dataset(format!("failed to open {}: {}", path.display(), e))
        })?;
        let dataset: Dataset = serde_json::from_reader(BufReader::new(file))?;
        Ok(dataset)
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if BUILTIN_FIELDS.contains(&name) {
            return Err(Error::field(format!("'{}' is a built-in field", name)));
        }
        Ok(())
    }
}

impl SampleCollection for Dataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn values(&self, path: &str) -> Result<Vec<Value>> {
        let segments: Vec<&str> = path.split('.').collect();
        let (field, rest) = match segments.split_first() {
            Some((field, rest)) if !field.is_empty() => (*field, rest),
            _ => return Err(Error::field(format!("invalid field path '{}'", path))),
        };

        if BUILTIN_FIELDS.contains(&field) {
            return Ok(self
                .samples
                .iter()
                .map(|s| {
                    s.builtin_value(field)
                        .and_then(|v| lookup_path(&v, rest).cloned())
                        .unwrap_or(Value::Null)
                })
                .collect());
        }

        if !self.schema.contains_key(field) {
            return Err(Error::field(format!(
                "dataset '{}' has no field '{}'",
                self.name, field
            )));
        }

        Ok(self
            .samples
            .iter()
            .map(|s| {
                s.fields
                    .get(field)
                    .and_then(|v| lookup_path(v, rest))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect())
    }

    fn has_field(&self, name: &str) -> bool {
        BUILTIN_FIELDS.contains(&name) || self.schema.contains_key(name)
    }

    fn ensure_field(&mut self, name: &str, kind: FieldKind) -> Result<()> {
        self.check_writable(name)?;
        match self.schema.get(name) {
            Some(existing) if *existing == kind => Ok(()),
            Some(existing) => Err(Error::field(format!(
                "field '{}' already exists with kind {:?}, not {:?}",
                name, existing, kind
            ))),
            None => {
                self.schema.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    fn set_values(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        self.check_writable(name)?;
        let kind = *self
            .schema
            .get(name)
            .ok_or_else(|| Error::field(format!("field '{}' is not declared", name)))?;

        if values.len() != self.samples.len() {
            return Err(Error::field(format!(
                "expected {} values for field '{}', got {}",
                self.samples.len(),
                name,
                values.len()
            )));
        }
        if let Some((idx, bad)) = values.iter().enumerate().find(|(_, v)| !kind.accepts(v)) {
            return Err(Error::field(format!(
                "value {} for sample {} does not match {:?} field '{}'",
                bad, idx, kind, name
            )));
        }

        for (sample, value) in self.samples.iter_mut().zip(values) {
            sample.fields.insert(name.to_string(), value);
        }
        Ok(())
    }

    fn delete_field(&mut self, name: &str) -> Result<()> {
        self.check_writable(name)?;
        if self.schema.remove(name).is_none() {
            return Err(Error::field(format!(
                "dataset '{}' has no field '{}'",
                self.name, name
            )));
        }
        for sample in &mut self.samples {
            sample.fields.remove(name);
        }
        Ok(())
    }
}

impl RunRegistry for Dataset {
    fn list_evaluations(&self) -> Vec<String> {
        self.evaluations.keys().cloned().collect()
    }

    fn evaluation_info(&self, eval_key: &str) -> Option<&EvaluationInfo> {
        self.evaluations.get(eval_key)
    }

    fn save_evaluation_info(&mut self, info: EvaluationInfo) -> Result<()> {
        self.evaluations.insert(info.eval_key.clone(), info);
        Ok(())
    }

    fn remove_evaluation_info(&mut self, eval_key: &str) -> Option<EvaluationInfo> {
        self.evaluations.remove(eval_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labeled(path: &str, gt: &str) -> Sample {
        let mut sample = Sample::new(path);
        sample
            .set_label("ground_truth", Classification::new(gt))
            .unwrap();
        sample
    }

    #[test]
    fn test_add_samples_assigns_ids_and_schema() {
        let mut dataset = Dataset::new("test");
        let ids = dataset
            .add_samples(vec![labeled("a.png", "cat"), labeled("b.png", "dog")])
            .unwrap();

        assert_eq!(ids, vec![0, 1]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.field_schema().get("ground_truth"),
            Some(&FieldKind::Classification)
        );
    }

    #[test]
    fn test_add_samples_rejects_mismatched_kind_atomically() {
        let mut dataset = Dataset::new("test");
        dataset.add_sample(labeled("a.png", "cat")).unwrap();

        let mut bad = Sample::new("b.png");
        bad.set_field("ground_truth", "cat").unwrap();
        let result = dataset.add_samples(vec![labeled("c.png", "dog"), bad]);

        assert!(result.is_err());
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_values_missing_nested_is_null() {
        let mut dataset = Dataset::new("test");
        dataset.add_sample(labeled("a.png", "cat")).unwrap();

        assert_eq!(
            dataset.values("ground_truth.label").unwrap(),
            vec![json!("cat")]
        );
        assert_eq!(
            dataset.values("ground_truth.confidence").unwrap(),
            vec![Value::Null]
        );
        assert!(dataset.values("predictions.label").is_err());
    }

    #[test]
    fn test_builtin_values() {
        let mut dataset = Dataset::new("test");
        dataset
            .add_sample(Sample::new("a.png").with_tags(["train", "rand"]))
            .unwrap();

        assert_eq!(dataset.values("filepath").unwrap(), vec![json!("a.png")]);
        assert_eq!(
            dataset.values("tags").unwrap(),
            vec![json!(["train", "rand"])]
        );
        assert!(dataset.ensure_field("tags", FieldKind::Json).is_err());
    }

    #[test]
    fn test_set_values_checks_length_and_kind() {
        let mut dataset = Dataset::new("test");
        dataset
            .add_samples(vec![labeled("a.png", "cat"), labeled("b.png", "dog")])
            .unwrap();

        assert!(dataset.set_values("eval", vec![json!(true), json!(false)]).is_err());

        dataset.ensure_field("eval", FieldKind::Boolean).unwrap();
        assert!(dataset.set_values("eval", vec![json!(true)]).is_err());
        assert!(dataset.set_values("eval", vec![json!(true), json!("TP")]).is_err());

        dataset
            .set_values("eval", vec![json!(true), Value::Null])
            .unwrap();
        assert_eq!(
            dataset.values("eval").unwrap(),
            vec![json!(true), Value::Null]
        );

        assert!(dataset.ensure_field("eval", FieldKind::String).is_err());
        dataset.ensure_field("eval", FieldKind::Boolean).unwrap();
    }

    #[test]
    fn test_delete_field() {
        let mut dataset = Dataset::new("test");
        dataset.add_sample(labeled("a.png", "cat")).unwrap();
        dataset.ensure_field("eval", FieldKind::Boolean).unwrap();
        dataset.set_values("eval", vec![json!(true)]).unwrap();

        dataset.delete_field("eval").unwrap();
        assert!(!dataset.has_field("eval"));
        assert!(dataset.samples()[0].field("eval").is_none());
        assert!(dataset.delete_field("eval").is_err());
    }

    #[test]
    fn test_count_tags() {
        let mut dataset = Dataset::new("test");
        dataset
            .add_samples(vec![
                Sample::new("a.png").with_tags(["train", "rand"]),
                Sample::new("b.png").with_tag("train"),
                Sample::new("c.png").with_tag("test"),
            ])
            .unwrap();

        let counts = dataset.count_tags();
        assert_eq!(counts.get("train"), Some(&2));
        assert_eq!(counts.get("rand"), Some(&1));
        assert_eq!(counts.get("test"), Some(&1));
    }

    #[test]
    fn test_save_load_preserves_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ds.json");

        let mut dataset = Dataset::new("test");
        dataset.add_sample(labeled("a.png", "cat")).unwrap();
        dataset.save(&path).unwrap();

        let mut loaded = Dataset::load(&path).unwrap();
        assert_eq!(loaded.name(), "test");
        assert_eq!(loaded.samples(), dataset.samples());

        let id = loaded.add_sample(labeled("b.png", "dog")).unwrap();
        assert_eq!(id, 1);
        assert_eq!(
            loaded.get(0).and_then(|s| s.label("ground_truth")),
            Some(Classification::new("cat"))
        );
    }
}
