//! Partition ingestion.
//!
//! Loads CIFAR-style labeled image partitions into a [`Dataset`]. Each
//! partition `<p>` is described by two JSON objects in the data directory,
//! mapping relative image paths to labels:
//!
//! ```text
//! <data_dir>/<p>_fine.json    {"train/0.png": "apple", ...}
//! <data_dir>/<p>_coarse.json  {"train/0.png": "fruit_and_vegetables", ...}
//! ```
//!
//! Every image becomes a sample tagged with its partition, holding a
//! `ground_truth_fine` and a `ground_truth_coarse` classification. A random
//! fraction of samples also receives an extra tag (`rand` by default), for
//! drawing ad-hoc subsets.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Classification, Dataset, Error, Result, Sample};

/// Field holding the fine-grained label.
pub const FINE_FIELD: &str = "ground_truth_fine";

/// Field holding the coarse label.
pub const COARSE_FIELD: &str = "ground_truth_coarse";

/// Options for [`ingest_partitions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Dataset name.
    pub dataset_name: String,
    /// Directory holding the label files; image paths are relative to it.
    pub data_dir: PathBuf,
    /// Partitions to ingest, in order.
    pub partitions: Vec<String>,
    /// Probability that a sample gets the random tag.
    pub rand_fraction: f64,
    /// Name of the random tag.
    pub rand_tag: String,
    /// RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dataset_name: "cifar100".to_string(),
            data_dir: PathBuf::from("data").join("cifar100"),
            partitions: vec!["train".to_string(), "test".to_string()],
            rand_fraction: 0.3,
            rand_tag: "rand".to_string(),
            seed: None,
        }
    }
}

impl IngestConfig {
    /// Defaults reading from `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Set the dataset name.
    pub fn dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = name.into();
        self
    }

    /// Set the partitions to ingest.
    pub fn partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partitions = partitions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the random-tag probability (clamped to `[0, 1]`).
    pub fn rand_fraction(mut self, fraction: f64) -> Self {
        self.rand_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Set the random tag name.
    pub fn rand_tag(mut self, tag: impl Into<String>) -> Self {
        self.rand_tag = tag.into();
        self
    }

    /// Fix the RNG seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn fine_labels_path(&self, partition: &str) -> PathBuf {
        self.data_dir.join(format!("{}_fine.json", partition))
    }

    fn coarse_labels_path(&self, partition: &str) -> PathBuf {
        self.data_dir.join(format!("{}_coarse.json", partition))
    }
}

/// What [`ingest_partitions`] added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    /// Dataset name.
    pub dataset_name: String,
    /// Samples added per partition, in ingestion order.
    pub partitions: Vec<(String, usize)>,
    /// Samples that received the random tag.
    pub num_rand: usize,
    /// Wall time spent ingesting.
    pub elapsed: Duration,
}

impl IngestSummary {
    /// Total samples added.
    pub fn total(&self) -> usize {
        self.partitions.iter().map(|(_, n)| n).sum()
    }
}

/// Ingest every configured partition into `dataset`.
///
/// Each partition is added atomically: a partition whose coarse labels miss
/// an image listed in its fine labels fails before any of its samples are
/// added. Partitions ingested earlier stay in the dataset.
pub fn ingest_partitions(dataset: &mut Dataset, config: &IngestConfig) -> Result<IngestSummary> {
    let start = Instant::now();
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut partitions = Vec::with_capacity(config.partitions.len());
    let mut num_rand = 0;

    for partition in &config.partitions {
        log::info!("Ingesting '{}' partition", partition);

        let fine_labels = read_labels(&config.fine_labels_path(partition))?;
        let coarse_labels: HashMap<String, String> =
            read_labels(&config.coarse_labels_path(partition))?.into_iter().collect();

        let mut samples = Vec::with_capacity(fine_labels.len());
        for (rel_img_path, fine) in fine_labels {
            let coarse = coarse_labels.get(&rel_img_path).ok_or_else(|| {
                Error::dataset(format!(
                    "no coarse label for '{}' in partition '{}'",
                    rel_img_path, partition
                ))
            })?;

            let mut sample = Sample::new(config.data_dir.join(&rel_img_path)).with_tag(partition);
            if rng.gen::<f64>() < config.rand_fraction {
                sample = sample.with_tag(&config.rand_tag);
                num_rand += 1;
            }
            sample.set_label(FINE_FIELD, Classification::new(fine))?;
            sample.set_label(COARSE_FIELD, Classification::new(coarse.clone()))?;
            samples.push(sample);
        }

        let ids = dataset.add_samples(samples)?;
        log::debug!("Added {} samples from '{}'", ids.len(), partition);
        partitions.push((partition.clone(), ids.len()));
    }

    let summary = IngestSummary {
        dataset_name: config.dataset_name.clone(),
        partitions,
        num_rand,
        elapsed: start.elapsed(),
    };
    log::info!(
        "'{}' ingest time: {:.2}s",
        summary.dataset_name,
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}

/// Read a `{relative_path: label}` JSON object. Entries come back in file
/// order.
fn read_labels(path: &Path) -> Result<Vec<(String, String)>> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::dataset(format!("failed to read labels from {}: {}", path.display(), e))
    })?;
    let labels: serde_json::Map<String, Value> = serde_json::from_str(&text).map_err(|e| {
        Error::dataset(format!("invalid labels file {}: {}", path.display(), e))
    })?;
    labels
        .into_iter()
        .map(|(rel_img_path, label)| match label {
            Value::String(label) => Ok((rel_img_path, label)),
            other => Err(Error::dataset(format!(
                "invalid labels file {}: label for '{}' is not a string: {}",
                path.display(),
                rel_img_path,
                other
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::SampleCollection;
    use tempfile::TempDir;

    fn write_partition(dir: &Path, partition: &str, items: &[(&str, &str, &str)]) {
        let fine: serde_json::Map<_, _> =
            items.iter().map(|(p, f, _)| (p.to_string(), Value::from(*f))).collect();
        let coarse: serde_json::Map<_, _> =
            items.iter().map(|(p, _, c)| (p.to_string(), Value::from(*c))).collect();
        fs::write(
            dir.join(format!("{}_fine.json", partition)),
            serde_json::to_string(&fine).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.join(format!("{}_coarse.json", partition)),
            serde_json::to_string(&coarse).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_ingest_two_partitions() {
        let dir = TempDir::new().unwrap();
        write_partition(
            dir.path(),
            "train",
            &[("train/0.png", "apple", "fruit"), ("train/1.png", "bee", "insect")],
        );
        write_partition(dir.path(), "test", &[("test/0.png", "tulip", "flower")]);

        let config = IngestConfig::new(dir.path()).seed(7);
        let mut dataset = Dataset::new(&config.dataset_name);
        let summary = ingest_partitions(&mut dataset, &config).unwrap();

        assert_eq!(summary.total(), 3);
        assert_eq!(
            summary.partitions,
            vec![("train".to_string(), 2), ("test".to_string(), 1)]
        );

        let first = &dataset.samples()[0];
        assert_eq!(first.filepath, dir.path().join("train/0.png"));
        assert_eq!(first.tags[0], "train");
        assert_eq!(first.label(FINE_FIELD).unwrap().label.as_deref(), Some("apple"));
        assert_eq!(first.label(COARSE_FIELD).unwrap().label.as_deref(), Some("fruit"));

        let coarse =
            crate::collection::string_values(&dataset, "ground_truth_coarse.label").unwrap();
        assert_eq!(coarse.len(), dataset.len());
    }

    #[test]
    fn test_rand_tag_fraction_extremes() {
        let dir = TempDir::new().unwrap();
        write_partition(
            dir.path(),
            "train",
            &[("a.png", "x", "y"), ("b.png", "x", "y"), ("c.png", "x", "y")],
        );

        let all = IngestConfig::new(dir.path()).partitions(["train"]).rand_fraction(1.0).seed(1);
        let mut dataset = Dataset::new("all");
        let summary = ingest_partitions(&mut dataset, &all).unwrap();
        assert_eq!(summary.num_rand, 3);
        assert_eq!(dataset.count_tags().get("rand"), Some(&3));

        let none = all.clone().rand_fraction(0.0);
        let mut dataset = Dataset::new("none");
        let summary = ingest_partitions(&mut dataset, &none).unwrap();
        assert_eq!(summary.num_rand, 0);
        assert_eq!(dataset.count_tags().get("rand"), None);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let dir = TempDir::new().unwrap();
        let items: Vec<(String, &str, &str)> =
            (0..50).map(|i| (format!("{}.png", i), "x", "y")).collect();
        let items: Vec<(&str, &str, &str)> =
            items.iter().map(|(p, f, c)| (p.as_str(), *f, *c)).collect();
        write_partition(dir.path(), "train", &items);

        let config = IngestConfig::new(dir.path()).partitions(["train"]).seed(42);
        let tags = |config: &IngestConfig| {
            let mut dataset = Dataset::new("d");
            ingest_partitions(&mut dataset, config).unwrap();
            dataset.samples().iter().map(|s| s.tags.clone()).collect::<Vec<_>>()
        };
        assert_eq!(tags(&config), tags(&config));
    }

    #[test]
    fn test_missing_coarse_label_fails_partition() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("train_fine.json"), r#"{"a.png": "x"}"#).unwrap();
        fs::write(dir.path().join("train_coarse.json"), r#"{}"#).unwrap();

        let config = IngestConfig::new(dir.path()).partitions(["train"]);
        let mut dataset = Dataset::new("d");
        let err = ingest_partitions(&mut dataset, &config).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_samples_follow_label_file_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("train_fine.json"),
            r#"{"train/2.png": "bee", "train/10.png": "apple", "train/1.png": "tulip"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("train_coarse.json"),
            r#"{"train/1.png": "flower", "train/10.png": "fruit", "train/2.png": "insect"}"#,
        )
        .unwrap();

        let config = IngestConfig::new(dir.path()).partitions(["train"]).seed(3);
        let mut dataset = Dataset::new("d");
        ingest_partitions(&mut dataset, &config).unwrap();

        let paths: Vec<PathBuf> = dataset.samples().iter().map(|s| s.filepath.clone()).collect();
        let expected: Vec<PathBuf> = ["train/2.png", "train/10.png", "train/1.png"]
            .iter()
            .map(|p| dir.path().join(p))
            .collect();
        assert_eq!(paths, expected);
        assert_eq!(
            dataset.samples()[1].label(COARSE_FIELD).unwrap().label.as_deref(),
            Some("fruit")
        );
    }

    #[test]
    fn test_non_string_label_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("train_fine.json"), r#"{"a.png": 3}"#).unwrap();
        fs::write(dir.path().join("train_coarse.json"), r#"{"a.png": "y"}"#).unwrap();

        let config = IngestConfig::new(dir.path()).partitions(["train"]);
        let mut dataset = Dataset::new("d");
        let err = ingest_partitions(&mut dataset, &config).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn test_missing_files() {
        let dir = TempDir::new().unwrap();
        let config = IngestConfig::new(dir.path()).partitions(["train"]);
        let mut dataset = Dataset::new("d");
        assert!(ingest_partitions(&mut dataset, &config).is_err());
    }
}
