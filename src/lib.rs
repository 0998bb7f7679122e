//! # verdict
//!
//! Classification evaluation for labeled sample collections.
//!
//! - **Evaluation**: `simple` (exact match), `top-k` (over logits) and
//!   `binary` (TP/FP/TN/FN) methods
//! - **Results**: per-class reports, averaged P/R/F, confusion matrices,
//!   PR / ROC curves, average precision
//! - **Runs**: per-sample outcomes persisted under a run key, with a run
//!   registry to list, inspect and delete evaluations
//! - **Ingestion**: CIFAR-style partitions loaded into a [`Dataset`]
//!
//! ## Quick Start
//!
//! ```rust
//! use verdict::{evaluate_classifications, Classification, Dataset, EvaluateOptions, Sample};
//!
//! let mut dataset = Dataset::new("pets");
//! let mut sample = Sample::new("/images/0.png");
//! sample.set_label("ground_truth", Classification::new("cat")).unwrap();
//! sample
//!     .set_label("predictions", Classification::new("cat").with_confidence(0.9))
//!     .unwrap();
//! dataset.add_sample(sample).unwrap();
//!
//! let options = EvaluateOptions::new();
//! let results =
//!     evaluate_classifications(&mut dataset, "predictions", "ground_truth", options).unwrap();
//! print!("{}", results.as_classification().format_report(None, 2));
//! ```
//!
//! ## Storage
//!
//! Evaluation only talks to the [`SampleCollection`] and [`RunRegistry`]
//! traits. [`Dataset`] is an in-memory implementation that persists to
//! JSON.
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! verdict = { version = "0.1", default-features = false }  # library only
//! verdict = "0.1"                                          # + `verdict` CLI
//! ```

#![warn(missing_docs)]

pub mod collection;
pub mod dataset;
mod error;
pub mod eval;
pub mod ingest;
mod labels;

#[cfg(feature = "cli")]
pub mod cli;

pub use collection::{FieldKind, RunRegistry, SampleCollection};
pub use dataset::{Dataset, Sample};
pub use error::{Error, Result};
pub use eval::{
    delete_evaluation, evaluate_classifications, get_evaluation_info, list_evaluations,
    BinaryClassificationResults, ClassificationResults, EvaluateOptions, EvaluationConfig,
    EvaluationInfo, Results,
};
pub use ingest::{ingest_partitions, IngestConfig, IngestSummary};
pub use labels::Classification;

/// Common imports.
pub mod prelude {
    pub use crate::collection::{FieldKind, RunRegistry, SampleCollection};
    pub use crate::eval::{
        delete_evaluation, evaluate_classifications, get_evaluation_info, list_evaluations,
        Average, BinaryClassificationResults, ClassificationResults, EvaluateOptions,
        EvaluationConfig, Results,
    };
    pub use crate::{Classification, Dataset, Error, Result, Sample};
}
