//! Integration tests for the verdict CLI.

#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use verdict::{Classification, Dataset, Sample};

fn verdict() -> Command {
    Command::cargo_bin("verdict").unwrap()
}

/// Write a three-sample pets dataset with `ground_truth` and `predictions`.
fn write_pets(dir: &Path) -> PathBuf {
    let mut dataset = Dataset::new("pets");
    for (idx, (gt, pred, conf)) in [("cat", "cat", 0.9), ("dog", "cat", 0.4), ("cat", "dog", 0.6)]
        .into_iter()
        .enumerate()
    {
        let mut sample = Sample::new(format!("/images/{}.png", idx));
        sample
            .set_label("ground_truth", Classification::new(gt))
            .unwrap();
        sample
            .set_label("predictions", Classification::new(pred).with_confidence(conf))
            .unwrap();
        dataset.add_sample(sample).unwrap();
    }
    let path = dir.join("pets.json");
    dataset.save(&path).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    verdict()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("evals"));
}

#[test]
fn test_ingest_creates_dataset() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("train_fine.json"),
        r#"{"train/0.png": "apple", "train/1.png": "bee"}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("train_coarse.json"),
        r#"{"train/0.png": "fruit", "train/1.png": "insect"}"#,
    )
    .unwrap();
    let output = dir.path().join("out").join("cifar.json");

    verdict()
        .args(["ingest", "--data-dir"])
        .arg(dir.path())
        .arg("-o")
        .arg(&output)
        .args(["--partition", "train", "--seed", "51"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Ingested 2 samples"));

    let dataset = Dataset::load(&output).unwrap();
    assert_eq!(dataset.name(), "cifar100");
    assert_eq!(dataset.samples().len(), 2);
    assert_eq!(dataset.count_tags().get("train"), Some(&2));
}

#[test]
fn test_ingest_missing_files_fails() {
    let dir = TempDir::new().unwrap();
    verdict()
        .args(["ingest", "--data-dir"])
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path().join("out.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_evaluate_text_report() {
    let dir = TempDir::new().unwrap();
    let path = write_pets(dir.path());

    verdict()
        .arg("evaluate")
        .arg(&path)
        .args(["--pred-field", "predictions", "--confusion-matrix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("precision"))
        .stdout(predicate::str::contains("accuracy 33.3%"))
        .stdout(predicate::str::contains("Confusion matrix"));
}

#[test]
fn test_evaluate_json() {
    let dir = TempDir::new().unwrap();
    let path = write_pets(dir.path());

    let output = verdict()
        .arg("evaluate")
        .arg(&path)
        .args(["-p", "predictions", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["method"], "simple");
    assert_eq!(value["num_samples"], 3);
    let accuracy = value["metrics"]["accuracy"].as_f64().unwrap();
    assert!((accuracy - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(value["classes"], serde_json::json!(["cat", "dog"]));
}

#[test]
fn test_evaluate_binary_curves() {
    let dir = TempDir::new().unwrap();
    let path = write_pets(dir.path());

    verdict()
        .arg("evaluate")
        .arg(&path)
        .args(["-p", "predictions", "--method", "binary", "--classes", "dog,cat", "--curves"])
        .assert()
        .success()
        .stdout(predicate::str::contains("average precision (cat)"))
        .stdout(predicate::str::contains("Precision-recall curve"))
        .stdout(predicate::str::contains("ROC curve"));
}

#[test]
fn test_evaluate_unknown_method_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_pets(dir.path());

    verdict()
        .arg("evaluate")
        .arg(&path)
        .args(["-p", "predictions", "--method", "fuzzy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported evaluation method 'fuzzy'"));
}

#[test]
fn test_evaluate_uses_config_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_pets(dir.path());
    let config = dir.path().join("verdict.toml");
    fs::write(&config, "digits = 4\n").unwrap();

    verdict()
        .arg("--config")
        .arg(&config)
        .arg("evaluate")
        .arg(&path)
        .args(["-p", "predictions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3333"));
}

#[test]
fn test_eval_run_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = write_pets(dir.path());

    verdict()
        .arg("evaluate")
        .arg(&path)
        .args(["-p", "predictions", "--eval-key", "eval", "--quiet"])
        .assert()
        .success();

    verdict()
        .args(["evals", "list"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::eq("eval\n"));

    verdict()
        .args(["evals", "show"])
        .arg(&path)
        .arg("eval")
        .assert()
        .success()
        .stdout(predicate::str::contains("pred_field: predictions"))
        .stdout(predicate::str::contains("method:     simple"));

    // the key is taken now
    verdict()
        .arg("evaluate")
        .arg(&path)
        .args(["-p", "predictions", "--eval-key", "eval"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    verdict()
        .args(["evals", "delete"])
        .arg(&path)
        .arg("eval")
        .assert()
        .success()
        .stderr(predicate::str::contains("Deleted evaluation 'eval'"));

    verdict()
        .args(["evals", "list"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_completions() {
    verdict()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verdict"));
}
