//! Evaluate command - compare predicted labels against ground truth

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use super::super::config::{CliDefaults, DEFAULT_DIGITS, DEFAULT_GT_FIELD};
use super::super::output::{color, format_pct, log_info, score_color, write_output};
use super::super::utils::{format_error, load_dataset, log_success, save_dataset};

use crate::eval::{Average, EvaluateOptions, EvaluationConfig, Results, DEFAULT_MISSING};
use crate::{evaluate_classifications, SampleCollection};

/// Evaluate predicted labels against ground truth
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Dataset file
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Field holding the predicted classifications
    #[arg(short, long)]
    pub pred_field: String,

    /// Field holding the ground truth classifications [default: ground_truth]
    #[arg(short, long)]
    pub gt_field: Option<String>,

    /// Evaluation method: simple, top-k, binary [default: simple]
    #[arg(short, long)]
    pub method: Option<String>,

    /// k for top-k evaluation [default: 5]
    #[arg(short)]
    pub k: Option<usize>,

    /// Ordered classes, comma separated. Required for top-k and binary (neg,pos)
    #[arg(short, long, value_delimiter = ',')]
    pub classes: Vec<String>,

    /// Sentinel for absent labels [default: none]
    #[arg(long)]
    pub missing: Option<String>,

    /// Store per-sample outcomes under this key and save the dataset
    #[arg(short, long)]
    pub eval_key: Option<String>,

    /// Averaging for the summary metrics
    #[arg(long, default_value = "micro")]
    pub average: Average,

    /// Report decimals [default: 2]
    #[arg(long)]
    pub digits: Option<usize>,

    /// Also print the confusion matrix
    #[arg(long)]
    pub confusion_matrix: bool,

    /// Also plot the PR and ROC curves (binary only)
    #[arg(long)]
    pub curves: bool,

    /// Output JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Write output to file
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl EvaluateArgs {
    /// Resolve flags and defaults into library options.
    pub fn options(&self, defaults: &CliDefaults) -> Result<EvaluateOptions, String> {
        let method = self.method.clone().or_else(|| defaults.method.clone());
        let method_name = method.as_deref().unwrap_or("simple");

        let k = self
            .k
            .or(if method_name == "top-k" { defaults.k } else { None });
        let params = match k {
            Some(k) => json!({ "k": k }),
            None => serde_json::Value::Null,
        };
        let config = EvaluationConfig::from_method(Some(method_name), params)
            .map_err(|e| format_error("configure evaluation", &e.to_string()))?;

        let mut options = EvaluateOptions::new().config(config).missing(
            self.missing
                .clone()
                .or_else(|| defaults.missing.clone())
                .unwrap_or_else(|| DEFAULT_MISSING.to_string()),
        );
        if !self.classes.is_empty() {
            options = options.classes(self.classes.iter().cloned());
        }
        if let Some(key) = &self.eval_key {
            options = options.eval_key(key.clone());
        }
        Ok(options)
    }

    fn gt_field(&self, defaults: &CliDefaults) -> String {
        self.gt_field
            .clone()
            .or_else(|| defaults.gt_field.clone())
            .unwrap_or_else(|| DEFAULT_GT_FIELD.to_string())
    }

    fn digits(&self, defaults: &CliDefaults) -> usize {
        self.digits.or(defaults.digits).unwrap_or(DEFAULT_DIGITS)
    }
}

/// Run the evaluate command
pub fn run(args: EvaluateArgs, defaults: &CliDefaults) -> Result<(), String> {
    let options = args.options(defaults)?;
    let method = options
        .config
        .map(|c| c.to_string())
        .unwrap_or_default();
    let gt_field = args.gt_field(defaults);
    let digits = args.digits(defaults);

    let mut dataset = load_dataset(&args.dataset)?;
    log_info(
        &format!(
            "Evaluating '{}' against '{}' on {} samples ({})",
            args.pred_field,
            gt_field,
            dataset.len(),
            method
        ),
        args.quiet || args.json,
    );

    let results = evaluate_classifications(&mut dataset, &args.pred_field, &gt_field, options)
        .map_err(|e| format_error("evaluate", &e.to_string()))?;

    if let Some(key) = &args.eval_key {
        save_dataset(&dataset, &args.dataset)?;
        log_success(
            &format!("Saved evaluation '{}' to {}", key, args.dataset.display()),
            args.quiet || args.json,
        );
    }

    let content = if args.json {
        render_json(&args, &method, &results)?
    } else {
        render_text(&args, &results, digits)?
    };
    write_output(&content, args.output.as_deref())
}

fn render_text(args: &EvaluateArgs, results: &Results, digits: usize) -> Result<String, String> {
    let base = results.as_classification();
    let metrics = base.metrics(None, args.average, 1.0);

    let mut out = String::new();
    out.push_str(&base.format_report(None, digits));
    out.push('\n');
    out.push_str(&format!(
        "accuracy {}  precision {}  recall {}  f1 {}  ({} avg)\n",
        color(score_color(metrics.accuracy), &format_pct(metrics.accuracy)),
        format_pct(metrics.precision),
        format_pct(metrics.recall),
        format_pct(metrics.fscore),
        args.average
    ));

    if let Some(binary) = results.as_binary() {
        let ap = binary
            .average_precision()
            .map_err(|e| format_error("compute average precision", &e.to_string()))?;
        out.push_str(&format!(
            "average precision ({}) {:.4}\n",
            binary.pos_label(),
            ap
        ));
        if args.curves {
            let pr = binary
                .plot_pr_curve()
                .map_err(|e| format_error("plot PR curve", &e.to_string()))?;
            let roc = binary
                .plot_roc_curve()
                .map_err(|e| format_error("plot ROC curve", &e.to_string()))?;
            out.push('\n');
            out.push_str(&pr.render());
            out.push('\n');
            out.push_str(&roc.render());
        }
    } else if args.curves {
        log_info("PR / ROC curves are only available for binary evaluations", args.quiet);
    }

    if args.confusion_matrix {
        out.push('\n');
        out.push_str(&base.plot_confusion_matrix(None, true).render());
    }
    Ok(out)
}

fn render_json(args: &EvaluateArgs, method: &str, results: &Results) -> Result<String, String> {
    let base = results.as_classification();
    let mut value = json!({
        "method": method,
        "eval_key": args.eval_key,
        "num_samples": base.len(),
        "classes": base.classes,
        "average": args.average,
        "metrics": base.metrics(None, args.average, 1.0),
        "report": base.report(None),
    });

    if args.confusion_matrix {
        value["confusion_matrix"] = json!(base.confusion_matrix(None));
    }
    if let Some(binary) = results.as_binary() {
        let ap = binary
            .average_precision()
            .map_err(|e| format_error("compute average precision", &e.to_string()))?;
        value["pos_label"] = json!(binary.pos_label());
        value["average_precision"] = json!(ap);
    }

    let mut text = serde_json::to_string_pretty(&value)
        .map_err(|e| format_error("serialize results", &e.to_string()))?;
    text.push('\n');
    Ok(text)
}
