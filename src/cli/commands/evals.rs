//! Evals command - list, inspect and delete recorded evaluations

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::super::output::{color, write_output};
use super::super::utils::{format_error, load_dataset, log_success, save_dataset};

use crate::{delete_evaluation, get_evaluation_info, list_evaluations};

/// List, inspect or delete recorded evaluations
#[derive(Parser, Debug)]
pub struct EvalsArgs {
    /// Action to perform
    #[command(subcommand)]
    pub action: EvalsAction,
}

/// Evals subcommands
#[derive(Subcommand, Debug)]
pub enum EvalsAction {
    /// List evaluation keys
    #[command(visible_alias = "ls")]
    List {
        /// Dataset file
        dataset: PathBuf,
    },
    /// Show the recorded info of an evaluation
    Show {
        /// Dataset file
        dataset: PathBuf,
        /// Evaluation key
        key: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an evaluation and its per-sample field
    #[command(visible_alias = "rm")]
    Delete {
        /// Dataset file
        dataset: PathBuf,
        /// Evaluation key
        key: String,
        /// Minimal output
        #[arg(short, long)]
        quiet: bool,
    },
}

/// Run the evals command
pub fn run(args: EvalsArgs) -> Result<(), String> {
    match args.action {
        EvalsAction::List { dataset } => {
            let dataset = load_dataset(&dataset)?;
            let mut out = String::new();
            for key in list_evaluations(&dataset) {
                out.push_str(&key);
                out.push('\n');
            }
            write_output(&out, None)
        }
        EvalsAction::Show { dataset, key, json } => {
            let dataset = load_dataset(&dataset)?;
            let info = get_evaluation_info(&dataset, &key)
                .map_err(|e| format_error("show evaluation", &e.to_string()))?;
            let out = if json {
                let mut text = serde_json::to_string_pretty(&info)
                    .map_err(|e| format_error("serialize evaluation", &e.to_string()))?;
                text.push('\n');
                text
            } else {
                let mut text = format!(
                    "{}\n  method:     {}\n  pred_field: {}\n  gt_field:   {}\n",
                    color("1", &info.eval_key),
                    info.config,
                    info.pred_field,
                    info.gt_field
                );
                if let Some(classes) = &info.classes {
                    text.push_str(&format!("  classes:    {}\n", classes.join(", ")));
                }
                text.push_str(&format!("  timestamp:  {}\n", info.timestamp));
                text
            };
            write_output(&out, None)
        }
        EvalsAction::Delete {
            dataset: path,
            key,
            quiet,
        } => {
            let mut dataset = load_dataset(&path)?;
            delete_evaluation(&mut dataset, &key)
                .map_err(|e| format_error("delete evaluation", &e.to_string()))?;
            save_dataset(&dataset, &path)?;
            log_success(&format!("Deleted evaluation '{}'", key), quiet);
            Ok(())
        }
    }
}
