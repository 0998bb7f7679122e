//! CLI argument parsing and structure definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands;

/// Classification evaluation CLI
#[derive(Parser)]
#[command(name = "verdict")]
#[command(
    author,
    version,
    about = "Classification evaluation CLI - ingest labeled samples, evaluate predictions, manage runs",
    long_about = r#"
verdict - classification evaluation for labeled sample collections

METHODS:
  simple   - correct iff the predicted label equals the ground truth
  top-k    - correct iff the ground truth is among the k largest logits
  binary   - TP / FN / TN / FP against a (negative, positive) class pair

EXAMPLES:
  verdict ingest --data-dir data/cifar100 -o cifar100.json
  verdict evaluate cifar100.json --pred-field predictions --gt-field ground_truth_fine
  verdict evaluate pets.json -p predictions --method binary --classes dog,cat --eval-key bin
  verdict evals list pets.json
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Show info-level logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults file (TOML). Falls back to `verdict.toml` in the user config dir
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Top-level subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Ingest labeled partitions into a dataset file
    #[command(visible_alias = "i")]
    Ingest(commands::IngestArgs),

    /// Evaluate predicted labels against ground truth
    #[command(visible_alias = "e")]
    Evaluate(commands::EvaluateArgs),

    /// List, inspect or delete recorded evaluations
    Evals(commands::EvalsArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_evaluate() {
        let cli = Cli::parse_from([
            "verdict",
            "evaluate",
            "pets.json",
            "--pred-field",
            "predictions",
            "--classes",
            "dog,cat",
            "--method",
            "binary",
        ]);
        match cli.command {
            Commands::Evaluate(args) => {
                assert_eq!(args.pred_field, "predictions");
                assert_eq!(args.classes, vec!["dog".to_string(), "cat".to_string()]);
                assert_eq!(args.method.as_deref(), Some("binary"));
            }
            _ => panic!("expected evaluate"),
        }
    }
}
