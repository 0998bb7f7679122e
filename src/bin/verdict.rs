//! verdict - classification evaluation CLI
//!
//! # Usage
//!
//! ```bash
//! # Load CIFAR-style partitions into a dataset file
//! verdict ingest --data-dir data/cifar100 -o cifar100.json --seed 51
//!
//! # Evaluate a prediction field and store per-sample outcomes
//! verdict evaluate cifar100.json -p predictions -g ground_truth_fine -e eval
//!
//! # Top-k over logits
//! verdict evaluate cifar100.json -p predictions -m top-k -k 3 -c apple,bee,tulip
//!
//! # Manage recorded evaluations
//! verdict evals list cifar100.json
//! verdict evals delete cifar100.json eval
//! ```

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use verdict::cli::commands::{evals, evaluate, ingest};
use verdict::cli::config::CliDefaults;
use verdict::cli::output::color;
use verdict::cli::parser::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result: Result<(), String> = match cli.command {
        Commands::Ingest(args) => ingest::run(args),
        Commands::Evaluate(args) => CliDefaults::load(cli.config.as_deref())
            .and_then(|defaults| evaluate::run(args, &defaults)),
        Commands::Evals(args) => evals::run(args),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "verdict", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}
