//! Ingest command - load labeled partitions into a dataset file

use std::path::PathBuf;

use clap::Parser;

use super::super::output::{color, log_info};
use super::super::utils::{format_error, load_dataset, log_success, save_dataset};

use crate::{ingest_partitions, Dataset, IngestConfig};

/// Ingest labeled partitions into a dataset file
#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Directory holding `<partition>_fine.json` / `<partition>_coarse.json`
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Dataset file to write. Existing datasets are appended to
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Dataset name (new datasets only)
    #[arg(short, long, default_value = "cifar100")]
    pub name: String,

    /// Partition to ingest (repeatable)
    #[arg(short, long = "partition", value_name = "NAME", default_values = ["train", "test"])]
    pub partitions: Vec<String>,

    /// Fraction of samples that receive the random tag
    #[arg(long, default_value_t = 0.3)]
    pub rand_fraction: f64,

    /// Name of the random tag
    #[arg(long, default_value = "rand")]
    pub rand_tag: String,

    /// RNG seed for reproducible tagging
    #[arg(long)]
    pub seed: Option<u64>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl IngestArgs {
    fn ingest_config(&self) -> IngestConfig {
        let mut config = IngestConfig::new(&self.data_dir)
            .dataset_name(&self.name)
            .partitions(&self.partitions)
            .rand_fraction(self.rand_fraction)
            .rand_tag(&self.rand_tag);
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        config
    }
}

/// Run the ingest command
pub fn run(args: IngestArgs) -> Result<(), String> {
    let config = args.ingest_config();

    let mut dataset = if args.output.exists() {
        log_info(
            &format!("Appending to existing dataset {}", args.output.display()),
            args.quiet,
        );
        load_dataset(&args.output)?
    } else {
        Dataset::new(&config.dataset_name)
    };

    let summary = ingest_partitions(&mut dataset, &config)
        .map_err(|e| format_error("ingest partitions", &e.to_string()))?;
    save_dataset(&dataset, &args.output)?;

    if !args.quiet {
        for (partition, count) in &summary.partitions {
            eprintln!("  {:<12} {} samples", color("1", partition), count);
        }
        eprintln!(
            "  {:<12} {} samples",
            format!("'{}'", config.rand_tag),
            summary.num_rand
        );
    }
    log_success(
        &format!(
            "Ingested {} samples into '{}' in {:.2}s",
            summary.total(),
            dataset.name(),
            summary.elapsed.as_secs_f64()
        ),
        args.quiet,
    );
    Ok(())
}
