//! Command implementations for the verdict CLI.
//!
//! Each command exposes `run(args, ...) -> Result<(), String>`.

pub mod evals;
pub mod evaluate;
pub mod ingest;

pub use evals::EvalsArgs;
pub use evaluate::EvaluateArgs;
pub use ingest::IngestArgs;
