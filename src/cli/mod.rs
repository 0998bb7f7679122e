//! CLI library modules for the verdict binary.
//!
//! Kept in the library so the commands can be tested without spawning the
//! binary.

pub mod commands;
pub mod config;
pub mod output;
pub mod parser;
pub mod utils;
