//! Defaults file for the CLI.
//!
//! ```toml
//! method = "top-k"
//! k = 3
//! missing = "none"
//! gt_field = "ground_truth"
//! digits = 2
//! ```
//!
//! Command-line flags override every value here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::utils::{format_error, get_config_dir};

/// Name of the defaults file looked up in the user config dir.
pub const CONFIG_FILE_NAME: &str = "verdict.toml";

/// Fallback ground truth field.
pub const DEFAULT_GT_FIELD: &str = "ground_truth";

/// Fallback report precision.
pub const DEFAULT_DIGITS: usize = 2;

/// Values loaded from the defaults file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliDefaults {
    /// Evaluation method name.
    pub method: Option<String>,
    /// `k` for top-k evaluation.
    pub k: Option<usize>,
    /// Missing-label sentinel.
    pub missing: Option<String>,
    /// Ground truth field.
    pub gt_field: Option<String>,
    /// Report precision.
    pub digits: Option<usize>,
}

impl CliDefaults {
    /// Parse a TOML defaults document.
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| format_error("parse config", &e.to_string()))
    }

    /// Load from an explicit path. The file must exist.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format_error(&format!("read config {}", path.display()), &e.to_string()))?;
        Self::from_toml(&text)
    }

    /// Load from `path` if given, otherwise from the user config dir when a
    /// defaults file exists there. No file means empty defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = path {
            return Self::from_path(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading CLI defaults from {}", path.display());
                Self::from_path(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string(self).map_err(|e| format_error("serialize config", &e.to_string()))
    }
}

/// `<config dir>/verdict.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
