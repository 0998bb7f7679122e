//! Utility functions for CLI commands

use std::path::{Path, PathBuf};

use crate::Dataset;

/// Format error message consistently
pub fn format_error(operation: &str, details: &str) -> String {
    format!("Failed to {}: {}", operation, details)
}

/// Log success message with color (respects quiet flag)
pub fn log_success(msg: &str, quiet: bool) {
    if !quiet {
        use super::output::color;
        eprintln!("{} {}", color("32", "✓"), msg);
    }
}

/// User config directory for verdict, if the platform has one
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|mut dir| {
        dir.push("verdict");
        dir
    })
}

/// Load a dataset file
pub fn load_dataset(path: &Path) -> Result<Dataset, String> {
    Dataset::load(path).map_err(|e| {
        format_error(&format!("load dataset {}", path.display()), &e.to_string())
    })
}

/// Save a dataset file
pub fn save_dataset(dataset: &Dataset, path: &Path) -> Result<(), String> {
    dataset
        .save(path)
        .map_err(|e| format_error(&format!("save dataset {}", path.display()), &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error() {
        assert_eq!(format_error("load", "missing"), "Failed to load: missing");
    }

    #[test]
    fn test_dataset_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("d.json");
        save_dataset(&Dataset::new("d"), &path).unwrap();
        assert_eq!(load_dataset(&path).unwrap().name(), "d");

        let err = load_dataset(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.starts_with("Failed to load dataset"));
    }
}
