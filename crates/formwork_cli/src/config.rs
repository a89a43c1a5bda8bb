//! Configuration file lookup
//!
//! An explicit `--config` path must exist. Without one, `formwork.toml` in
//! the current directory is used when present, and defaults otherwise.

use anyhow::{Context, Result};
use formwork_core::FormworkConfig;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE: &str = "formwork.toml";

/// Load configuration from `explicit`, or from `./formwork.toml` if present
pub fn load(explicit: Option<&Path>) -> Result<FormworkConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = PathBuf::from(CONFIG_FILE);
            if !candidate.exists() {
                tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                return Ok(FormworkConfig::default());
            }
            candidate
        }
    };

    FormworkConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}
