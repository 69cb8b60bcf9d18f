//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sizing_lib::{Statistic, ValidationMode};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Defaults read from `~/.config/rightsize/config.json`; command-line flags
/// take precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the exported sheets
    pub input_dir: Option<PathBuf>,
    pub statistic: Option<Statistic>,
    pub format: Option<OutputFormat>,
    /// Visible columns for `vms` and `export`
    pub columns: Option<Vec<String>>,
    pub validation: Option<ValidationMode>,
}

impl Config {
    /// Load configuration from the user config file, if there is one
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("rightsize").join("config.json"))
    }
}
