//! Server configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use sizing_lib::{DatasetOptions, SheetPaths, SourceSchema, TableKind, ValidationMode};

/// Server configuration, read from `RIGHTSIZE_*` environment variables and an
/// optional `rightsize-server` config file in the working directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Instance name attached to structured log events
    pub instance: String,

    /// Port for the query API, health and metrics
    pub api_port: u16,

    /// Directory holding `vInfo.csv`, `vCPU.csv` and `vMemory.csv`
    pub input_dir: PathBuf,

    /// Per-sheet overrides of the files found in `input_dir`
    pub inventory: Option<PathBuf>,
    pub cpu: Option<PathBuf>,
    pub memory: Option<PathBuf>,

    pub validation: ValidationMode,

    /// Header aliases; defaults match the collector's exports
    pub schema: SourceSchema,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance: std::env::var("HOSTNAME").unwrap_or_else(|_| "rightsize".to_string()),
            api_port: 8080,
            input_dir: PathBuf::from("."),
            inventory: None,
            cpu: None,
            memory: None,
            validation: ValidationMode::default(),
            schema: SourceSchema::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment and config file
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("rightsize-server").required(false))
            .add_source(config::Environment::with_prefix("RIGHTSIZE"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid RIGHTSIZE_* configuration")
    }

    pub fn sheet_paths(&self) -> SheetPaths {
        let mut paths = SheetPaths::from_dir(&self.input_dir);
        for (kind, path) in [
            (TableKind::Inventory, &self.inventory),
            (TableKind::Cpu, &self.cpu),
            (TableKind::Memory, &self.memory),
        ] {
            if let Some(path) = path {
                paths.set(kind, path.clone());
            }
        }
        paths
    }

    pub fn dataset_options(&self) -> DatasetOptions {
        DatasetOptions {
            schema: self.schema.clone(),
            validation: self.validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.validation, ValidationMode::Warn);
        assert_eq!(
            config.sheet_paths().path(TableKind::Cpu),
            PathBuf::from("./vCPU.csv")
        );
    }

    #[test]
    fn test_sheet_overrides() {
        let config = ServerConfig {
            input_dir: PathBuf::from("/data"),
            memory: Some(PathBuf::from("/other/mem.csv")),
            ..Default::default()
        };
        let paths = config.sheet_paths();

        assert_eq!(paths.path(TableKind::Memory), PathBuf::from("/other/mem.csv"));
        assert_eq!(paths.path(TableKind::Inventory), PathBuf::from("/data/vInfo.csv"));
    }
}
