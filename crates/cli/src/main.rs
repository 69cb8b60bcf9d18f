//! VM right-sizing CLI
//!
//! A command-line tool for sizing VMs from exported collector sheets:
//! per-VM recommendations, overview totals, savings, validation and export.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use commands::{data, savings, views};
use sizing_lib::{
    Dataset, DatasetOptions, FilterCriteria, SheetPaths, Statistic, StructuredLogger, TableKind,
    ValidationMode,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// VM right-sizing CLI
#[derive(Parser)]
#[command(name = "rightsize")]
#[command(author, version, about = "CLI for VM right-sizing recommendations", long_about = None)]
pub struct Cli {
    /// Directory holding vInfo.csv, vCPU.csv and vMemory.csv
    #[arg(long, short, env = "RIGHTSIZE_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Inventory sheet (overrides <input-dir>/vInfo.csv)
    #[arg(long)]
    pub inventory: Option<PathBuf>,

    /// CPU sheet (overrides <input-dir>/vCPU.csv)
    #[arg(long)]
    pub cpu: Option<PathBuf>,

    /// Memory sheet (overrides <input-dir>/vMemory.csv)
    #[arg(long)]
    pub memory: Option<PathBuf>,

    /// Data-quality validation: off, warn or strict
    #[arg(long, env = "RIGHTSIZE_VALIDATION")]
    pub validation: Option<ValidationMode>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Row filters and statistic shared by the query commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep only VMs in this cluster (repeatable)
    #[arg(long = "cluster")]
    pub clusters: Vec<String>,

    /// Keep only VMs in this power state (repeatable)
    #[arg(long = "power-state")]
    pub power_states: Vec<String>,

    /// Statistic for savings: peak, average, median or p95
    #[arg(long, short)]
    pub statistic: Option<Statistic>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show provisioned and recommended totals
    Overview {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List per-VM utilization and recommendations
    Vms {
        #[command(flatten)]
        filters: FilterArgs,

        /// Columns to show, by header or key (comma separated)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Show reclaimable vCPUs and memory
    Savings {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Check the sheets for schema and data-quality problems
    Validate {
        /// Fail on duplicate keys and out-of-range percentages
        #[arg(long)]
        strict: bool,
    },

    /// Write the filtered view, overviews and savings to a directory
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Columns to export, by header or key (comma separated)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output directory
        #[arg(long, short, default_value = "rightsize-report")]
        output: PathBuf,
    },
}

/// Settings resolved from flags, environment and the user config file
pub struct Session {
    pub paths: SheetPaths,
    pub options: DatasetOptions,
    pub format: output::OutputFormat,
    pub config: config::Config,
    pub logger: StructuredLogger,
}

impl Session {
    fn resolve(cli: &Cli, config: config::Config) -> Self {
        let input_dir = cli
            .input_dir
            .clone()
            .or_else(|| config.input_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut paths = SheetPaths::from_dir(&input_dir);
        for (kind, path) in [
            (TableKind::Inventory, &cli.inventory),
            (TableKind::Cpu, &cli.cpu),
            (TableKind::Memory, &cli.memory),
        ] {
            if let Some(path) = path {
                paths.set(kind, path.clone());
            }
        }

        let options = DatasetOptions {
            validation: cli.validation.or(config.validation).unwrap_or_default(),
            ..Default::default()
        };

        Self {
            paths,
            options,
            format: cli.format.or(config.format).unwrap_or_default(),
            config,
            logger: StructuredLogger::new("rightsize-cli"),
        }
    }

    /// Load the dataset, reporting non-fatal findings on stderr
    pub fn load(&self) -> Result<Dataset> {
        let dataset = Dataset::load(&self.paths, &self.options).with_context(|| {
            format!(
                "Failed to load sheets ({}, {}, {})",
                self.paths.inventory.display(),
                self.paths.cpu.display(),
                self.paths.memory.display()
            )
        })?;

        debug!(
            vms = dataset.len(),
            findings = dataset.findings().len(),
            validation = %self.options.validation,
            "Loaded dataset"
        );
        for finding in dataset.findings() {
            self.logger.log_data_quality_issue(finding);
        }
        Ok(dataset)
    }

    /// Filter criteria from flags, falling back to configured defaults
    pub fn criteria(&self, filters: &FilterArgs, columns: &[String]) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        if !filters.clusters.is_empty() {
            criteria = criteria.with_clusters(filters.clusters.iter().cloned());
        }
        if !filters.power_states.is_empty() {
            criteria = criteria.with_power_states(filters.power_states.iter().cloned());
        }
        if let Some(statistic) = filters.statistic.or(self.config.statistic) {
            criteria = criteria.with_statistic(statistic);
        }
        if !columns.is_empty() {
            criteria = criteria.with_columns(columns.iter().cloned());
        } else if let Some(columns) = &self.config.columns {
            criteria = criteria.with_columns(columns.iter().cloned());
        }
        criteria
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let session = Session::resolve(&cli, config);

    match cli.command {
        Commands::Overview { filters } => {
            views::show_overview(&session, &session.criteria(&filters, &[]))?;
        }
        Commands::Vms { filters, columns } => {
            views::show_vms(&session, &session.criteria(&filters, &columns))?;
        }
        Commands::Savings { filters } => {
            savings::show_savings(&session, &session.criteria(&filters, &[]))?;
        }
        Commands::Validate { strict } => {
            data::validate(&session, strict)?;
        }
        Commands::Export {
            filters,
            columns,
            output,
        } => {
            data::export(&session, &session.criteria(&filters, &columns), &output)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "rightsize",
            "--input-dir",
            "/data",
            "--memory",
            "/other/mem.csv",
            "vms",
            "--cluster",
            "prod",
            "--cluster",
            "dev",
            "--columns",
            "VM Name,vCPUs",
        ])
        .unwrap();
        let config = config::Config {
            input_dir: Some(PathBuf::from("/ignored")),
            statistic: Some(Statistic::Median),
            format: Some(output::OutputFormat::Json),
            ..Default::default()
        };
        let session = Session::resolve(&cli, config);

        assert_eq!(session.paths.inventory, PathBuf::from("/data/vInfo.csv"));
        assert_eq!(session.paths.memory, PathBuf::from("/other/mem.csv"));
        assert_eq!(session.format, output::OutputFormat::Json);
        assert_eq!(session.options.validation, ValidationMode::Warn);

        let Commands::Vms { filters, columns } = &cli.command else {
            panic!("expected vms command");
        };
        let criteria = session.criteria(filters, columns);
        assert_eq!(criteria.statistic, Statistic::Median);
        assert_eq!(criteria.clusters.as_ref().map(|c| c.len()), Some(2));
        assert!(criteria.power_states.is_none());
        assert_eq!(criteria.visible_columns().len(), 2);
    }

    #[test]
    fn test_statistic_flag_accepts_aliases() {
        let cli = Cli::try_parse_from(["rightsize", "savings", "--statistic", "avg"]).unwrap();
        let Commands::Savings { filters } = cli.command else {
            panic!("expected savings command");
        };
        assert_eq!(filters.statistic, Some(Statistic::Average));
    }
}
