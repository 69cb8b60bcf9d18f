//! Immutable unified record set and the queries run against it

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataQualityError, EngineError, EngineResult};
use crate::ingest::{NormalizedTables, Normalizer, SheetPaths, SourceSchema, SourceTables};
use crate::models::{ResourceKind, VmRecord};
use crate::sizing::{
    aggregate, filter_records, join, observed_clusters, observed_power_states, project,
    recommend_all, validate, FilterCriteria, OverviewAggregate, SavingsSummary, ValidationMode,
    View,
};

/// Ingestion settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetOptions {
    #[serde(default)]
    pub schema: SourceSchema,
    #[serde(default)]
    pub validation: ValidationMode,
}

/// Overview totals of both resource families for one filtered view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub vm_count: usize,
    pub cpu: OverviewAggregate,
    pub memory: OverviewAggregate,
}

/// Unified per-VM records built from one set of sheets.
///
/// Never mutated after construction, so it can be shared between concurrent
/// queries without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<VmRecord>,
    findings: Vec<DataQualityError>,
}

impl Dataset {
    /// Read, normalize, join and size the sheets at `paths`
    pub fn load(paths: &SheetPaths, options: &DatasetOptions) -> EngineResult<Self> {
        let tables = paths.load()?;
        Self::build(&tables, options)
    }

    /// Normalize, join and size raw sheets. All-or-nothing: any schema or
    /// value error rejects the whole input.
    pub fn build(tables: &SourceTables, options: &DatasetOptions) -> EngineResult<Self> {
        let started = Instant::now();
        let normalized = Normalizer::with_schema(options.schema.clone()).normalize(tables)?;
        let dataset = Self::from_normalized(normalized, options.validation)?;

        debug!(
            vms = dataset.len(),
            findings = dataset.findings.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Built dataset"
        );
        Ok(dataset)
    }

    /// Validate, join and size already normalized tables.
    ///
    /// Findings are kept on the dataset for the caller to report; in strict
    /// mode any non-informational finding fails the build instead.
    pub fn from_normalized(
        tables: NormalizedTables,
        validation: ValidationMode,
    ) -> EngineResult<Self> {
        let findings = match validation {
            ValidationMode::Off => Vec::new(),
            ValidationMode::Warn | ValidationMode::Strict => validate(&tables),
        };

        if validation == ValidationMode::Strict
            && findings.iter().any(|f| !f.is_informational())
        {
            return Err(EngineError::DataQuality(findings));
        }

        let joined = join(&tables.inventory, &tables.cpu, &tables.memory);
        Ok(Self {
            records: recommend_all(joined),
            findings,
        })
    }

    pub fn records(&self) -> &[VmRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validation findings collected at ingestion
    pub fn findings(&self) -> &[DataQualityError] {
        &self.findings
    }

    pub fn clusters(&self) -> Vec<String> {
        observed_clusters(&self.records)
    }

    pub fn power_states(&self) -> Vec<String> {
        observed_power_states(&self.records)
    }

    pub fn filtered(&self, criteria: &FilterCriteria) -> Vec<&VmRecord> {
        filter_records(&self.records, criteria)
    }

    pub fn view(&self, criteria: &FilterCriteria) -> View {
        project(&self.records, criteria)
    }

    pub fn overview(&self, criteria: &FilterCriteria) -> Overview {
        let filtered = self.filtered(criteria);
        Overview {
            vm_count: filtered.len(),
            cpu: aggregate(filtered.iter().copied(), ResourceKind::Cpu),
            memory: aggregate(filtered.iter().copied(), ResourceKind::Memory),
        }
    }

    /// Savings for the statistic selected in `criteria`
    pub fn savings(&self, criteria: &FilterCriteria) -> SavingsSummary {
        let overview = self.overview(criteria);
        SavingsSummary::from_overviews(&overview.cpu, &overview.memory, criteria.statistic)
    }
}
