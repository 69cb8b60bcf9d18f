//! Row filters and column visibility for presentation and export

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::ingest::normalize_header;
use crate::models::{ResourceKind, Statistic, VmRecord};

/// Display column of the unified record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    VmName,
    PowerState,
    Cluster,
    ProvisionedVcpus,
    CpuPct(Statistic),
    CpuRecommended(Statistic),
    ProvisionedMemoryGib,
    MemoryPct(Statistic),
    MemoryRecommended(Statistic),
}

impl Column {
    /// Every column in canonical order
    pub fn all() -> Vec<Column> {
        let mut columns = vec![Column::VmName, Column::PowerState, Column::Cluster];
        columns.push(Column::ProvisionedVcpus);
        for statistic in Statistic::ALL {
            columns.push(Column::CpuPct(statistic));
            columns.push(Column::CpuRecommended(statistic));
        }
        columns.push(Column::ProvisionedMemoryGib);
        for statistic in Statistic::ALL {
            columns.push(Column::MemoryPct(statistic));
            columns.push(Column::MemoryRecommended(statistic));
        }
        columns
    }

    /// Position in the canonical order
    pub fn position(self) -> usize {
        Column::all()
            .iter()
            .position(|c| *c == self)
            .unwrap_or(usize::MAX)
    }

    /// Header as shown in tables and exports, e.g. `vCPU Peak %`
    pub fn header(self) -> String {
        match self {
            Column::VmName => "VM Name".to_string(),
            Column::PowerState => "Power State".to_string(),
            Column::Cluster => "Cluster Name".to_string(),
            Column::ProvisionedVcpus => "vCPUs".to_string(),
            Column::CpuPct(s) => format!("{} {} %", ResourceKind::Cpu.prefix(), s.label()),
            Column::CpuRecommended(s) => format!("{} {} #", ResourceKind::Cpu.prefix(), s.label()),
            Column::ProvisionedMemoryGib => "vMemory Size (GiB)".to_string(),
            Column::MemoryPct(s) => format!("{} {} %", ResourceKind::Memory.prefix(), s.label()),
            Column::MemoryRecommended(s) => {
                format!("{} {} #", ResourceKind::Memory.prefix(), s.label())
            }
        }
    }

    /// snake_case key, e.g. `cpu_peak_pct`
    pub fn key(self) -> String {
        match self {
            Column::VmName => "name".to_string(),
            Column::PowerState => "power_state".to_string(),
            Column::Cluster => "cluster".to_string(),
            Column::ProvisionedVcpus => "provisioned_vcpus".to_string(),
            Column::CpuPct(s) => format!("cpu_{}_pct", s.key()),
            Column::CpuRecommended(s) => format!("cpu_{}_recommended", s.key()),
            Column::ProvisionedMemoryGib => "provisioned_memory_gib".to_string(),
            Column::MemoryPct(s) => format!("memory_{}_pct", s.key()),
            Column::MemoryRecommended(s) => format!("memory_{}_recommended", s.key()),
        }
    }

    /// Look up a column by header or key; unknown names give `None`
    pub fn parse(name: &str) -> Option<Column> {
        let wanted = normalize_header(name);
        Column::all()
            .into_iter()
            .find(|c| normalize_header(&c.header()) == wanted || normalize_header(&c.key()) == wanted)
    }

    pub fn value(self, record: &VmRecord) -> CellValue {
        match self {
            Column::VmName => CellValue::Text(record.name.clone()),
            Column::PowerState => CellValue::Text(record.power_state.clone()),
            Column::Cluster => CellValue::Text(record.cluster.clone()),
            Column::ProvisionedVcpus if !record.has_cpu_metrics => CellValue::Missing,
            Column::ProvisionedVcpus => CellValue::Count(record.provisioned_vcpus),
            Column::CpuPct(s) => CellValue::from_pct(record.cpu_pct.get(s)),
            Column::CpuRecommended(s) => CellValue::Count(record.cpu_recommended.get(s)),
            Column::ProvisionedMemoryGib if !record.has_memory_metrics => CellValue::Missing,
            Column::ProvisionedMemoryGib => CellValue::Number(record.provisioned_memory_gib),
            Column::MemoryPct(s) => CellValue::from_pct(record.memory_pct.get(s)),
            Column::MemoryRecommended(s) => CellValue::Number(record.memory_recommended.get(s)),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.header())
    }
}

/// Cell of a projected view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Count(u32),
    Number(f64),
    Missing,
}

impl CellValue {
    fn from_pct(pct: Option<f64>) -> Self {
        pct.map(CellValue::Number).unwrap_or(CellValue::Missing)
    }

    /// Cell text for CSV export; absent values are empty
    pub fn to_export_string(&self) -> String {
        match self {
            CellValue::Missing => String::new(),
            other => other.to_string(),
        }
    }
}

/// Two decimals for numbers, `n/a` for absent values
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Count(count) => write!(f, "{}", count),
            CellValue::Number(number) => write!(f, "{:.2}", number),
            CellValue::Missing => f.write_str("n/a"),
        }
    }
}

/// Per-query selection. `None` sets mean "every observed value".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub clusters: Option<BTreeSet<String>>,
    pub power_states: Option<BTreeSet<String>>,
    pub statistic: Statistic,
    pub columns: Option<Vec<String>>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clusters<I, S>(mut self, clusters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clusters = Some(clusters.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_power_states<I, S>(mut self, power_states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.power_states = Some(power_states.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `record` passes the cluster and power-state filters
    pub fn matches(&self, record: &VmRecord) -> bool {
        let cluster_ok = self
            .clusters
            .as_ref()
            .map(|allowed| allowed.contains(&record.cluster))
            .unwrap_or(true);
        let power_ok = self
            .power_states
            .as_ref()
            .map(|allowed| allowed.contains(&record.power_state))
            .unwrap_or(true);
        cluster_ok && power_ok
    }

    /// Requested columns in canonical order; unknown names are skipped
    pub fn visible_columns(&self) -> Vec<Column> {
        let Some(requested) = &self.columns else {
            return Column::all();
        };

        let mut selected = BTreeSet::new();
        for name in requested {
            match Column::parse(name) {
                Some(column) => {
                    selected.insert((column.position(), column));
                }
                None => debug!(column = %name, "Ignoring unknown column"),
            }
        }
        selected.into_iter().map(|(_, column)| column).collect()
    }
}

/// Projected table handed to presentation or export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl View {
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Records passing the row filters, in input order
pub fn filter_records<'a>(records: &'a [VmRecord], criteria: &FilterCriteria) -> Vec<&'a VmRecord> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

/// Apply row filters and column visibility
pub fn project(records: &[VmRecord], criteria: &FilterCriteria) -> View {
    let columns = criteria.visible_columns();
    let rows = filter_records(records, criteria)
        .into_iter()
        .map(|record| columns.iter().map(|c| c.value(record)).collect())
        .collect();

    View { columns, rows }
}

/// Distinct cluster names, sorted
pub fn observed_clusters(records: &[VmRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.cluster.as_str()))
}

/// Distinct power states, sorted
pub fn observed_power_states(records: &[VmRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| r.power_state.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
