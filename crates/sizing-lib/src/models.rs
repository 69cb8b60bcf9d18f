//! Core data models for the right-sizing engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Utilization statistic reported by the collector for an observation window
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Peak,
    Average,
    Median,
    #[default]
    #[serde(rename = "p95")]
    Percentile95,
}

impl Statistic {
    /// All statistics in overview order
    pub const ALL: [Statistic; 4] = [
        Statistic::Peak,
        Statistic::Average,
        Statistic::Median,
        Statistic::Percentile95,
    ];

    /// Human-readable label used in column headers and overview rows
    pub fn label(self) -> &'static str {
        match self {
            Statistic::Peak => "Peak",
            Statistic::Average => "Average",
            Statistic::Median => "Median",
            Statistic::Percentile95 => "95th Percentile",
        }
    }

    /// Short key used in snake_case column names and query parameters
    pub fn key(self) -> &'static str {
        match self {
            Statistic::Peak => "peak",
            Statistic::Average => "average",
            Statistic::Median => "median",
            Statistic::Percentile95 => "p95",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a statistic name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown statistic '{0}' (expected one of: peak, average, median, p95)")]
pub struct ParseStatisticError(pub String);

impl FromStr for Statistic {
    type Err = ParseStatisticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "peak" | "max" => Ok(Statistic::Peak),
            "average" | "avg" | "mean" => Ok(Statistic::Average),
            "median" | "p50" => Ok(Statistic::Median),
            "p95" | "95" | "95th" | "percentile95" | "95th percentile" => {
                Ok(Statistic::Percentile95)
            }
            _ => Err(ParseStatisticError(s.to_string())),
        }
    }
}

/// Resource family a metric or recommendation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    /// Prefix used to tag columns of this family
    pub fn prefix(self) -> &'static str {
        match self {
            ResourceKind::Cpu => "vCPU",
            ResourceKind::Memory => "vMemory",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ResourceKind::Cpu => "vCPUs",
            ResourceKind::Memory => "GiB",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One value per statistic
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticSet<T> {
    pub peak: T,
    pub average: T,
    pub median: T,
    pub p95: T,
}

impl<T: Copy> StatisticSet<T> {
    /// Set holding the same value for every statistic
    pub fn splat(value: T) -> Self {
        Self {
            peak: value,
            average: value,
            median: value,
            p95: value,
        }
    }

    pub fn get(&self, statistic: Statistic) -> T {
        match statistic {
            Statistic::Peak => self.peak,
            Statistic::Average => self.average,
            Statistic::Median => self.median,
            Statistic::Percentile95 => self.p95,
        }
    }

    pub fn set(&mut self, statistic: Statistic, value: T) {
        match statistic {
            Statistic::Peak => self.peak = value,
            Statistic::Average => self.average = value,
            Statistic::Median => self.median = value,
            Statistic::Percentile95 => self.p95 = value,
        }
    }

    /// Build a set by evaluating `f` for every statistic
    pub fn from_fn(mut f: impl FnMut(Statistic) -> T) -> Self {
        Self {
            peak: f(Statistic::Peak),
            average: f(Statistic::Average),
            median: f(Statistic::Median),
            p95: f(Statistic::Percentile95),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Statistic, T)> + '_ {
        Statistic::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

/// Normalized row from the inventory table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub name: String,
    pub power_state: String,
    pub cluster: String,
    pub join_key: String,
}

/// Normalized row from the CPU metric table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetricRecord {
    pub join_key: String,
    pub provisioned_vcpus: u32,
    pub utilization_pct: StatisticSet<Option<f64>>,
}

/// Normalized row from the memory metric table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetricRecord {
    pub join_key: String,
    pub provisioned_gib: f64,
    pub utilization_pct: StatisticSet<Option<f64>>,
}

/// CPU side of a joined VM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub provisioned_vcpus: u32,
    pub utilization_pct: StatisticSet<Option<f64>>,
}

/// Memory side of a joined VM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub provisioned_gib: f64,
    pub utilization_pct: StatisticSet<Option<f64>>,
}

/// Inventory row joined with its CPU and memory metrics.
///
/// A facet without a matching metric row is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedVm {
    pub name: String,
    pub join_key: String,
    pub power_state: String,
    pub cluster: String,
    pub cpu: Option<CpuUsage>,
    pub memory: Option<MemoryUsage>,
}

/// Unified per-VM record with derived recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    pub name: String,
    pub join_key: String,
    pub power_state: String,
    pub cluster: String,
    pub provisioned_vcpus: u32,
    pub cpu_pct: StatisticSet<Option<f64>>,
    pub cpu_recommended: StatisticSet<u32>,
    pub provisioned_memory_gib: f64,
    pub memory_pct: StatisticSet<Option<f64>>,
    pub memory_recommended: StatisticSet<f64>,
    pub has_cpu_metrics: bool,
    pub has_memory_metrics: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistic_parse_aliases() {
        assert_eq!("peak".parse::<Statistic>().unwrap(), Statistic::Peak);
        assert_eq!("AVG".parse::<Statistic>().unwrap(), Statistic::Average);
        assert_eq!(" median ".parse::<Statistic>().unwrap(), Statistic::Median);
        assert_eq!("p95".parse::<Statistic>().unwrap(), Statistic::Percentile95);
        assert_eq!("95th".parse::<Statistic>().unwrap(), Statistic::Percentile95);
        assert!("p99".parse::<Statistic>().is_err());
    }

    #[test]
    fn test_statistic_serde_names() {
        let json = serde_json::to_string(&Statistic::Percentile95).unwrap();
        assert_eq!(json, "\"p95\"");
        let parsed: Statistic = serde_json::from_str("\"average\"").unwrap();
        assert_eq!(parsed, Statistic::Average);
    }

    #[test]
    fn test_statistic_set_accessors() {
        let mut set = StatisticSet::splat(0u32);
        set.set(Statistic::Median, 3);
        assert_eq!(set.get(Statistic::Median), 3);
        assert_eq!(set.get(Statistic::Peak), 0);

        let collected: Vec<_> = StatisticSet::from_fn(|s| s.key()).iter().collect();
        assert_eq!(
            collected,
            vec![
                (Statistic::Peak, "peak"),
                (Statistic::Average, "average"),
                (Statistic::Median, "median"),
                (Statistic::Percentile95, "p95"),
            ]
        );
    }
}
