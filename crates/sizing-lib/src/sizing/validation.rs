//! Opt-in data-quality checks on normalized sheets

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DataQualityError;
use crate::ingest::{NormalizedTables, TableKind};
use crate::models::{ResourceKind, StatisticSet};

/// How findings affect ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Skip validation
    Off,
    /// Collect and log findings, keep the dataset
    #[default]
    Warn,
    /// Reject the dataset on any non-informational finding
    Strict,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(ValidationMode::Off),
            "warn" => Ok(ValidationMode::Warn),
            "strict" => Ok(ValidationMode::Strict),
            other => Err(format!(
                "unknown validation mode '{}' (expected off, warn or strict)",
                other
            )),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationMode::Off => "off",
            ValidationMode::Warn => "warn",
            ValidationMode::Strict => "strict",
        };
        f.write_str(name)
    }
}

/// Run every check: duplicate keys, percentages outside [0, 100] and metric
/// rows without an inventory row.
pub fn validate(tables: &NormalizedTables) -> Vec<DataQualityError> {
    let mut findings = Vec::new();

    findings.extend(duplicate_keys(
        TableKind::Inventory,
        tables.inventory.iter().map(|r| r.join_key.as_str()),
    ));
    findings.extend(duplicate_keys(
        TableKind::Cpu,
        tables.cpu.iter().map(|r| r.join_key.as_str()),
    ));
    findings.extend(duplicate_keys(
        TableKind::Memory,
        tables.memory.iter().map(|r| r.join_key.as_str()),
    ));

    for record in &tables.cpu {
        findings.extend(out_of_range(
            TableKind::Cpu,
            ResourceKind::Cpu,
            &record.join_key,
            &record.utilization_pct,
        ));
    }
    for record in &tables.memory {
        findings.extend(out_of_range(
            TableKind::Memory,
            ResourceKind::Memory,
            &record.join_key,
            &record.utilization_pct,
        ));
    }

    let inventory_keys: HashSet<&str> = tables
        .inventory
        .iter()
        .map(|r| r.join_key.as_str())
        .collect();
    findings.extend(orphans(
        TableKind::Cpu,
        &inventory_keys,
        tables.cpu.iter().map(|r| r.join_key.as_str()),
    ));
    findings.extend(orphans(
        TableKind::Memory,
        &inventory_keys,
        tables.memory.iter().map(|r| r.join_key.as_str()),
    ));

    findings
}

/// Keys occurring more than once, in order of first occurrence
fn duplicate_keys<'a>(
    table: TableKind,
    keys: impl Iterator<Item = &'a str>,
) -> Vec<DataQualityError> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for key in keys {
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|key| counts[key] > 1)
        .map(|key| DataQualityError::DuplicateJoinKey {
            table,
            key: key.to_string(),
            count: counts[key],
        })
        .collect()
}

fn out_of_range(
    table: TableKind,
    resource: ResourceKind,
    key: &str,
    pct: &StatisticSet<Option<f64>>,
) -> Vec<DataQualityError> {
    pct.iter()
        .filter_map(|(statistic, value)| value.map(|v| (statistic, v)))
        .filter(|(_, value)| !(0.0..=100.0).contains(value))
        .map(|(statistic, value)| DataQualityError::PercentOutOfRange {
            table,
            key: key.to_string(),
            column: format!("{} {} %", resource.prefix(), statistic.label()),
            value,
        })
        .collect()
}

fn orphans<'a>(
    table: TableKind,
    inventory_keys: &HashSet<&str>,
    keys: impl Iterator<Item = &'a str>,
) -> Vec<DataQualityError> {
    let mut seen = HashSet::new();
    keys.filter(|key| !inventory_keys.contains(key) && seen.insert(*key))
        .map(|key| DataQualityError::OrphanMetricRow {
            table,
            key: key.to_string(),
        })
        .collect()
}
