//! Source column names and header matching

use serde::{Deserialize, Serialize};

use super::TableKind;
use crate::models::Statistic;

/// Header names expected in the collector export.
///
/// Each entry lists the accepted spellings; the first one is the name shown
/// to users when the column is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSchema {
    pub join_key: Vec<String>,
    pub vm_name: Vec<String>,
    pub power_state: Vec<String>,
    pub cluster: Vec<String>,
    pub vcpus: Vec<String>,
    pub memory_size_mib: Vec<String>,
    pub peak_pct: Vec<String>,
    pub average_pct: Vec<String>,
    pub median_pct: Vec<String>,
    pub p95_pct: Vec<String>,
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for SourceSchema {
    fn default() -> Self {
        Self {
            join_key: names(&["MOID"]),
            vm_name: names(&["VM Name"]),
            power_state: names(&["Power State"]),
            cluster: names(&["Cluster Name"]),
            vcpus: names(&["vCPUs"]),
            memory_size_mib: names(&["Size (MiB)"]),
            peak_pct: names(&["Peak %"]),
            average_pct: names(&["Average %"]),
            median_pct: names(&["Median %"]),
            p95_pct: names(&["95th Percentile % (recommended)", "95th Percentile %"]),
        }
    }
}

impl SourceSchema {
    pub fn statistic_pct(&self, statistic: Statistic) -> &[String] {
        match statistic {
            Statistic::Peak => &self.peak_pct,
            Statistic::Average => &self.average_pct,
            Statistic::Median => &self.median_pct,
            Statistic::Percentile95 => &self.p95_pct,
        }
    }

    /// Accepted spellings of every required column of `table`, in sheet order
    pub fn required(&self, table: TableKind) -> Vec<&[String]> {
        let mut columns: Vec<&[String]> = match table {
            TableKind::Inventory => vec![&self.vm_name, &self.power_state, &self.cluster],
            TableKind::Cpu => vec![&self.vcpus],
            TableKind::Memory => vec![&self.memory_size_mib],
        };
        if table != TableKind::Inventory {
            columns.extend(Statistic::ALL.iter().map(|s| self.statistic_pct(*s)));
        }
        columns.push(&self.join_key);
        columns
    }

    /// Display names of the required columns of `table`
    pub fn expected_columns(&self, table: TableKind) -> Vec<String> {
        self.required(table)
            .into_iter()
            .filter_map(|aliases| aliases.first().cloned())
            .collect()
    }
}

/// Canonical form of a header for comparison.
///
/// Case-insensitive, trimmed, underscores read as spaces and runs of
/// whitespace collapsed, so `Cluster_Name` matches `Cluster Name`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Index of the first header matching any of `aliases`
pub(crate) fn find_column(headers: &[String], aliases: &[String]) -> Option<usize> {
    let wanted: Vec<String> = aliases.iter().map(|a| normalize_header(a)).collect();
    headers
        .iter()
        .position(|h| wanted.contains(&normalize_header(h)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header_variants() {
        assert_eq!(normalize_header("Cluster_Name"), "cluster name");
        assert_eq!(normalize_header("  VM   Name "), "vm name");
        assert_eq!(normalize_header("\u{feff}MOID"), "moid");
        assert_eq!(normalize_header("Size (MiB)"), "size (mib)");
    }

    #[test]
    fn test_find_column_accepts_aliases() {
        let schema = SourceSchema::default();
        let headers = names(&["vCPUs", "95th Percentile %", "MOID"]);
        assert_eq!(find_column(&headers, &schema.p95_pct), Some(1));
        assert_eq!(find_column(&headers, &schema.join_key), Some(2));
        assert_eq!(find_column(&headers, &schema.peak_pct), None);
    }

    #[test]
    fn test_expected_columns_in_sheet_order() {
        let schema = SourceSchema::default();
        assert_eq!(
            schema.expected_columns(TableKind::Inventory),
            names(&["VM Name", "Power State", "Cluster Name", "MOID"])
        );
        assert_eq!(
            schema.expected_columns(TableKind::Memory),
            names(&[
                "Size (MiB)",
                "Peak %",
                "Average %",
                "Median %",
                "95th Percentile % (recommended)",
                "MOID"
            ])
        );
    }
}
