//! Export of a filtered view with its overviews and savings

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::LoadError;
use crate::models::Statistic;
use crate::sizing::{FilterCriteria, OverviewAggregate, SavingsSummary, View};

pub const VM_DETAILS_FILE: &str = "vm_details.csv";
pub const VCPU_OVERVIEW_FILE: &str = "vcpu_overview.csv";
pub const VMEMORY_OVERVIEW_FILE: &str = "vmemory_overview.csv";

/// Everything a reader of one filtered view needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub statistic: Statistic,
    pub criteria: FilterCriteria,
    pub vm_count: usize,
    pub view: View,
    pub cpu_overview: OverviewAggregate,
    pub memory_overview: OverviewAggregate,
    pub savings: SavingsSummary,
}

impl Report {
    pub fn build(dataset: &Dataset, criteria: &FilterCriteria) -> Self {
        let overview = dataset.overview(criteria);
        let savings =
            SavingsSummary::from_overviews(&overview.cpu, &overview.memory, criteria.statistic);

        Self {
            statistic: criteria.statistic,
            criteria: criteria.clone(),
            vm_count: overview.vm_count,
            view: dataset.view(criteria),
            cpu_overview: overview.cpu,
            memory_overview: overview.memory,
            savings,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the view and both overviews as CSV files under `dir`, creating
    /// it if needed. Returns the written paths.
    pub fn write_csv(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, LoadError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let details = dir.join(VM_DETAILS_FILE);
        write_rows(
            &details,
            self.view.headers(),
            self.view
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_export_string()).collect()),
        )?;

        let cpu = dir.join(VCPU_OVERVIEW_FILE);
        write_overview(&cpu, &self.cpu_overview)?;
        let memory = dir.join(VMEMORY_OVERVIEW_FILE);
        write_overview(&memory, &self.memory_overview)?;

        debug!(dir = %dir.display(), rows = self.view.len(), "Wrote CSV report");
        Ok(vec![details, cpu, memory])
    }
}

fn write_overview(path: &Path, overview: &OverviewAggregate) -> Result<(), LoadError> {
    let headers = vec![
        format!("{} Overview", overview.resource.prefix()),
        format!("Total ({})", overview.unit),
    ];
    write_rows(
        path,
        headers,
        overview
            .rows
            .iter()
            .map(|row| vec![row.label.clone(), format!("{:.2}", row.total)]),
    )
}

fn write_rows(
    path: &Path,
    headers: Vec<String>,
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<(), LoadError> {
    let to_load_error = |source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(to_load_error)?;
    writer.write_record(&headers).map_err(to_load_error)?;
    for row in rows {
        writer.write_record(&row).map_err(to_load_error)?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetOptions;
    use crate::ingest::{RawTable, SourceTables, TableKind};

    fn dataset() -> Dataset {
        let tables = SourceTables {
            inventory: RawTable::from_rows(
                TableKind::Inventory,
                &["VM Name", "Power State", "Cluster Name", "MOID"],
                &[
                    &["db01", "poweredOn", "prod", "vm-101"],
                    &["tiny03", "poweredOn", "dev", "vm-300"],
                ],
            ),
            cpu: RawTable::from_rows(
                TableKind::Cpu,
                &["vCPUs", "Peak %", "Average %", "Median %", "95th Percentile %", "MOID"],
                &[
                    &["8", "90", "20", "15", "40", "vm-101"],
                    &["1", "", "", "", "", "vm-300"],
                ],
            ),
            memory: RawTable::from_rows(
                TableKind::Memory,
                &["Size (MiB)", "Peak %", "Average %", "Median %", "95th Percentile %", "MOID"],
                &[&["512", "90", "90", "90", "90", "vm-300"]],
            ),
        };
        Dataset::build(&tables, &DatasetOptions::default()).unwrap()
    }

    #[test]
    fn test_report_totals_and_savings() {
        let report = Report::build(&dataset(), &FilterCriteria::new());

        assert_eq!(report.vm_count, 2);
        assert_eq!(report.view.len(), 2);
        assert_eq!(report.cpu_overview.provisioned(), 9.0);
        assert_eq!(report.savings.cpu_vcpus, 4);
        assert_eq!(report.memory_overview.provisioned(), 0.5);
    }

    #[test]
    fn test_report_json() {
        let report = Report::build(
            &dataset(),
            &FilterCriteria::new().with_clusters(["prod"]),
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["statistic"], "p95");
        assert_eq!(json["vm_count"], 1);
        assert_eq!(json["cpu_overview"]["rows"][0]["label"], "Provisioned");
        assert_eq!(json["savings"]["cpu_vcpus"], 4);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report");
        let criteria = FilterCriteria::new().with_columns(["VM Name", "vCPU Peak %", "vMemory Size (GiB)"]);

        let paths = Report::build(&dataset(), &criteria).write_csv(&out).unwrap();
        assert_eq!(paths.len(), 3);

        let details = fs::read_to_string(out.join(VM_DETAILS_FILE)).unwrap();
        let lines: Vec<_> = details.lines().collect();
        assert_eq!(lines[0], "VM Name,vCPU Peak %,vMemory Size (GiB)");
        assert_eq!(lines[1], "db01,90.00,0.00");
        assert_eq!(lines[2], "tiny03,,0.50");

        let cpu = fs::read_to_string(out.join(VCPU_OVERVIEW_FILE)).unwrap();
        let lines: Vec<_> = cpu.lines().collect();
        assert_eq!(lines[0], "vCPU Overview,Total (vCPUs)");
        assert_eq!(lines[1], "Provisioned,9.00");
        assert_eq!(lines[5], "95th Percentile,5.00");
    }
}
