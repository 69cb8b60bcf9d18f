//! Raw sheet to typed record normalization
//!
//! Resolves the source headers against [`SourceSchema`], converts memory
//! sizes from MiB to GiB and tags each metric with its resource family by
//! parsing it into [`CpuMetricRecord`] or [`MemoryMetricRecord`]. Any missing
//! column or malformed cell rejects the whole dataset.

use super::schema::{find_column, SourceSchema};
use super::{RawTable, SourceTables};
use crate::error::{EngineError, EngineResult, SchemaError};
use crate::models::{
    CpuMetricRecord, InventoryRecord, MemoryMetricRecord, Statistic, StatisticSet,
};

/// MiB per GiB
pub const MIB_PER_GIB: f64 = 1024.0;

/// Cell values read as "no sample" in percentage columns
const MISSING_MARKERS: &[&str] = &["", "nan", "n/a", "na", "-", "null", "none"];

/// Typed records of all three sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTables {
    pub inventory: Vec<InventoryRecord>,
    pub cpu: Vec<CpuMetricRecord>,
    pub memory: Vec<MemoryMetricRecord>,
}

/// Column positions of a metric sheet
struct MetricColumns {
    join_key: usize,
    provisioned: usize,
    pct: StatisticSet<usize>,
}

/// Maps raw sheets onto the canonical record schema
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    schema: SourceSchema,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: SourceSchema) -> Self {
        Self { schema }
    }

    /// Normalize all three sheets.
    ///
    /// Every sheet's headers are checked before any cell is parsed.
    pub fn normalize(&self, tables: &SourceTables) -> EngineResult<NormalizedTables> {
        for table in [&tables.inventory, &tables.cpu, &tables.memory] {
            self.check_schema(table)?;
        }

        Ok(NormalizedTables {
            inventory: self.normalize_inventory(&tables.inventory)?,
            cpu: self.normalize_cpu(&tables.cpu)?,
            memory: self.normalize_memory(&tables.memory)?,
        })
    }

    /// Verify that every required column of `table` is present
    pub fn check_schema(&self, table: &RawTable) -> Result<(), SchemaError> {
        let missing: Vec<String> = self
            .schema
            .required(table.kind)
            .into_iter()
            .filter(|aliases| find_column(&table.headers, aliases).is_none())
            .filter_map(|aliases| aliases.first().cloned())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError {
                table: table.kind,
                missing,
                expected: self.schema.expected_columns(table.kind),
            })
        }
    }

    pub fn normalize_inventory(&self, table: &RawTable) -> EngineResult<Vec<InventoryRecord>> {
        self.check_schema(table)?;
        let name = self.column(table, &self.schema.vm_name)?;
        let power_state = self.column(table, &self.schema.power_state)?;
        let cluster = self.column(table, &self.schema.cluster)?;
        let join_key = self.column(table, &self.schema.join_key)?;

        (0..table.len())
            .map(|row| {
                Ok(InventoryRecord {
                    name: table.cell(row, name).trim().to_string(),
                    power_state: table.cell(row, power_state).trim().to_string(),
                    cluster: table.cell(row, cluster).trim().to_string(),
                    join_key: parse_join_key(table, row, join_key)?,
                })
            })
            .collect()
    }

    pub fn normalize_cpu(&self, table: &RawTable) -> EngineResult<Vec<CpuMetricRecord>> {
        let columns = self.metric_columns(table, &self.schema.vcpus)?;

        (0..table.len())
            .map(|row| {
                Ok(CpuMetricRecord {
                    join_key: parse_join_key(table, row, columns.join_key)?,
                    provisioned_vcpus: parse_vcpus(table, row, columns.provisioned)?,
                    utilization_pct: parse_pct_set(table, row, &columns.pct)?,
                })
            })
            .collect()
    }

    pub fn normalize_memory(&self, table: &RawTable) -> EngineResult<Vec<MemoryMetricRecord>> {
        let columns = self.metric_columns(table, &self.schema.memory_size_mib)?;

        (0..table.len())
            .map(|row| {
                let size_mib = parse_number(table, row, columns.provisioned)?;
                Ok(MemoryMetricRecord {
                    join_key: parse_join_key(table, row, columns.join_key)?,
                    provisioned_gib: size_mib / MIB_PER_GIB,
                    utilization_pct: parse_pct_set(table, row, &columns.pct)?,
                })
            })
            .collect()
    }

    fn metric_columns(
        &self,
        table: &RawTable,
        provisioned: &[String],
    ) -> EngineResult<MetricColumns> {
        self.check_schema(table)?;
        let mut pct = StatisticSet::splat(0usize);
        for statistic in Statistic::ALL {
            pct.set(statistic, self.column(table, self.schema.statistic_pct(statistic))?);
        }

        Ok(MetricColumns {
            join_key: self.column(table, &self.schema.join_key)?,
            provisioned: self.column(table, provisioned)?,
            pct,
        })
    }

    fn column(&self, table: &RawTable, aliases: &[String]) -> Result<usize, SchemaError> {
        find_column(&table.headers, aliases).ok_or_else(|| SchemaError {
            table: table.kind,
            missing: aliases.first().cloned().into_iter().collect(),
            expected: self.schema.expected_columns(table.kind),
        })
    }
}

/// Sheet row number of a data row (the header is row 1)
fn sheet_row(row: usize) -> usize {
    row + 2
}

fn invalid(table: &RawTable, row: usize, column: usize, reason: &str) -> EngineError {
    EngineError::InvalidValue {
        table: table.kind,
        row: sheet_row(row),
        column: table.headers.get(column).cloned().unwrap_or_default(),
        value: table.cell(row, column).to_string(),
        reason: reason.to_string(),
    }
}

fn parse_join_key(table: &RawTable, row: usize, column: usize) -> EngineResult<String> {
    let key = table.cell(row, column).trim();
    if key.is_empty() {
        return Err(invalid(table, row, column, "join key is empty"));
    }
    Ok(key.to_string())
}

fn parse_number(table: &RawTable, row: usize, column: usize) -> EngineResult<f64> {
    let raw = table.cell(row, column).trim();
    let value: f64 = raw
        .parse()
        .map_err(|_| invalid(table, row, column, "not a number"))?;
    if !value.is_finite() {
        return Err(invalid(table, row, column, "not a finite number"));
    }
    if value < 0.0 {
        return Err(invalid(table, row, column, "must not be negative"));
    }
    Ok(value)
}

fn parse_vcpus(table: &RawTable, row: usize, column: usize) -> EngineResult<u32> {
    let raw = table.cell(row, column).trim();
    if let Ok(vcpus) = raw.parse::<u32>() {
        return Ok(vcpus);
    }
    let value = parse_number(table, row, column)?;
    if value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(invalid(table, row, column, "vCPU count must be a whole number"));
    }
    Ok(value as u32)
}

/// Percentage cell; missing markers and NaN read as no sample
fn parse_pct(table: &RawTable, row: usize, column: usize) -> EngineResult<Option<f64>> {
    let raw = table.cell(row, column).trim();
    let trimmed = raw.strip_suffix('%').unwrap_or(raw).trim();
    if MISSING_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| invalid(table, row, column, "not a percentage"))?;
    if value.is_nan() {
        return Ok(None);
    }
    if value.is_infinite() || value < 0.0 {
        return Err(invalid(table, row, column, "percentage must be a non-negative number"));
    }
    Ok(Some(value))
}

fn parse_pct_set(
    table: &RawTable,
    row: usize,
    columns: &StatisticSet<usize>,
) -> EngineResult<StatisticSet<Option<f64>>> {
    Ok(StatisticSet {
        peak: parse_pct(table, row, columns.peak)?,
        average: parse_pct(table, row, columns.average)?,
        median: parse_pct(table, row, columns.median)?,
        p95: parse_pct(table, row, columns.p95)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::TableKind;

    const CPU_HEADERS: &[&str] = &[
        "vCPUs",
        "Peak %",
        "Average %",
        "Median %",
        "95th Percentile % (recommended)",
        "MOID",
    ];
    const MEMORY_HEADERS: &[&str] = &[
        "Size (MiB)",
        "Peak %",
        "Average %",
        "Median %",
        "95th Percentile % (recommended)",
        "MOID",
    ];

    #[test]
    fn test_inventory_with_underscored_headers() {
        let table = RawTable::from_rows(
            TableKind::Inventory,
            &["VM_Name", "Power_State", "Cluster_Name", "Host Name", "MOID"],
            &[&["db01", "poweredOn", "prod", "esx01", "vm-101"]],
        );
        let records = Normalizer::new().normalize_inventory(&table).unwrap();

        assert_eq!(
            records,
            vec![InventoryRecord {
                name: "db01".to_string(),
                power_state: "poweredOn".to_string(),
                cluster: "prod".to_string(),
                join_key: "vm-101".to_string(),
            }]
        );
    }

    #[test]
    fn test_cpu_missing_percentages_are_none() {
        let table = RawTable::from_rows(
            TableKind::Cpu,
            CPU_HEADERS,
            &[&["4", "", "NaN", "n/a", "", "vm-102"], &["8.0", "55", "20.5", "18", "40", "vm-101"]],
        );
        let records = Normalizer::new().normalize_cpu(&table).unwrap();

        assert_eq!(records[0].provisioned_vcpus, 4);
        assert_eq!(records[0].utilization_pct, StatisticSet::splat(None));
        assert_eq!(records[1].provisioned_vcpus, 8);
        assert_eq!(records[1].utilization_pct.p95, Some(40.0));
        assert_eq!(records[1].utilization_pct.average, Some(20.5));
    }

    #[test]
    fn test_memory_converted_to_gib() {
        let table = RawTable::from_rows(
            TableKind::Memory,
            MEMORY_HEADERS,
            &[&["16384", "80", "50", "45", "70", "vm-101"], &["512", "95", "90", "90", "90", "vm-103"]],
        );
        let records = Normalizer::new().normalize_memory(&table).unwrap();

        assert_eq!(records[0].provisioned_gib, 16.0);
        assert_eq!(records[1].provisioned_gib, 0.5);
    }

    #[test]
    fn test_short_percentile_header_accepted() {
        let mut headers = CPU_HEADERS.to_vec();
        headers[4] = "95th Percentile %";
        let table = RawTable::from_rows(TableKind::Cpu, &headers, &[&["2", "10", "5", "5", "8", "vm-1"]]);

        let records = Normalizer::new().normalize_cpu(&table).unwrap();
        assert_eq!(records[0].utilization_pct.p95, Some(8.0));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let table = RawTable::from_rows(
            TableKind::Cpu,
            &["Peak %", "Average %", "Median %", "MOID"],
            &[],
        );
        let err = Normalizer::new().check_schema(&table).unwrap_err();

        assert_eq!(err.table, TableKind::Cpu);
        assert_eq!(
            err.missing,
            vec!["vCPUs".to_string(), "95th Percentile % (recommended)".to_string()]
        );
        assert_eq!(err.expected.len(), 6);
    }

    #[test]
    fn test_schema_checked_before_any_row_is_parsed() {
        let tables = SourceTables {
            inventory: RawTable::from_rows(
                TableKind::Inventory,
                &["VM Name", "Power State", "Cluster Name", "MOID"],
                &[&["db01", "poweredOn", "prod", ""]],
            ),
            cpu: RawTable::from_rows(TableKind::Cpu, CPU_HEADERS, &[]),
            memory: RawTable::from_rows(TableKind::Memory, &["MOID"], &[]),
        };

        let err = Normalizer::new().normalize(&tables).unwrap_err();
        assert!(matches!(err, EngineError::Schema(SchemaError { table: TableKind::Memory, .. })));
    }

    #[test]
    fn test_malformed_values_rejected() {
        let normalizer = Normalizer::new();
        let cases: &[&[&str]] = &[
            &["four", "10", "10", "10", "10", "vm-1"],
            &["2.5", "10", "10", "10", "10", "vm-1"],
            &["-2", "10", "10", "10", "10", "vm-1"],
            &["2", "-1", "10", "10", "10", "vm-1"],
            &["2", "abc", "10", "10", "10", "vm-1"],
            &["2", "10", "10", "10", "10", " "],
        ];

        for case in cases {
            let table = RawTable::from_rows(TableKind::Cpu, CPU_HEADERS, &[*case]);
            let err = normalizer.normalize_cpu(&table).unwrap_err();
            match err {
                EngineError::InvalidValue { table, row, .. } => {
                    assert_eq!(table, TableKind::Cpu);
                    assert_eq!(row, 2);
                }
                other => panic!("expected InvalidValue for {:?}, got {:?}", case, other),
            }
        }
    }

    #[test]
    fn test_percent_above_hundred_is_kept() {
        let table = RawTable::from_rows(
            TableKind::Cpu,
            CPU_HEADERS,
            &[&["2", "130%", "10", "10", "10", "vm-1"]],
        );
        let records = Normalizer::new().normalize_cpu(&table).unwrap();
        assert_eq!(records[0].utilization_pct.peak, Some(130.0));
    }

    #[test]
    fn test_empty_tables_normalize_to_empty() {
        let tables = SourceTables {
            inventory: RawTable::from_rows(
                TableKind::Inventory,
                &["VM Name", "Power State", "Cluster Name", "MOID"],
                &[],
            ),
            cpu: RawTable::from_rows(TableKind::Cpu, CPU_HEADERS, &[]),
            memory: RawTable::from_rows(TableKind::Memory, MEMORY_HEADERS, &[]),
        };
        let normalized = Normalizer::new().normalize(&tables).unwrap();
        assert_eq!(normalized, NormalizedTables::default());
    }
}
