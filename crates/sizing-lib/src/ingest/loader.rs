//! CSV adapter for exported workbook sheets
//!
//! Each sheet of the collector workbook is expected as its own CSV file with a
//! header row, named after the sheet (`vInfo.csv`, `vCPU.csv`, `vMemory.csv`).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{RawTable, SourceTables, TableKind};
use crate::error::LoadError;

/// Locations of the three sheet files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPaths {
    pub inventory: PathBuf,
    pub cpu: PathBuf,
    pub memory: PathBuf,
}

impl SheetPaths {
    /// Sheet files named after the workbook tabs inside `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            inventory: dir.join(format!("{}.csv", TableKind::Inventory.sheet_name())),
            cpu: dir.join(format!("{}.csv", TableKind::Cpu.sheet_name())),
            memory: dir.join(format!("{}.csv", TableKind::Memory.sheet_name())),
        }
    }

    pub fn path(&self, kind: TableKind) -> &Path {
        match kind {
            TableKind::Inventory => &self.inventory,
            TableKind::Cpu => &self.cpu,
            TableKind::Memory => &self.memory,
        }
    }

    /// Point one sheet at a different file
    pub fn set(&mut self, kind: TableKind, path: impl Into<PathBuf>) {
        let path = path.into();
        match kind {
            TableKind::Inventory => self.inventory = path,
            TableKind::Cpu => self.cpu = path,
            TableKind::Memory => self.memory = path,
        }
    }

    /// Read all three sheets
    pub fn load(&self) -> Result<SourceTables, LoadError> {
        Ok(SourceTables {
            inventory: load_csv_table(&self.inventory, TableKind::Inventory)?,
            cpu: load_csv_table(&self.cpu, TableKind::Cpu)?,
            memory: load_csv_table(&self.memory, TableKind::Memory)?,
        })
    }
}

/// Read one sheet from a CSV file
pub fn load_csv_table(path: impl AsRef<Path>, kind: TableKind) -> Result<RawTable, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = read_csv_table(file, kind).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        sheet = %kind,
        path = %path.display(),
        rows = table.len(),
        "Loaded sheet"
    );
    Ok(table)
}

/// Read one sheet from any CSV source.
///
/// Rows may have fewer cells than the header; missing cells read as empty.
pub fn read_csv_table<R: Read>(reader: R, kind: TableKind) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = RawTable::new(kind, headers);

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(str::to_string).collect());
    }

    Ok(table)
}
