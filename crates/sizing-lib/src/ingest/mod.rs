//! Source table ingestion
//!
//! The collector workbook is exported sheet by sheet; each sheet arrives here
//! as a [`RawTable`] of string cells. The [`Normalizer`] maps the raw headers
//! onto the canonical schema and parses the cells into typed records.

mod loader;
mod normalizer;
mod schema;

pub use loader::{load_csv_table, read_csv_table, SheetPaths};
pub use normalizer::{NormalizedTables, Normalizer};
pub use schema::{normalize_header, SourceSchema};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three source sheets of a collector export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Inventory,
    Cpu,
    Memory,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Inventory, TableKind::Cpu, TableKind::Memory];

    /// Sheet name in the collector workbook
    pub fn sheet_name(self) -> &'static str {
        match self {
            TableKind::Inventory => "vInfo",
            TableKind::Cpu => "vCPU",
            TableKind::Memory => "vMemory",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// Untyped sheet contents: a header row plus string cells
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub kind: TableKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(kind: TableKind, headers: Vec<String>) -> Self {
        Self {
            kind,
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string slices
    pub fn from_rows(kind: TableKind, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            kind,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row`/`column`; short rows read as empty cells
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// The three raw sheets of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTables {
    pub inventory: RawTable,
    pub cpu: RawTable,
    pub memory: RawTable,
}
