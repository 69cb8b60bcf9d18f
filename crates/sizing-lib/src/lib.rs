//! VM right-sizing engine
//!
//! This crate provides the core functionality for:
//! - Loading and normalizing the vInfo, vCPU and vMemory sheets
//! - Joining them into one record per VM with buffered recommendations
//! - Filtered views, overview totals and savings
//! - Report export and observability

pub mod dataset;
pub mod error;
pub mod ingest;
pub mod models;
pub mod observability;
pub mod report;
pub mod sizing;

pub use dataset::{Dataset, DatasetOptions, Overview};
pub use error::{DataQualityError, EngineError, EngineResult, Findings, LoadError, SchemaError};
pub use ingest::{SheetPaths, SourceSchema, SourceTables, TableKind};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use report::Report;
pub use sizing::{
    CellValue, Column, FilterCriteria, OverviewAggregate, SavingsSummary, ValidationMode, View,
};
