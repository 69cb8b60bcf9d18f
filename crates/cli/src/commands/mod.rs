//! CLI command implementations

pub mod data;
pub mod savings;
pub mod views;
