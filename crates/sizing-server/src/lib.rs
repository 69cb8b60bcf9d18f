//! Read-only HTTP service over one loaded right-sizing dataset

pub mod api;
pub mod config;
