//! Recommendation engine
//!
//! Joins the normalized sheets into one record per VM, derives the
//! per-statistic recommendations, and answers filtered queries over the
//! result: projected views, overview totals and savings.

mod aggregate;
mod join;
mod projection;
mod recommend;
mod validation;


pub use aggregate::{aggregate, OverviewAggregate, OverviewRow, SavingsSummary, OVERVIEW_LABELS};
pub use join::join;
pub use projection::{
    filter_records, observed_clusters, observed_power_states, project, CellValue, Column,
    FilterCriteria, View,
};
pub use recommend::{
    recommend, recommend_all, recommend_vm, Capacity, CPU_FLOOR_VCPUS, HEADROOM_FACTOR,
    MEMORY_FLOOR_GIB,
};
pub use validation::{validate, ValidationMode};
