//! Per-VM and overview commands

use anyhow::Result;
use colored::Colorize;
use sizing_lib::sizing::OVERVIEW_LABELS;
use sizing_lib::{FilterCriteria, Overview};
use tabled::Tabled;

use crate::output::{format_amount, print_json, print_table, print_view, OutputFormat};
use crate::Session;

/// Row for the overview table
#[derive(Tabled)]
struct OverviewTableRow {
    #[tabled(rename = "")]
    label: String,
    #[tabled(rename = "vCPUs")]
    vcpus: String,
    #[tabled(rename = "vMemory (GiB)")]
    memory_gib: String,
}

fn overview_rows(overview: &Overview) -> Vec<OverviewTableRow> {
    OVERVIEW_LABELS
        .iter()
        .zip(overview.cpu.totals())
        .zip(overview.memory.totals())
        .map(|((label, vcpus), gib)| OverviewTableRow {
            label: label.to_string(),
            vcpus: format_amount(vcpus),
            memory_gib: format_amount(gib),
        })
        .collect()
}

/// Show provisioned and recommended totals for the filtered VMs
pub fn show_overview(session: &Session, criteria: &FilterCriteria) -> Result<()> {
    let dataset = session.load()?;
    let overview = dataset.overview(criteria);

    match session.format {
        OutputFormat::Json => print_json(&overview)?,
        OutputFormat::Table => {
            println!("{}", "Overview".bold());
            println!("{}", "=".repeat(50));
            println!("VMs:                    {}", overview.vm_count);
            println!();
            print_table(&overview_rows(&overview));
        }
    }

    Ok(())
}

/// List per-VM utilization and recommendations
pub fn show_vms(session: &Session, criteria: &FilterCriteria) -> Result<()> {
    let dataset = session.load()?;
    let view = dataset.view(criteria);

    match session.format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Table => {
            print_view(&view);
            println!(
                "{} of {} VMs",
                view.len().to_string().bold(),
                dataset.len()
            );
        }
    }

    Ok(())
}
