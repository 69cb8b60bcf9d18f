//! Savings command

use anyhow::Result;
use colored::Colorize;
use sizing_lib::{FilterCriteria, SavingsSummary};

use crate::output::{color_savings, format_gib, format_percent, print_json, OutputFormat};
use crate::Session;

/// Show reclaimable capacity for the selected statistic
pub fn show_savings(session: &Session, criteria: &FilterCriteria) -> Result<()> {
    let dataset = session.load()?;
    let overview = dataset.overview(criteria);
    let savings =
        SavingsSummary::from_overviews(&overview.cpu, &overview.memory, criteria.statistic);

    match session.format {
        OutputFormat::Json => print_json(&savings)?,
        OutputFormat::Table => {
            println!("{}", "Savings Report".bold());
            println!("{}", "=".repeat(50));
            println!("Statistic:              {}", savings.statistic.to_string().cyan());
            println!("VMs:                    {}", overview.vm_count);
            println!();

            println!(
                "{} {} of {} ({})",
                "vCPUs:  ".bold(),
                color_savings(savings.cpu_vcpus.to_string(), savings.cpu_vcpus as f64),
                overview.cpu.provisioned(),
                format_percent(savings.cpu_percent)
            );
            println!(
                "{} {} of {} ({})",
                "Memory: ".bold(),
                color_savings(format_gib(savings.memory_gib), savings.memory_gib),
                format_gib(overview.memory.provisioned()),
                format_percent(savings.memory_percent)
            );
        }
    }

    Ok(())
}
