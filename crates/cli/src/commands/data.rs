//! Validation and export commands

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::Serialize;
use sizing_lib::{
    DataQualityError, Dataset, DatasetOptions, FilterCriteria, Findings, Report, ValidationMode,
};

use crate::output::{print_info, print_json, print_success, print_warning, OutputFormat};
use crate::Session;

const REPORT_JSON_FILE: &str = "report.json";

#[derive(Serialize)]
struct ValidationSummary<'a> {
    vm_count: usize,
    passed: bool,
    findings: &'a [DataQualityError],
}

/// Check the sheets and list every data-quality finding.
///
/// Schema and value errors always fail; with `strict` any
/// non-informational finding fails as well.
pub fn validate(session: &Session, strict: bool) -> Result<()> {
    let options = DatasetOptions {
        validation: ValidationMode::Warn,
        ..session.options.clone()
    };
    let dataset = Dataset::load(&session.paths, &options).context("Sheets failed validation")?;

    let blocking = dataset
        .findings()
        .iter()
        .filter(|f| !f.is_informational())
        .count();
    let passed = !(strict && blocking > 0);

    match session.format {
        OutputFormat::Json => print_json(&ValidationSummary {
            vm_count: dataset.len(),
            passed,
            findings: dataset.findings(),
        })?,
        OutputFormat::Table => {
            println!("{}", "Validation".bold());
            println!("{}", "=".repeat(50));
            println!("VMs:                    {}", dataset.len());
            println!("Findings:               {}", dataset.findings().len());
            println!();

            if dataset.findings().is_empty() {
                print_success("No data-quality findings");
            } else {
                print_warning(&format!(
                    "{} finding(s), {} blocking in strict mode",
                    dataset.findings().len(),
                    blocking
                ));
                print!("{}", Findings(dataset.findings()));
            }
        }
    }

    if !passed {
        bail!("{} data-quality finding(s) in strict mode", blocking);
    }
    Ok(())
}

/// Write the filtered view, both overviews and the savings to `output`
pub fn export(session: &Session, criteria: &FilterCriteria, output: &Path) -> Result<()> {
    let dataset = session.load()?;
    let report = Report::build(&dataset, criteria);

    let mut written = report
        .write_csv(output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;

    let json_path = output.join(REPORT_JSON_FILE);
    std::fs::write(&json_path, report.to_json()?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    written.push(json_path);

    match session.format {
        OutputFormat::Json => print_json(&written)?,
        OutputFormat::Table => {
            print_info(&format!(
                "Exported {} VMs ({} statistic)",
                report.vm_count, report.statistic
            ));
            for path in &written {
                print_success(&path.display().to_string());
            }
        }
    }

    Ok(())
}
