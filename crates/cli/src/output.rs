//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use sizing_lib::View;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a table from a list of rows
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a projected view with its dynamic columns
pub fn print_view(view: &View) {
    if view.is_empty() {
        println!("{}", "No VMs match the filters".yellow());
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(view.headers());
    for row in &view.rows {
        builder.push_record(row.iter().map(|cell| cell.to_string()));
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Two decimals, as in every exported number
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn format_gib(gib: f64) -> String {
    format!("{:.2} GiB", gib)
}

pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Green for reclaimable capacity, red when recommendations exceed provisioning
pub fn color_savings(formatted: String, value: f64) -> String {
    if value > 0.0 {
        formatted.green().to_string()
    } else if value < 0.0 {
        formatted.red().to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_amount(9.6), "9.60");
        assert_eq!(format_gib(0.5), "0.50 GiB");
        assert_eq!(format_percent(33.333), "33.3%");
    }

    #[test]
    fn test_color_savings_keeps_zero_plain() {
        assert_eq!(color_savings("0".to_string(), 0.0), "0");
    }

    #[test]
    fn test_output_format_from_config() {
        let format: OutputFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, OutputFormat::Json);
    }
}
