//! Output formatting utilities

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use rainfall_lib::Category;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No rows".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Category badge colored by severity
pub fn color_category(category: Category) -> ColoredString {
    let badge = category.badge();
    match category {
        Category::ClearLight => badge.green(),
        Category::Moderate => badge.yellow(),
        Category::Extreme => badge.red().bold(),
    }
}

/// Availability marker for a model artifact
pub fn color_available(available: bool) -> String {
    if available {
        "yes".green().to_string()
    } else {
        "missing".red().to_string()
    }
}
