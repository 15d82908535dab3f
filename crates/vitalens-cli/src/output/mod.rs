//! Output formatting module
//!
//! Provides table and JSON output formatting for CLI commands.

use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use tabled::{Table, Tabled};

/// Output format enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {}. Use 'table' or 'json'", s)),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Print rows in the specified format
pub fn print_output<T>(data: &[T], format: OutputFormat) -> anyhow::Result<()>
where
    T: Serialize + Tabled,
{
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("No items found.");
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => print_json(data)?,
    }
    Ok(())
}

/// Print a single row in the specified format
pub fn print_single<T>(data: &T, format: OutputFormat) -> anyhow::Result<()>
where
    T: Serialize + Tabled,
{
    match format {
        OutputFormat::Table => println!("{}", Table::new([data])),
        OutputFormat::Json => print_json(data)?,
    }
    Ok(())
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a success message (respects quiet mode)
pub fn print_success(message: &str, quiet: bool) {
    if !quiet {
        println!("{}", colored::Colorize::green(message));
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{}", colored::Colorize::red(message));
}

/// Print an info message (respects quiet mode)
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        println!("{}", message);
    }
}

/// Redraw a one-line progress indicator on stderr
pub fn print_progress(label: &str, fraction: f64) {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
    let filled = (percent / 5) as usize;
    eprint!(
        "\r{} [{}{}] {:>3}%",
        label,
        "#".repeat(filled),
        " ".repeat(20 - filled),
        percent
    );
    if percent >= 100 {
        eprintln!();
    }
    let _ = std::io::stderr().flush();
}

/// Format an optional amount with its unit, `-` when absent
pub fn format_amount(value: Option<f64>, unit: &str) -> String {
    let text = match value {
        Some(v) if v.fract() == 0.0 => format!("{:.0} {}", v, unit),
        Some(v) => format!("{:.1} {}", v, unit),
        None => return "-".to_string(),
    };
    text.trim_end().to_string()
}
