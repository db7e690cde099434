//! Terminal UI utilities
//!
//! Results go to stdout; warnings and errors go to stderr so that
//! `status --json` output stays machine readable.

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

/// Width of the key column in [`key_value`] output.
const KEY_WIDTH: usize = 14;

#[derive(Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
    Error,
}

fn mark(level: Level) -> ColoredString {
    match level {
        Level::Success => "✓".green().bold(),
        Level::Info => "ℹ".blue().bold(),
        Level::Warning => "⚠".yellow().bold(),
        Level::Error => "✗".red().bold(),
    }
}

fn line(level: Level, message: &str) -> String {
    format!("{} {}", mark(level), message)
}

/// Print a success message
pub fn success(message: &str) {
    println!("{}", line(Level::Success, message));
}

/// Print an info message
pub fn info(message: &str) {
    println!("{}", line(Level::Info, message));
}

/// Print a warning to stderr
pub fn warning(message: &str) {
    eprintln!("{}", line(Level::Warning, message));
}

/// Print an error to stderr
pub fn error(message: &str) {
    eprintln!("{}", line(Level::Error, message));
}

/// Print a section header
pub fn header(text: &str) {
    println!("\n{}", text.bold().underline());
}

/// Print a key-value pair with keys aligned in one column
pub fn key_value(key: &str, value: &str) {
    println!("  {} {}", pad_key(key).cyan(), value);
}

fn pad_key(key: &str) -> String {
    format!("{:<width$}", format!("{}:", key), width = KEY_WIDTH)
}

/// Print a separator line
pub fn separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// Print JSON prettily
pub fn json(value: &serde_json::Value) {
    if let Ok(pretty) = serde_json::to_string_pretty(value) {
        println!("{}", pretty);
    }
}

/// Format a Unix timestamp for display
pub fn timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{} (invalid)", secs))
}

/// Format a number of seconds as `1h 02m 03s`
pub fn duration(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.unsigned_abs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}{}h {:02}m {:02}s", sign, h, m, s)
    } else if m > 0 {
        format!("{}{}m {:02}s", sign, m, s)
    } else {
        format!("{}{}s", sign, s)
    }
}
