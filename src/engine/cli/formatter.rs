//! CLI Output Formatting Module
//! Provides consistent, colorized output for terminal UX

use colored::Colorize;
use serde_json::{json, Value};

use crate::engine::updater::UpdateEvent;

pub struct CliFormatter;

impl CliFormatter {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }

    /// Print a section header
    pub fn header(title: &str) {
        println!("\n{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(title.len()).bright_black());
    }

    /// Print a key-value pair
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", key.bright_white().bold(), value);
    }

    /// Print a list item
    pub fn item(text: &str) {
        println!("  {} {}", "•".bright_black(), text);
    }

    /// Print one update event
    pub fn event(event: &UpdateEvent) {
        match event {
            UpdateEvent::Checking => Self::info("Checking for updates"),
            UpdateEvent::NotAvailable => Self::info("No update available"),
            UpdateEvent::Available { version } => {
                Self::info(&format!("Update {} available", version.bold()))
            }
            UpdateEvent::Downloaded(info) => {
                Self::success(&format!("Update {} downloaded", info.version.bold()));
                if let Some(notes) = &info.release_notes {
                    Self::kv("Release notes", notes);
                }
            }
            UpdateEvent::Error(e) => Self::error(&e.to_string()),
        }
    }
}

/// JSON rendering of an event, one object per line in `--format json`
pub fn event_json(event: &UpdateEvent) -> Value {
    match event {
        UpdateEvent::Available { version } => json!({ "event": event.name(), "version": version }),
        UpdateEvent::Downloaded(info) => json!({ "event": event.name(), "info": info }),
        UpdateEvent::Error(e) => json!({ "event": event.name(), "error": e.to_string() }),
        _ => json!({ "event": event.name() }),
    }
}

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}
