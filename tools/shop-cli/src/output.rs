//! Output formatting for the CLI.
//!
//! In `--json` mode the human-readable lines are suppressed and commands
//! print a single JSON document instead.

use console::{style, StyledObject};
use serde::Serialize;

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Whether commands should print a JSON document.
    pub fn is_json(&self) -> bool {
        self.json
    }

    fn line(&self, marker: StyledObject<&str>, msg: impl std::fmt::Display) {
        if !self.json {
            println!("{} {}", marker, msg);
        }
    }

    fn err_line(&self, marker: StyledObject<&str>, msg: impl std::fmt::Display) {
        if !self.json {
            eprintln!("{} {}", marker, msg);
        }
    }

    pub fn info(&self, msg: &str) {
        self.line(style("ℹ").blue(), msg);
    }

    pub fn success(&self, msg: &str) {
        self.line(style("✓").green(), msg);
    }

    pub fn warn(&self, msg: &str) {
        self.err_line(style("⚠").yellow(), msg);
    }

    /// Errors are still reported in JSON mode, as `{"error": ...}` on stderr.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            self.err_line(style("✗").red(), style(msg).red());
        }
    }

    /// Only shown with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            self.err_line(style("→").dim(), style(msg).dim());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.json {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// `[2/4] Product page`
    pub fn step(&self, num: usize, total: usize, msg: &str) {
        if !self.json {
            println!("{} {}", style(format!("[{}/{}]", num, total)).dim(), msg);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if !self.json {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if !self.json {
            println!("  {} {}", style("•").dim(), item);
        }
    }

    /// Left-aligned columns padded to `widths`.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let row = cols
            .iter()
            .zip(widths)
            .map(|(col, width)| format!("{:<width$}", col, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", row);
    }

    /// Pretty-printed JSON, printed in either mode.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Could not serialize output: {}", e)),
        }
    }
}
