//! Shared CLI output helpers.
//!
//! Status lines (success, warnings, key/value summaries) go to stderr so
//! callers can capture stdout safely; [`data`] is the only helper that
//! writes to stdout. Colors respect NO_COLOR.

use colored::Colorize;
use std::fmt::Display;

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a success status line to stderr.
///
/// Example: `✓ set DATABASE_URL`
pub fn success(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "✓".green(), msg);
    } else {
        eprintln!("✓ {}", msg);
    }
}

/// Print a warning to stderr.
///
/// Example: `⚠ private key is not password protected`
pub fn warn(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "⚠".yellow(), msg);
    } else {
        eprintln!("⚠ {}", msg);
    }
}

/// Print an informational status line to stderr.
pub fn status(msg: &str) {
    eprintln!("{}", msg);
}

/// Print a key-value status pair to stderr (label dimmed, value bold).
///
/// Example: `  public key:  age1...`
pub fn kv(label: &str, value: impl Display) {
    if colors_enabled() {
        eprintln!("  {}  {}", label.dimmed(), value.to_string().bold());
    } else {
        eprintln!("  {}  {}", label, value);
    }
}

/// Write a line of data to stdout.
///
/// This is the only path that writes to the primary output stream.
pub fn data(msg: &str) {
    println!("{}", msg);
}
