//! Status lines on stderr.

use console::style;

/// Print a success message.
///
/// ```no_run
/// dual_cli::ui::success("Build completed");
/// ```
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), message);
}

/// Print a warning message.
///
/// Used for degraded builds, where the legacy bundle exists but the modern
/// one does not.
pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}
