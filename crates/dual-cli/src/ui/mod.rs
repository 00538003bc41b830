//! Terminal output: status messages, a spinner and build summaries.
//!
//! Everything here writes to stderr. Stdout is reserved for command results
//! such as `dual targets --json` and `dual cache-key`.
//!
//! ```no_run
//! use dual_cli::ui;
//!
//! ui::init_colors(false);
//!
//! let spinner = ui::Spinner::new("Building...");
//! spinner.finish("Built 2 files");
//! ui::warning("Modern bundle skipped");
//! ```

mod format;
mod messages;
mod spinner;

pub use format::{AssetRow, format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};
pub use spinner::Spinner;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether a
/// person is watching stderr.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Enable or disable styled output for the rest of the process.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_flag_disables_styling() {
        init_colors(true);
        assert!(!console::colors_enabled_stderr());
        assert_eq!(console::style("x").green().to_string(), "x");
    }
}
