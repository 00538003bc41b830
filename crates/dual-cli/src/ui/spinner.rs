//! Spinner for the build, hidden when nobody is watching.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Spinner for tasks without known duration.
///
/// ```no_run
/// use dual_cli::ui::Spinner;
///
/// let spinner = Spinner::new("Building...");
/// spinner.set_message("Building modern bundle...");
/// spinner.finish("Built");
/// ```
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        Self::with_visibility(message, console::user_attended_stderr() && !super::is_ci())
    }

    /// A spinner that never draws, for `--quiet` and piped output.
    pub fn hidden(message: &str) -> Self {
        Self::with_visibility(message, false)
    }

    fn with_visibility(message: &str, visible: bool) -> Self {
        let pb = ProgressBar::new_spinner();
        if !visible {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒", "●"]);
        pb.set_style(spinner_style);
        pb.set_message(message.to_string());
        if visible {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        Self { pb }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Stop with a green checkmark.
    pub fn finish(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", style("✓").green(), message));
    }

    /// Stop with a red cross.
    pub fn fail(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", style("✗").red(), message));
    }

    pub fn is_hidden(&self) -> bool {
        self.pb.is_hidden()
    }
}
