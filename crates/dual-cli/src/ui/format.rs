//! Sizes, durations and the asset table printed after a build.

use console::{Term, style};
use std::time::Duration;

/// Format file size in human-readable format.
///
/// ```
/// use dual_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use dual_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// One emitted file in the build summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    pub name: String,
    pub size: u64,
    /// Name of the chunk the file belongs to, if any.
    pub chunk: Option<String>,
}

/// Print the emitted files with their chunk, then the totals.
pub fn print_build_summary(rows: &[AssetRow], duration: Duration) {
    let width = Term::stderr().size().1 as usize;

    eprintln!("\n{}", style("Build Summary").bold().underlined());
    eprintln!("{}", "─".repeat(width.clamp(20, 80)));

    let name_width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0);
    for row in rows {
        let tag = style(row.chunk.as_deref().unwrap_or("-")).cyan();
        eprintln!(
            "  {} {:<name_width$}  {:>10}  {}",
            style("▸").blue(),
            style(&row.name).bold(),
            style(format_size(row.size)).dim(),
            tag,
        );
    }

    let total: u64 = rows.iter().map(|row| row.size).sum();
    eprintln!("{}", "─".repeat(width.clamp(20, 80)));
    eprintln!(
        "  {} {} files, {} in {}",
        style("Total:").bold(),
        rows.len(),
        format_size(total),
        format_duration(duration),
    );
}
