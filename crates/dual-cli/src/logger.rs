//! Logging setup for the dual CLI.
//!
//! Verbosity is chosen in this order:
//! 1. `--verbose`: debug for the dual crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. `settings.log_level` from dual.toml
//! 5. info for the dual crates
//!
//! Logs go to stderr so `dual targets --json` stays pipeable.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: &[&str] = &["dual_cli", "dual_bundler", "dual_config", "dual_target"];

/// Initialize the tracing subscriber.
///
/// Call once, before anything logs.
///
/// ```rust,no_run
/// use dual_cli::logger::init_logger;
///
/// init_logger(false, false, false, Some("warn"));
/// ```
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool, configured: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new(directives("debug"))
    } else if quiet {
        EnvFilter::new(directives("error"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directives(configured_level(configured))))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .without_time()
        .with_writer(std::io::stderr)
        .compact();

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("a global subscriber is already installed");
    }
}

/// Filter directives enabling `level` for every dual crate.
fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Level named in dual.toml, falling back to info for unknown names.
fn configured_level(configured: Option<&str>) -> &'static str {
    match configured.map(str::to_ascii_lowercase).as_deref() {
        Some("silent" | "off") => "off",
        Some("error") => "error",
        Some("warn" | "warning") => "warn",
        Some("debug") => "debug",
        Some("trace") => "trace",
        _ => "info",
    }
}
