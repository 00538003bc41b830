//! Dual CLI - differential legacy/modern builds from the command line.
//!
//! - [`cli`] - argument definitions
//! - `commands` - `targets`, `cache-key` and `build`
//! - [`error`] - error types and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - terminal messages, spinner and summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use dual_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false, None);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
