//! `dual targets`: show how the declared browser targets classify.

use std::path::PathBuf;

use console::style;
use dual_config::TransformDiscovery;
use dual_target::{
    Coverage, MatrixResolver, NormalizedMatrix, PAGES_DIR, QueryResolver, classify,
    count_modern_engines, resolve_targets, should_enable_secondary_pass,
};
use serde::Serialize;

use crate::cli::TargetsArgs;
use crate::commands::utils;
use crate::error::Result;

/// What the classifier saw for a project.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetsReport {
    /// Configuration files that declared the targets.
    pub config_files: Vec<PathBuf>,
    /// `None` when the targets could not be resolved.
    pub matrix: Option<BTreeMatrix>,
    pub coverage: Option<Coverage>,
    pub modern_engines: usize,
    pub modern_pass: bool,
    /// Why the matrix is missing, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Engine → minimum version, as printed.
pub type BTreeMatrix = std::collections::BTreeMap<String, String>;

pub fn execute(args: TargetsArgs) -> Result<()> {
    let root = utils::project_root(&args.cwd)?;
    let report = report(&root);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.config_files.is_empty() {
        println!("{} no transform config found", style("config:").bold());
    }
    for file in &report.config_files {
        println!("{} {}", style("config:").bold(), file.display());
    }
    if let Some(matrix) = &report.matrix {
        for (engine, version) in matrix {
            println!("  {engine:<10} {version}");
        }
    }
    if let Some(note) = &report.note {
        println!("{} {note}", style("note:").yellow().bold());
    }
    if let Some(coverage) = report.coverage {
        println!(
            "{} {} ({} modern)",
            style("coverage:").bold(),
            coverage_label(coverage),
            report.modern_engines
        );
    }
    let decision = if report.modern_pass {
        style("enabled").green()
    } else {
        style("disabled").dim()
    };
    println!("{} {decision}", style("modern pass:").bold());
    Ok(())
}

/// Build the report for a project root.
///
/// The modern-pass decision always comes from
/// [`should_enable_secondary_pass`], so this never disagrees with `dual build`.
pub fn report(root: &std::path::Path) -> TargetsReport {
    let modern_pass = should_enable_secondary_pass(root);
    let discovery = TransformDiscovery::new(root);

    let loaded = match discovery.load_partial(&root.join(PAGES_DIR)) {
        Ok(Some(loaded)) => loaded,
        Ok(None) => return empty_report(Vec::new(), modern_pass, None),
        Err(err) => return empty_report(Vec::new(), modern_pass, Some(err.to_string())),
    };
    let config_files: Vec<PathBuf> = loaded.files().map(|path| path.to_path_buf()).collect();

    match QueryResolver::new().resolve(&resolve_targets(&loaded.options)) {
        Ok(matrix) => TargetsReport {
            config_files,
            matrix: Some(printable(&matrix)),
            coverage: Some(classify(&matrix)),
            modern_engines: count_modern_engines(&matrix),
            modern_pass,
            note: None,
        },
        Err(err) => empty_report(config_files, modern_pass, Some(err.to_string())),
    }
}

fn empty_report(config_files: Vec<PathBuf>, modern_pass: bool, note: Option<String>) -> TargetsReport {
    TargetsReport {
        config_files,
        matrix: None,
        coverage: None,
        modern_engines: 0,
        modern_pass,
        note,
    }
}

fn printable(matrix: &NormalizedMatrix) -> BTreeMatrix {
    matrix
        .iter()
        .map(|(engine, version)| (engine.to_string(), version.to_string()))
        .collect()
}

fn coverage_label(coverage: Coverage) -> &'static str {
    match coverage {
        Coverage::None => "none",
        Coverage::Partial => "partial",
        Coverage::Full => "full",
    }
}
