//! Pure formatting functions for UI output.
//!
//! Everything here either returns a string or prints one; nothing reads input.

use crate::cli::orchestration::{AppOutcome, BuildReport};
use console::style;
use std::fmt::Write;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Render the per-app result of a build.
///
/// One line per app in id order, then a totals line and the index location.
pub fn format_build_summary(report: &BuildReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style("Build summary").bold());

    for outcome in &report.outcomes {
        let _ = match outcome {
            AppOutcome::Built { app, releases } => writeln!(
                out,
                "  {} {} ({} release{})",
                style("✓").green(),
                app,
                releases,
                if *releases == 1 { "" } else { "s" }
            ),
            AppOutcome::Failed { app, error } => {
                writeln!(out, "  {} {}: {}", style("✗").red(), app, error)
            }
        };
    }

    let failed = report.outcomes.len() - report.built_count();
    let _ = writeln!(
        out,
        "\n{} built, {} failed",
        style(report.built_count()).green(),
        if failed > 0 {
            style(failed).red()
        } else {
            style(failed).dim()
        }
    );
    let _ = write!(out, "Index written to {}", report.index_path.display());
    out
}

/// Print the build summary to stdout.
pub fn display_build_summary(report: &BuildReport) {
    println!("\n{}", format_build_summary(report));
}
