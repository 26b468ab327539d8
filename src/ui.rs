//! Terminal output: stage banners, the run summary, and the retry spinner.
//!
//! Engine output is not captured.  borg writes its own progress and statistics
//! straight to the terminal, and this module only frames it with a start line
//! and a result line carrying the numeric exit status.  Diagnostics meant for
//! operators go through `tracing` instead.

use std::{fmt::Display, time::Duration};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames — same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Green ✓  — printed when a stage succeeds.
fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
/// Red ✗    — printed when a stage fails.
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
/// Cyan ✓   — printed next to the final success summary.
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}
/// Dim ►    — printed when a stage starts.
fn icon_start() -> console::StyledObject<&'static str> {
    style("►").dim()
}

// ─── Stage banners ────────────────────────────────────────────────────────────

/// Human-readable description of an exit status.
pub fn describe_status(code: i32) -> String {
    if code == 0 {
        "finished successfully (exit code 0)".into()
    } else {
        format!("failed with exit code {code}")
    }
}

/// Printed right before the engine is spawned.
pub fn stage_started(label: &str) {
    println!("  {}  {} starting", icon_start(), style(label).bold());
}

/// Printed once the engine has exited.
pub fn stage_finished(label: &str, code: i32) {
    if code == 0 {
        println!(
            "  {}  {} {}",
            icon_ok(),
            style(label).bold(),
            describe_status(code)
        );
    } else {
        eprintln!(
            "  {}  {} {}",
            icon_err(),
            style(label).bold(),
            style(describe_status(code)).red()
        );
    }
}

/// Printed for a stage that never reached the engine.
pub fn stage_aborted(label: &str, reason: &dyn Display) {
    eprintln!(
        "  {}  {} {}",
        icon_err(),
        style(label).bold(),
        style(format!("not started: {reason}")).red()
    );
}

// ─── Messages ─────────────────────────────────────────────────────────────────

pub fn info(msg: &str) {
    println!("  {} {}", style("ℹ").blue(), msg);
}

pub fn warn(msg: &str) {
    eprintln!("  {} {}", style("!").yellow().bold(), msg);
}

/// Fatal error line printed by `main` before exiting.
pub fn print_error(err: &dyn Display) {
    eprintln!("{} {}", style("Error:").red().bold(), err);
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Start an indeterminate spinner; callers clear it with
/// [`ProgressBar::finish_and_clear`].
pub fn spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("  {spinner:.cyan}  {msg}") {
        pb.set_style(template.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Summary banner ───────────────────────────────────────────────────────────

/// Final banner for `qb run`, listing every stage with its status.
pub fn print_summary(stages: &[(&str, i32)]) {
    println!();
    if stages.iter().all(|(_, code)| *code == 0) {
        println!(
            "  {} {}",
            icon_done(),
            style("Backup, prune and check completed successfully.")
                .cyan()
                .bold()
        );
    } else {
        eprintln!("  {}  {}", icon_err(), style("Backup run failed.").red().bold());
        for (label, code) in stages {
            let icon = if *code == 0 { icon_ok() } else { icon_err() };
            eprintln!("    {icon} {label}: exit code {code}");
        }
    }
    println!();
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_described_as_success() {
        assert_eq!(describe_status(0), "finished successfully (exit code 0)");
    }

    #[test]
    fn non_zero_status_names_the_code() {
        assert_eq!(describe_status(2), "failed with exit code 2");
        assert_eq!(describe_status(127), "failed with exit code 127");
    }

    #[test]
    fn summary_with_all_successes_does_not_panic() {
        print_summary(&[("Create", 0), ("Prune", 0), ("Check", 0)]);
    }

    #[test]
    fn summary_with_failure_does_not_panic() {
        print_summary(&[("Create", 1), ("Prune", 0), ("Check", 2)]);
    }

    #[test]
    fn spinner_can_be_cleared() {
        let pb = spinner("waiting");
        pb.finish_and_clear();
        assert!(pb.is_finished());
    }
}
