use super::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use declutter_lib::util::{create_progress_bar, format_bytes, progress};
use declutter_lib::{
    ActionKind, CleanupAction, CleanupExecutor, ExecutionMode, ExecutionReport, Result,
};
use dialoguer::Confirm;
use std::path::Path;

/// Asks before mutating. Always true for `--yes` and dry runs.
pub fn confirm(prompt: &str, assume_yes: bool, mode: ExecutionMode) -> Result<bool> {
    if assume_yes || mode.is_dry_run() {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

pub fn print_actions_table(actions: &[CleanupAction], root: &Path, include_skipped: bool) {
    let shown: Vec<&CleanupAction> = actions
        .iter()
        .filter(|a| include_skipped || a.is_mutation())
        .collect();

    if shown.is_empty() {
        println!("{}", style("Nothing to do").yellow());
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Action").fg(Color::Cyan),
        Cell::new("File").fg(Color::Cyan),
        Cell::new("Destination").fg(Color::Cyan),
        Cell::new("Reason").fg(Color::Cyan),
    ]);

    for action in shown {
        let (label, destination) = match &action.kind {
            ActionKind::Delete => (Cell::new("delete").fg(Color::Red), "-".to_string()),
            ActionKind::Move(dest) => (Cell::new("move").fg(Color::Green), relative(dest, root)),
            ActionKind::Skip => (Cell::new("skip").fg(Color::DarkGrey), "-".to_string()),
        };

        table.add_row(vec![
            label,
            Cell::new(relative(&action.target, root)),
            Cell::new(destination),
            Cell::new(&action.reason),
        ]);
    }

    println!("{}", table);
}

/// Runs the executor with a progress bar unless `--quiet`.
pub fn run_actions(
    ctx: &Context,
    executor: &CleanupExecutor,
    actions: &[CleanupAction],
) -> Result<ExecutionReport> {
    let pb = if ctx.quiet || actions.is_empty() {
        progress::hidden()
    } else {
        create_progress_bar(actions.len() as u64, "Applying actions")
    };

    let report = executor.execute_with_progress(actions, |action| {
        pb.set_message(action.target.display().to_string());
        pb.inc(1);
    })?;

    pb.finish_and_clear();
    Ok(report)
}

pub fn print_execution_summary(report: &ExecutionReport, root: &Path, verbose: bool) {
    let header = if report.dry_run {
        format!("{} Dry run complete, nothing was changed", style("✓").green())
    } else {
        format!("{} Cleanup complete", style("✓").green())
    };
    println!("\n{}", header);

    let (deleted, moved) = if report.dry_run {
        ("Would delete", "Would move")
    } else {
        ("Deleted", "Moved")
    };

    println!("  Processed: {}", style(report.processed).cyan());
    println!("  {}: {}", deleted, style(report.deleted).cyan());
    println!("  {}: {}", moved, style(report.moved).cyan());
    println!("  Skipped: {}", style(report.skipped).yellow());
    println!("  Failed: {}", style(report.failed).red());
    if report.bytes_freed > 0 {
        println!("  Space freed: {}", style(format_bytes(report.bytes_freed)).cyan());
    }
    if !report.removed_dirs.is_empty() {
        let label = if report.dry_run {
            "Empty folders to remove"
        } else {
            "Empty folders removed"
        };
        println!("  {}: {}", label, style(report.removed_dirs.len()).cyan());
        if verbose {
            for dir in &report.removed_dirs {
                println!("    {}", style(relative(dir, root)).dim());
            }
        }
    }

    for (path, message) in &report.failures {
        println!("  {} {}: {}", style("✗").red(), path.display(), message);
    }
}

pub fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}
