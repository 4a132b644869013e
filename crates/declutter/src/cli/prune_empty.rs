use super::output::{confirm, print_execution_summary};
use super::Context;
use console::style;
use declutter_lib::{CleanupExecutor, EmptyDirScope, ExecutionMode, Result};
use std::path::PathBuf;

pub fn handle_prune_empty_command(ctx: &Context, root: PathBuf, dry_run: bool, yes: bool) -> Result<()> {
    let root = ctx.resolve_root(Some(root))?;
    let mode = ExecutionMode::from_dry_run(dry_run);

    let prompt = format!("Remove empty folders under {}?", root.display());
    if !confirm(&prompt, yes, mode)? {
        println!("{}", style("Aborted").yellow());
        return Ok(());
    }

    let report = CleanupExecutor::new(&root, mode)
        .with_empty_dir_scope(EmptyDirScope::Tree)
        .with_skip_folders(&ctx.config.dedup.skip_folders)
        .execute(&[])?;

    if !ctx.quiet {
        if report.removed_dirs.is_empty() {
            println!("{} No empty folders found", style("✓").green());
        } else {
            print_execution_summary(&report, &root, true);
        }
    }

    Ok(())
}
