use super::output::{confirm, print_actions_table, print_execution_summary, run_actions};
use super::Context;
use console::style;
use declutter_lib::{plan_purge, scan_directory, CleanupExecutor, ExecutionMode, Result, ScanOptions};
use std::path::PathBuf;

pub fn handle_purge_command(
    ctx: &Context,
    root: PathBuf,
    extensions: Vec<String>,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let root = ctx.resolve_root(Some(root))?;
    let mode = ExecutionMode::from_dry_run(dry_run);

    let scan_opts = ScanOptions::default().with_skip_folders(&ctx.config.dedup.skip_folders);
    let scan = scan_directory(&root, &scan_opts)?;
    let actions = plan_purge(&scan.records, &extensions);

    if !ctx.quiet {
        print_actions_table(&actions, &root, false);
    }

    if !actions.is_empty() {
        let prompt = format!(
            "Delete {} files with extension {}?",
            actions.len(),
            extensions.join(", ")
        );
        if !confirm(&prompt, yes, mode)? {
            println!("{}", style("Aborted").yellow());
            return Ok(());
        }
    }

    let executor = CleanupExecutor::new(&root, mode).with_skip_folders(&ctx.config.dedup.skip_folders);
    let report = run_actions(ctx, &executor, &actions)?;

    if !ctx.quiet {
        print_execution_summary(&report, &root, ctx.verbose);
    }

    Ok(())
}
