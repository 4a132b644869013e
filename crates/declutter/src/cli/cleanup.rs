use super::output::{confirm, print_actions_table, print_execution_summary, run_actions};
use super::Context;
use chrono::Utc;
use console::style;
use declutter_lib::{
    scan_directory, ActionKind, CleanupExecutor, CleanupPlanner, ClassificationRules,
    ExecutionMode, PlannerOptions, Result, RuleEngine, ScanOptions,
};
use std::path::PathBuf;

pub struct CleanupArgs {
    pub root: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub dry_run: bool,
    pub yes: bool,
    pub no_organize: bool,
}

/// Rules from `--rules`, then the configured rules file, then the built-ins.
pub fn load_rules(ctx: &Context, rules: Option<PathBuf>) -> Result<ClassificationRules> {
    match rules.or_else(|| ctx.config.cleanup.rules_file.clone()) {
        Some(path) => {
            log::debug!("Loading rules from {}", path.display());
            ClassificationRules::from_file(path)
        }
        None => Ok(ClassificationRules::downloads_defaults(
            ctx.config.cleanup.installer_age_days,
        )),
    }
}

pub fn handle_cleanup_command(ctx: &Context, args: CleanupArgs) -> Result<()> {
    let root = ctx.resolve_root(args.root)?;
    let mode = ExecutionMode::from_dry_run(args.dry_run);

    let engine = RuleEngine::new(load_rules(ctx, args.rules)?, Utc::now())?;

    let scan_opts = ScanOptions {
        max_depth: Some(args.max_depth.unwrap_or(ctx.config.cleanup.max_depth)),
        ..ScanOptions::default()
    }
    .with_skip_folders(&ctx.config.dedup.skip_folders);
    let scan = scan_directory(&root, &scan_opts)?;

    if !ctx.quiet {
        println!(
            "{} Examining {} files in {}",
            style(">>>").cyan(),
            style(scan.records.len()).bold(),
            root.display()
        );
    }

    let planner = CleanupPlanner::new(
        &engine,
        &root,
        PlannerOptions {
            organize: !args.no_organize,
        },
    );
    let actions = planner.plan(&scan.records);

    let deletes = actions.iter().filter(|a| a.kind == ActionKind::Delete).count();
    let moves = actions
        .iter()
        .filter(|a| matches!(a.kind, ActionKind::Move(_)))
        .count();

    if !ctx.quiet {
        print_actions_table(&actions, &root, ctx.verbose);
        println!(
            "  Planned: {} deletions, {} moves, {} left alone",
            style(deletes).red(),
            style(moves).green(),
            style(actions.len() - deletes - moves).dim()
        );
    }

    if deletes + moves > 0 {
        let prompt = format!(
            "Delete {} and move {} files under {}?",
            deletes,
            moves,
            root.display()
        );
        if !confirm(&prompt, args.yes, mode)? {
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
