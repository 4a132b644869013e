use super::output::{confirm, print_actions_table, print_execution_summary, relative, run_actions};
use super::{Context, OutputFormat};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use declutter_lib::index::{count_hash_candidates, find_duplicates_with_progress};
use declutter_lib::util::{
    create_progress_bar, create_spinner, format_bytes, format_duration, format_timestamp,
    parse_size_string, progress,
};
use declutter_lib::{
    canonical_root, plan_duplicate_removal, scan_roots, CleanupExecutor, DeclutterError, DuplicateReport,
    DuplicateTarget, ExecutionMode, HashAlgorithm, Result, ScanOptions,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct DupesArgs {
    pub paths: Vec<PathBuf>,
    pub algorithm: Option<String>,
    pub min_size: Option<String>,
    pub skip_ext: Vec<String>,
    pub move_to: Option<PathBuf>,
    pub delete: bool,
    pub dry_run: bool,
    pub yes: bool,
    pub format: String,
}

pub fn handle_dupes_command(ctx: &Context, args: DupesArgs) -> Result<()> {
    let format = OutputFormat::from_str(&args.format)?;
    let settings = &ctx.config.dedup;

    let algorithm = match &args.algorithm {
        Some(name) => HashAlgorithm::from_str(name)?,
        None => settings.algorithm,
    };
    let min_file_size = match &args.min_size {
        Some(size) => parse_size_string(size)?,
        None => settings.min_file_size,
    };

    let roots = if args.paths.is_empty() {
        vec![ctx.config.downloads_dir.clone()]
    } else {
        args.paths.clone()
    };
    let primary_root = roots
        .iter()
        .find_map(|p| canonical_root(p).ok())
        .ok_or_else(|| DeclutterError::PathNotFound(roots[0].clone()))?;

    let mut scan_opts = ScanOptions::default()
        .with_skip_extensions(settings.skip_extensions.iter().chain(args.skip_ext.iter()))
        .with_skip_folders(&settings.skip_folders);
    scan_opts.min_file_size = min_file_size;

    let interactive = format == OutputFormat::Table && !ctx.quiet;
    let started = Instant::now();

    let spinner = if interactive {
        create_spinner("Scanning for files...")
    } else {
        progress::hidden()
    };
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    let scan = scan_roots(&roots, &scan_opts);
    spinner.finish_and_clear();

    let candidates = count_hash_candidates(&scan.records) as u64;
    let pb = if interactive && candidates > 0 {
        create_progress_bar(candidates, &format!("Hashing with {}", algorithm.as_str()))
    } else {
        progress::hidden()
    };
    let report = find_duplicates_with_progress(&scan.records, algorithm, |_| pb.inc(1));
    pb.finish_and_clear();

    let target = if args.delete {
        Some(DuplicateTarget::Delete)
    } else {
        args.move_to
            .clone()
            .or_else(|| settings.duplicates_folder.clone())
            .map(DuplicateTarget::MoveTo)
    };

    if format == OutputFormat::Json {
        return emit_json(ctx, &report, target.as_ref(), &primary_root, &args);
    }

    if !ctx.quiet {
        print_report(&report, ctx.verbose);
        println!(
            "  Files scanned: {} ({})",
            scan.stats.files_scanned,
            format_bytes(scan.stats.bytes_scanned)
        );
        if !scan.stats.errors.is_empty() {
            println!("  Scan errors: {}", style(scan.stats.errors.len()).yellow());
        }
        println!("  Elapsed: {}", format_duration(started.elapsed()));
    }

    let target = match target {
        Some(target) if !report.groups.is_empty() => target,
        _ => return Ok(()),
    };

    let mode = ExecutionMode::from_dry_run(args.dry_run);
    let actions = plan_duplicate_removal(&report, &target);
    if !ctx.quiet {
        println!();
        print_actions_table(&actions, &primary_root, ctx.verbose);
    }

    let prompt = match &target {
        DuplicateTarget::Delete => format!("Delete {} duplicate files?", report.duplicate_file_count()),
        DuplicateTarget::MoveTo(dir) => format!(
            "Move {} duplicate files to {}?",
            report.duplicate_file_count(),
            dir.display()
        ),
    };
    if !confirm(&prompt, args.yes, mode)? {
        println!("{}", style("Aborted").yellow());
        return Ok(());
    }

    let executor = CleanupExecutor::new(&primary_root, mode).with_empty_dir_pass(false);
    let execution = run_actions(ctx, &executor, &actions)?;
    if !ctx.quiet {
        print_execution_summary(&execution, &primary_root, ctx.verbose);
    }

    Ok(())
}

fn emit_json(
    ctx: &Context,
    report: &DuplicateReport,
    target: Option<&DuplicateTarget>,
    root: &Path,
    args: &DupesArgs,
) -> Result<()> {
    let execution = match target {
        Some(target) if !report.groups.is_empty() => {
            let mode = ExecutionMode::from_dry_run(args.dry_run);
            let actions = plan_duplicate_removal(report, target);
            if confirm("Apply duplicate removal?", args.yes, mode)? {
                let executor = CleanupExecutor::new(root, mode).with_empty_dir_pass(false);
                Some(run_actions(ctx, &executor, &actions)?)
            } else {
                None
            }
        }
        _ => None,
    };

    let output = serde_json::json!({
        "duplicates": report,
        "duplicate_files": report.duplicate_file_count(),
        "wasted_bytes": report.wasted_bytes(),
        "execution": execution,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_report(report: &DuplicateReport, verbose: bool) {
    if report.groups.is_empty() {
        println!("{} No duplicates found", style("✓").green());
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Group").fg(Color::Cyan),
            Cell::new("Size").fg(Color::Cyan),
            Cell::new("Copies").fg(Color::Cyan),
            Cell::new("Keep").fg(Color::Cyan),
            Cell::new("Modified").fg(Color::Cyan),
            Cell::new("Duplicates").fg(Color::Cyan),
        ]);

        for (i, group) in report.groups_by_copies().into_iter().enumerate() {
            let keeper = group.keeper();
            let keep = keeper
                .map(|k| k.path.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            let modified = keeper
                .and_then(|k| k.modified_at.as_ref())
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string());
            let others: Vec<String> = group
                .redundant()
                .map(|f| match keeper.and_then(|k| k.parent()) {
                    Some(dir) => relative(&f.path, dir),
                    None => f.path.display().to_string(),
                })
                .collect();

            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(format_bytes(group.size_bytes)),
                Cell::new(group.files.len()),
                Cell::new(keep).fg(Color::Green),
                Cell::new(modified),
                Cell::new(others.join("\n")),
            ]);
        }

        println!("{}", table);
        println!(
            "\n{} {} duplicate groups, {} redundant files",
            style(">>>").cyan(),
            style(report.groups.len()).bold(),
            style(report.duplicate_file_count()).bold()
        );
        println!("  Wasted space: {}", style(format_bytes(report.wasted_bytes())).yellow());
    }

    println!("  Files hashed: {}", report.files_hashed);
    if !report.skipped.is_empty() {
        println!("  Unreadable files skipped: {}", style(report.skipped.len()).yellow());
        if verbose {
            for (path, reason) in &report.skipped {
                println!("    {} {}", style(path.display()).dim(), reason);
            }
        }
    }
}
