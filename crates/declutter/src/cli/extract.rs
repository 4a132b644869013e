use super::output::{confirm, print_actions_table, print_execution_summary, relative, run_actions};
use super::Context;
use console::style;
use declutter_lib::util::{create_progress_bar, format_bytes, progress};
use declutter_lib::{
    canonical_root, plan_purge, scan_directory, AttachmentExtractor, CleanupExecutor, ExecutionMode,
    ExtractionReport, Result, ScanOptions,
};
use std::path::{Path, PathBuf};

pub struct ExtractArgs {
    pub root: Option<PathBuf>,
    pub to: Option<PathBuf>,
    pub max_nesting: Option<usize>,
    pub remove_bin: bool,
    pub dry_run: bool,
    pub yes: bool,
}

pub fn handle_extract_command(ctx: &Context, args: ExtractArgs) -> Result<()> {
    let root = ctx.resolve_root(args.root)?;
    let mode = ExecutionMode::from_dry_run(args.dry_run);
    let settings = &ctx.config.extract;
    let destination = args.to.unwrap_or_else(|| root.join(&settings.folder_name));

    let extractor = AttachmentExtractor::new(&destination, mode)
        .with_max_nesting(args.max_nesting.unwrap_or(settings.max_nesting))
        .with_skip_folders(&ctx.config.dedup.skip_folders);

    let messages = extractor.find_messages(&root)?;
    if messages.is_empty() {
        if !ctx.quiet {
            println!("{} No .eml or .msg files under {}", style("✓").green(), root.display());
        }
        return Ok(());
    }

    let pb = if ctx.quiet {
        progress::hidden()
    } else {
        create_progress_bar(messages.len() as u64, "Extracting attachments")
    };
    let report = extractor.extract_with_progress(&messages, |path| {
        pb.set_message(relative(path, &root));
        pb.inc(1);
    });
    pb.finish_and_clear();

    if !ctx.quiet {
        print_extraction_summary(&report, &destination, ctx.verbose);
    }

    if args.remove_bin {
        remove_bin_files(ctx, &report, &destination, mode, args.yes)?;
    }

    Ok(())
}

/// Deletes every `.bin` under the destination, then the folders that leaves
/// empty.
fn remove_bin_files(
    ctx: &Context,
    report: &ExtractionReport,
    destination: &Path,
    mode: ExecutionMode,
    yes: bool,
) -> Result<()> {
    if mode.is_dry_run() {
        let pending = report
            .written
            .iter()
            .filter(|p| p.extension().map_or(false, |e| e.eq_ignore_ascii_case("bin")))
            .count();
        println!("  Would then remove {} .bin files", style(pending).cyan());
        return Ok(());
    }
    if !destination.is_dir() {
        return Ok(());
    }
    let destination = canonical_root(destination)?;
    let destination = destination.as_path();

    let scan = scan_directory(destination, &ScanOptions::default())?;
    let actions = plan_purge(&scan.records, &["bin".to_string()]);
    if actions.is_empty() {
        return Ok(());
    }

    if !ctx.quiet {
        print_actions_table(&actions, destination, false);
    }
    let prompt = format!("Delete {} .bin files under {}?", actions.len(), destination.display());
    if !confirm(&prompt, yes, mode)? {
        println!("{}", style("Aborted").yellow());
        return Ok(());
    }

    let executor = CleanupExecutor::new(destination, mode);
    let execution = run_actions(ctx, &executor, &actions)?;
    if !ctx.quiet {
        print_execution_summary(&execution, destination, ctx.verbose);
    }
    Ok(())
}

fn print_extraction_summary(report: &ExtractionReport, destination: &Path, verbose: bool) {
    let header = if report.dry_run {
        format!("{} Dry run complete, nothing was written", style("✓").green())
    } else {
        format!("{} Extraction complete", style("✓").green())
    };
    println!("\n{}", header);

    let written = if report.dry_run { "Would write" } else { "Written" };
    println!("  Emails scanned: {}", style(report.messages_scanned).cyan());
    println!("  With attachments: {}", style(report.messages_with_attachments).cyan());
    println!("  Attached messages unpacked: {}", style(report.nested_messages).cyan());
    println!(
        "  {}: {} files ({})",
        written,
        style(report.attachments_written).cyan(),
        format_bytes(report.bytes_written)
    );
    println!("  Destination: {}", destination.display());

    if verbose {
        for path in &report.written {
            println!("    {}", style(relative(path, destination)).dim());
        }
    }
    for (path, message) in &report.failures {
        println!("  {} {}: {}", style("✗").red(), path.display(), message);
    }
}
