mod cli;

use clap::Parser;
use declutter_lib::{Config, Result};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let ctx = cli::Context {
        config: Config::load(cli.config)?,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        cli::Commands::Dupes {
            paths,
            algorithm,
            min_size,
            skip_ext,
            move_to,
            delete,
            dry_run,
            yes,
            format,
        } => cli::dupes::handle_dupes_command(
            &ctx,
            cli::dupes::DupesArgs {
                paths,
                algorithm,
                min_size,
                skip_ext,
                move_to,
                delete,
                dry_run,
                yes,
                format,
            },
        ),

        cli::Commands::Cleanup {
            root,
            rules,
            max_depth,
            dry_run,
            yes,
            no_organize,
        } => cli::cleanup::handle_cleanup_command(
            &ctx,
            cli::cleanup::CleanupArgs {
                root,
                rules,
                max_depth,
                dry_run,
                yes,
                no_organize,
            },
        ),

        cli::Commands::PruneEmpty { root, dry_run, yes } => {
            cli::prune_empty::handle_prune_empty_command(&ctx, root, dry_run, yes)
        }

        cli::Commands::Purge {
            root,
            ext,
            dry_run,
            yes,
        } => cli::purge::handle_purge_command(&ctx, root, ext, dry_run, yes),

        cli::Commands::Extract {
            root,
            to,
            max_nesting,
            remove_bin,
            dry_run,
            yes,
        } => cli::extract::handle_extract_command(
            &ctx,
            cli::extract::ExtractArgs {
                root,
                to,
                max_nesting,
                remove_bin,
                dry_run,
                yes,
            },
        ),

        cli::Commands::Rules { action } => cli::rules::handle_rules_command(&ctx, action),
    }
}

/// `RUST_LOG` wins; otherwise `-v` shows decisions and `-q` only errors.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
