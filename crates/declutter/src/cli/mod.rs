pub mod cleanup;
pub mod dupes;
pub mod extract;
pub mod prune_empty;
pub mod purge;
pub mod rules;
mod output;

use clap::{Parser, Subcommand};
use declutter_lib::{canonical_root, Config, DeclutterError, Result};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "declutter")]
#[command(about = "Find duplicate files and tidy up a Downloads folder", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'q', global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Find duplicate files by content")]
    Dupes {
        #[arg(help = "Folders to search (default: the Downloads folder)")]
        paths: Vec<PathBuf>,

        #[arg(long, help = "Hash algorithm: blake3 or md5")]
        algorithm: Option<String>,

        #[arg(long, help = "Ignore files smaller than this (e.g. 1KB, 2MB)")]
        min_size: Option<String>,

        #[arg(long = "skip-ext", num_args = 1.., help = "Extensions to ignore")]
        skip_ext: Vec<String>,

        #[arg(long, conflicts_with = "delete", help = "Move redundant copies into this folder")]
        move_to: Option<PathBuf>,

        #[arg(long, help = "Delete redundant copies")]
        delete: bool,

        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,

        #[arg(long, default_value = "table", help = "Output format: table or json")]
        format: String,
    },

    #[command(about = "Delete junk, old installers and redundant archives, and sort files by type")]
    Cleanup {
        #[arg(help = "Folder to clean (default: the Downloads folder)")]
        root: Option<PathBuf>,

        #[arg(long, help = "Classification rules file")]
        rules: Option<PathBuf>,

        #[arg(long, help = "How many levels below the root to look at")]
        max_depth: Option<usize>,

        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,

        #[arg(long, help = "Do not move files into per-type folders")]
        no_organize: bool,
    },

    #[command(about = "Remove empty directories below a folder")]
    PruneEmpty {
        #[arg(help = "Folder to prune")]
        root: PathBuf,

        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "Delete every file with the given extensions")]
    Purge {
        #[arg(help = "Folder to purge")]
        root: PathBuf,

        #[arg(long, required = true, num_args = 1.., help = "Extensions to delete")]
        ext: Vec<String>,

        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "Extract attachments from .eml and .msg files, including attached messages")]
    Extract {
        #[arg(help = "Folder to search for emails (default: the Downloads folder)")]
        root: Option<PathBuf>,

        #[arg(long, help = "Where attachments are written (default: a folder under the root)")]
        to: Option<PathBuf>,

        #[arg(long, help = "Levels of attached messages to unpack")]
        max_nesting: Option<usize>,

        #[arg(long, help = "Afterwards delete extracted .bin files and the folders they leave empty")]
        remove_bin: bool,

        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "Inspect or create classification rules")]
    Rules {
        #[command(subcommand)]
        action: rules::RulesSubcommand,
    },
}

/// Settings shared by every command.
pub struct Context {
    pub config: Config,
    pub verbose: bool,
    pub quiet: bool,
}

impl Context {
    /// The explicit root, or the configured Downloads folder.
    pub fn resolve_root(&self, root: Option<PathBuf>) -> Result<PathBuf> {
        let root = root.unwrap_or_else(|| self.config.downloads_dir.clone());
        canonical_root(&root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(DeclutterError::UnsupportedFormat(format!(
                "Invalid output format '{}'. Use 'table' or 'json'",
                value
            ))),
        }
    }
}
