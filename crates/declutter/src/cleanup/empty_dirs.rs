//! Bottom-up removal of empty directories below a root.
//!
//! The root itself is never removed and symlinks are never followed, so the
//! pass cannot leave the root's tree. Skip folders (`.git`, `node_modules`,
//! ...) are pruned from the walk, so nothing inside them is ever touched.

use crate::error::{DeclutterError, Result};
use crate::index::scanner::DEFAULT_SKIP_FOLDERS;
use crate::model::{ActionKind, CleanupAction};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Which directories the pass that follows a run may remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyDirScope {
    /// Only directories that held a file the run deleted or moved, and
    /// their ancestors.
    #[default]
    Touched,
    /// Every empty directory under the root.
    Tree,
}

/// Limits the empty-directory pass.
#[derive(Debug, Clone)]
pub struct EmptyDirFilter {
    skip_folders: HashSet<String>,
    only: Option<HashSet<PathBuf>>,
}

impl Default for EmptyDirFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_FOLDERS)
    }
}

impl EmptyDirFilter {
    /// Never descends into a directory named in `skip_folders` (case-insensitive).
    pub fn new<I, S>(skip_folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            skip_folders: skip_folders
                .into_iter()
                .map(|f| f.as_ref().to_lowercase())
                .collect(),
            only: None,
        }
    }

    /// Restricts the pass to the parents of the targets of `actions`' deletes
    /// and moves, up to the root. Without mutations nothing is eligible.
    pub fn touched_by(mut self, actions: &[CleanupAction]) -> Self {
        let touched = actions
            .iter()
            .filter(|a| a.is_mutation())
            .flat_map(|a| a.target.ancestors().skip(1))
            .map(Path::to_path_buf)
            .collect();
        self.only = Some(touched);
        self
    }

    fn prunes(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .skip_folders
                .contains(&entry.file_name().to_string_lossy().to_lowercase())
    }

    fn allows(&self, dir: &Path) -> bool {
        self.only.as_ref().map_or(true, |only| only.contains(dir))
    }
}

/// Removes the empty directories under `root` that `filter` allows, children
/// before parents, so a chain of nested empty directories disappears in one
/// pass.
///
/// Returns the removed directories in removal order.
pub fn remove_empty_dirs<P: AsRef<Path>>(root: P, filter: &EmptyDirFilter) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(DeclutterError::PathNotFound(root.to_path_buf()));
    }

    let mut removed = Vec::new();

    for dir in directories_bottom_up(root, filter) {
        match is_empty_dir(&dir) {
            Ok(true) => match fs::remove_dir(&dir) {
                Ok(()) => {
                    log::info!("Removed empty directory {}", dir.display());
                    removed.push(dir);
                }
                Err(e) => log::warn!("Cannot remove {}: {}", dir.display(), e),
            },
            Ok(false) => {}
            Err(e) => log::warn!("Cannot list {}: {}", dir.display(), e),
        }
    }

    Ok(removed)
}

/// Directories that would be empty once `actions` had been applied.
///
/// Targets of deletes and moves count as gone; a directory that is, or
/// contains, a move destination is kept.
pub fn simulate_empty_dirs<P: AsRef<Path>>(
    root: P,
    actions: &[CleanupAction],
    filter: &EmptyDirFilter,
) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(DeclutterError::PathNotFound(root.to_path_buf()));
    }

    let mut gone: HashSet<PathBuf> = actions
        .iter()
        .filter(|a| a.is_mutation())
        .map(|a| a.target.clone())
        .collect();
    let incoming: Vec<&Path> = actions
        .iter()
        .filter_map(|a| match &a.kind {
            ActionKind::Move(destination) => Some(destination.as_path()),
            _ => None,
        })
        .collect();

    let mut removed = Vec::new();

    for dir in directories_bottom_up(root, filter) {
        if incoming.iter().any(|dest| dest.starts_with(&dir)) {
            continue;
        }
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Cannot list {}: {}", dir.display(), e);
                continue;
            }
        };
        let would_be_empty = entries
            .filter_map(|entry| entry.ok())
            .all(|entry| gone.contains(&entry.path()));

        if would_be_empty {
            log::info!("DRY RUN: would remove empty directory {}", dir.display());
            gone.insert(dir.clone());
            removed.push(dir);
        }
    }

    Ok(removed)
}

/// Walks top-down so skip folders can be pruned, siblings in reverse name
/// order; reversing that pre-order yields children before parents with
/// siblings in name order.
fn directories_bottom_up(root: &Path, filter: &EmptyDirFilter) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by(|a, b| b.file_name().cmp(a.file_name()))
        .into_iter()
        .filter_entry(|entry| !filter.prunes(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Walk error: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|dir| filter.allows(dir))
        .collect();
    dirs.reverse();
    dirs
}

fn is_empty_dir(dir: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_nested_empty_chain() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir(root.join("d")).unwrap();

        let removed = remove_empty_dirs(root, &EmptyDirFilter::default()).unwrap();

        assert_eq!(
            removed,
            vec![root.join("a/b/c"), root.join("a/b"), root.join("a"), root.join("d")]
        );
        assert!(root.exists());
    }

    #[test]
    fn test_keeps_non_empty_and_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep/empty")).unwrap();
        fs::write(root.join("keep/file.txt"), b"x").unwrap();

        let removed = remove_empty_dirs(root, &EmptyDirFilter::default()).unwrap();

        assert_eq!(removed, vec![root.join("keep/empty")]);
        assert!(root.join("keep/file.txt").exists());
    }

    #[test]
    fn test_empty_root_survives() {
        let temp_dir = TempDir::new().unwrap();
        let removed = remove_empty_dirs(temp_dir.path(), &EmptyDirFilter::default()).unwrap();
        assert!(removed.is_empty());
        assert!(temp_dir.path().is_dir());
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = remove_empty_dirs(temp_dir.path().join("nope"), &EmptyDirFilter::default());
        assert!(matches!(result, Err(DeclutterError::PathNotFound(_))));
    }

    #[test]
    fn test_skip_folders_are_left_intact() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("project/.git/refs/heads")).unwrap();
        fs::create_dir_all(root.join("project/.git/refs/tags")).unwrap();
        fs::write(root.join("project/.git/HEAD"), b"ref: refs/heads/main\n").unwrap();
        fs::create_dir_all(root.join("project/Node_Modules/empty")).unwrap();
        fs::create_dir(root.join("project/build")).unwrap();

        let filter = EmptyDirFilter::default();
        let simulated = simulate_empty_dirs(root, &[], &filter).unwrap();
        let removed = remove_empty_dirs(root, &filter).unwrap();

        assert_eq!(removed, vec![root.join("project/build")]);
        assert_eq!(simulated, removed);
        assert!(root.join("project/.git/refs/heads").is_dir());
        assert!(root.join("project/.git/refs/tags").is_dir());
        assert!(root.join("project/Node_Modules/empty").is_dir());
    }

    #[test]
    fn test_touched_scope_leaves_unrelated_empty_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("old/inner")).unwrap();
        fs::write(root.join("old/inner/junk.tmp"), b"x").unwrap();
        fs::create_dir(root.join("placeholder")).unwrap();

        let actions = vec![CleanupAction::delete(root.join("old/inner/junk.tmp"), "junk")];
        fs::remove_file(root.join("old/inner/junk.tmp")).unwrap();

        let filter = EmptyDirFilter::default().touched_by(&actions);
        let removed = remove_empty_dirs(root, &filter).unwrap();

        assert_eq!(removed, vec![root.join("old/inner"), root.join("old")]);
        assert!(root.join("placeholder").is_dir());
    }

    #[test]
    fn test_touched_scope_without_mutations_removes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("empty")).unwrap();

        let filter = EmptyDirFilter::default().touched_by(&[]);
        let removed = remove_empty_dirs(temp_dir.path(), &filter).unwrap();

        assert!(removed.is_empty());
    }

    #[test]
    fn test_simulation_accounts_for_planned_actions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("old/inner")).unwrap();
        fs::write(root.join("old/inner/junk.tmp"), b"x").unwrap();
        fs::create_dir(root.join("Images")).unwrap();
        fs::write(root.join("pic.png"), b"p").unwrap();
        fs::create_dir(root.join("busy")).unwrap();
        fs::write(root.join("busy/keep.txt"), b"k").unwrap();

        let actions = vec![
            CleanupAction::delete(root.join("old/inner/junk.tmp"), "junk"),
            CleanupAction::move_to(root.join("pic.png"), root.join("Images/pic.png"), "images"),
        ];

        let removed = simulate_empty_dirs(root, &actions, &EmptyDirFilter::default()).unwrap();

        assert_eq!(removed, vec![root.join("old/inner"), root.join("old")]);
        assert!(root.join("old/inner/junk.tmp").exists());
    }
}
