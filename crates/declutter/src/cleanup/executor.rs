use crate::cleanup::empty_dirs::{remove_empty_dirs, simulate_empty_dirs, EmptyDirFilter, EmptyDirScope};
use crate::error::{DeclutterError, Result};
use crate::model::{ActionKind, CleanupAction, ExecutionMode};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Tally of one executor run. In DryRun, `deleted` and `moved` count the
/// actions that would have been performed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    pub processed: usize,
    pub deleted: usize,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_freed: u64,
    pub failures: Vec<(PathBuf, String)>,
    pub removed_dirs: Vec<PathBuf>,
    pub dry_run: bool,
}

enum Outcome {
    Deleted(u64),
    Moved,
    Skipped,
}

pub struct CleanupExecutor {
    root: PathBuf,
    mode: ExecutionMode,
    prune_empty_dirs: bool,
    empty_dir_scope: EmptyDirScope,
    empty_dir_filter: EmptyDirFilter,
}

impl CleanupExecutor {
    pub fn new(root: impl Into<PathBuf>, mode: ExecutionMode) -> Self {
        Self {
            root: root.into(),
            mode,
            prune_empty_dirs: true,
            empty_dir_scope: EmptyDirScope::default(),
            empty_dir_filter: EmptyDirFilter::default(),
        }
    }

    /// Whether the empty-directory pass runs after the actions.
    pub fn with_empty_dir_pass(mut self, enabled: bool) -> Self {
        self.prune_empty_dirs = enabled;
        self
    }

    pub fn with_empty_dir_scope(mut self, scope: EmptyDirScope) -> Self {
        self.empty_dir_scope = scope;
        self
    }

    /// Folders the empty-directory pass never enters.
    pub fn with_skip_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.empty_dir_filter = EmptyDirFilter::new(folders);
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn execute(&self, actions: &[CleanupAction]) -> Result<ExecutionReport> {
        self.execute_with_progress(actions, |_| {})
    }

    /// Runs `actions` in order. A failing action is logged and counted, and
    /// the run continues; only an invalid root aborts.
    pub fn execute_with_progress<F: FnMut(&CleanupAction)>(
        &self,
        actions: &[CleanupAction],
        mut on_action: F,
    ) -> Result<ExecutionReport> {
        if !self.root.is_dir() {
            return Err(DeclutterError::PathNotFound(self.root.clone()));
        }

        let mut report = ExecutionReport {
            dry_run: self.mode.is_dry_run(),
            ..Default::default()
        };

        for action in actions {
            report.processed += 1;
            match self.execute_action(action) {
                Ok(Outcome::Deleted(bytes)) => {
                    report.deleted += 1;
                    report.bytes_freed += bytes;
                }
                Ok(Outcome::Moved) => report.moved += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    log::error!("{} failed for {}: {}", action.kind.as_str(), action.target.display(), e);
                    report.failed += 1;
                    report.failures.push((action.target.clone(), e.to_string()));
                }
            }
            on_action(action);
        }

        if self.prune_empty_dirs {
            let filter = match self.empty_dir_scope {
                EmptyDirScope::Touched => self.empty_dir_filter.clone().touched_by(actions),
                EmptyDirScope::Tree => self.empty_dir_filter.clone(),
            };
            report.removed_dirs = match self.mode {
                ExecutionMode::DryRun => simulate_empty_dirs(&self.root, actions, &filter)?,
                ExecutionMode::Apply => remove_empty_dirs(&self.root, &filter)?,
            };
        }

        Ok(report)
    }

    fn execute_action(&self, action: &CleanupAction) -> Result<Outcome> {
        match &action.kind {
            ActionKind::Skip => {
                log::debug!("Skip {}: {}", action.target.display(), action.reason);
                Ok(Outcome::Skipped)
            }
            ActionKind::Delete if self.mode.is_dry_run() => {
                log::info!("DRY RUN: would delete {} ({})", action.target.display(), action.reason);
                let bytes = fs::symlink_metadata(&action.target).map(|m| m.len()).unwrap_or(0);
                Ok(Outcome::Deleted(bytes))
            }
            ActionKind::Move(destination) if self.mode.is_dry_run() => {
                log::info!(
                    "DRY RUN: would move {} -> {} ({})",
                    action.target.display(),
                    destination.display(),
                    action.reason
                );
                Ok(Outcome::Moved)
            }
            ActionKind::Delete => execute_delete(&action.target, &action.reason),
            ActionKind::Move(destination) => execute_move(&action.target, destination),
        }
    }
}

fn execute_delete(target: &Path, reason: &str) -> Result<Outcome> {
    let metadata = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(_) => {
            log::warn!("Already gone, skipping: {}", target.display());
            return Ok(Outcome::Skipped);
        }
    };

    fs::remove_file(target).map_err(|e| action_failed(target, e))?;
    log::info!("Deleted {} ({})", target.display(), reason);
    Ok(Outcome::Deleted(metadata.len()))
}

fn execute_move(source: &Path, destination: &Path) -> Result<Outcome> {
    if fs::symlink_metadata(source).is_err() {
        log::warn!("Already gone, skipping: {}", source.display());
        return Ok(Outcome::Skipped);
    }

    if destination.exists() {
        return Err(DeclutterError::ActionFailed {
            path: source.to_path_buf(),
            message: format!("destination already exists: {}", destination.display()),
        });
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| action_failed(source, e))?;
    }

    if let Err(rename_err) = fs::rename(source, destination) {
        log::debug!(
            "Rename {} failed ({}), copying instead",
            source.display(),
            rename_err
        );
        fs::copy(source, destination).map_err(|e| action_failed(source, e))?;
        fs::remove_file(source).map_err(|e| action_failed(source, e))?;
    }

    log::info!("Moved {} -> {}", source.display(), destination.display());
    Ok(Outcome::Moved)
}

fn action_failed(path: &Path, err: std::io::Error) -> DeclutterError {
    DeclutterError::ActionFailed {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let executor = CleanupExecutor::new(temp_dir.path().join("missing"), ExecutionMode::Apply);
        let result = executor.execute(&[]);
        assert!(matches!(result, Err(DeclutterError::PathNotFound(_))));
    }

    #[test]
    fn test_apply_delete_and_move() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("junk.tmp"), b"12345").unwrap();
        fs::write(root.join("photo.jpg"), b"img").unwrap();

        let actions = vec![
            CleanupAction::delete(root.join("junk.tmp"), "junk"),
            CleanupAction::move_to(root.join("photo.jpg"), root.join("Images/photo.jpg"), "images"),
            CleanupAction::skip(root.join("other"), "unclassified"),
        ];

        let report = CleanupExecutor::new(root, ExecutionMode::Apply)
            .execute(&actions)
            .unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.moved, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.bytes_freed, 5);
        assert!(!root.join("junk.tmp").exists());
        assert!(root.join("Images/photo.jpg").exists());
        assert!(!root.join("photo.jpg").exists());
    }

    #[test]
    fn test_vanished_target_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let actions = vec![CleanupAction::delete(temp_dir.path().join("gone.tmp"), "junk")];

        let report = CleanupExecutor::new(temp_dir.path(), ExecutionMode::Apply)
            .execute(&actions)
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_move_refuses_overwrite_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), b"new").unwrap();
        fs::write(root.join("b.txt"), b"old").unwrap();
        fs::write(root.join("c.tmp"), b"c").unwrap();

        let actions = vec![
            CleanupAction::move_to(root.join("a.txt"), root.join("b.txt"), "clash"),
            CleanupAction::delete(root.join("c.tmp"), "junk"),
        ];

        let report = CleanupExecutor::new(root, ExecutionMode::Apply)
            .execute(&actions)
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].0, root.join("a.txt"));
        assert_eq!(report.deleted, 1);
        assert_eq!(fs::read(root.join("b.txt")).unwrap(), b"old");
        assert!(root.join("a.txt").exists());
    }

    #[test]
    fn test_dry_run_mutates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/junk.tmp"), b"x").unwrap();
        fs::write(root.join("song.mp3"), b"y").unwrap();

        let actions = vec![
            CleanupAction::delete(root.join("sub/junk.tmp"), "junk"),
            CleanupAction::move_to(root.join("song.mp3"), root.join("Audio/song.mp3"), "audio"),
        ];

        let report = CleanupExecutor::new(root, ExecutionMode::DryRun)
            .execute(&actions)
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.moved, 1);
        assert_eq!(report.removed_dirs, vec![root.join("sub")]);
        assert!(root.join("sub/junk.tmp").exists());
        assert!(root.join("song.mp3").exists());
        assert!(!root.join("Audio").exists());
    }

    #[test]
    fn test_empty_dir_pass_only_follows_actions_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("untouched")).unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/junk.tmp"), b"x").unwrap();

        let actions = vec![CleanupAction::delete(root.join("sub/junk.tmp"), "junk")];
        let report = CleanupExecutor::new(root, ExecutionMode::Apply)
            .execute(&actions)
            .unwrap();

        assert_eq!(report.removed_dirs, vec![root.join("sub")]);
        assert!(root.join("untouched").is_dir());
    }

    #[test]
    fn test_tree_scope_keeps_repository_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("project/.git/refs/heads")).unwrap();
        fs::create_dir_all(root.join("project/.git/refs/tags")).unwrap();
        fs::write(root.join("project/.git/HEAD"), b"ref: refs/heads/main\n").unwrap();
        fs::write(root.join("project/src.rs"), b"fn main() {}").unwrap();
        fs::create_dir(root.join("project/cache")).unwrap();

        let report = CleanupExecutor::new(root, ExecutionMode::Apply)
            .with_empty_dir_scope(EmptyDirScope::Tree)
            .with_skip_folders([".git"])
            .execute(&[])
            .unwrap();

        assert_eq!(report.removed_dirs, vec![root.join("project/cache")]);
        assert!(root.join("project/.git/refs/heads").is_dir());
        assert!(root.join("project/.git/refs/tags").is_dir());
    }

    #[test]
    fn test_empty_dir_pass_can_be_disabled() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("empty")).unwrap();

        let report = CleanupExecutor::new(temp_dir.path(), ExecutionMode::Apply)
            .with_empty_dir_scope(EmptyDirScope::Tree)
            .with_empty_dir_pass(false)
            .execute(&[])
            .unwrap();

        assert!(report.removed_dirs.is_empty());
        assert!(temp_dir.path().join("empty").exists());
    }
}
