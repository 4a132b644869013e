//! Turns classifications and duplicate groups into cleanup actions.
//!
//! Planning never touches the filesystem beyond reading directory listings
//! and checking whether a destination already exists.

use crate::classify::{build_sibling_indexes, RuleEngine};
use crate::index::{normalize_extension, DuplicateReport, SiblingIndex};
use crate::model::{Category, CleanupAction, FileRecord};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Move typed media into per-kind folders under the root.
    pub organize: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self { organize: true }
    }
}

/// What to do with the non-keeper members of duplicate groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateTarget {
    Delete,
    MoveTo(PathBuf),
}

/// How a colliding file name is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionStyle {
    /// `name (1).ext`
    Parenthesized,
    /// `name_1.ext`
    Underscored,
}

/// Hands out destination paths that neither exist on disk nor were handed
/// out earlier in the same plan.
#[derive(Debug, Default)]
pub struct DestinationAllocator {
    claimed: HashSet<PathBuf>,
}

impl DestinationAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, dir: &Path, filename: &str, style: CollisionStyle) -> PathBuf {
        let mut candidate = dir.join(filename);
        let mut counter = 1;

        while self.claimed.contains(&candidate) || candidate.exists() {
            candidate = dir.join(numbered_name(filename, counter, style));
            counter += 1;
        }

        self.claimed.insert(candidate.clone());
        candidate
    }
}

/// `report.pdf` with `n = 2` becomes `report (2).pdf` or `report_2.pdf`.
pub fn numbered_name(filename: &str, n: usize, style: CollisionStyle) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    let suffix = match style {
        CollisionStyle::Parenthesized => format!(" ({})", n),
        CollisionStyle::Underscored => format!("_{}", n),
    };

    match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    }
}

pub struct CleanupPlanner<'a> {
    engine: &'a RuleEngine,
    root: PathBuf,
    options: PlannerOptions,
}

impl<'a> CleanupPlanner<'a> {
    pub fn new(engine: &'a RuleEngine, root: impl Into<PathBuf>, options: PlannerOptions) -> Self {
        Self {
            engine,
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// One action per record, in record order.
    pub fn plan(&self, records: &[FileRecord]) -> Vec<CleanupAction> {
        let indexes = build_sibling_indexes(records);
        let empty = SiblingIndex::new();
        let mut destinations = DestinationAllocator::new();

        records
            .iter()
            .map(|record| {
                let siblings = record
                    .parent()
                    .and_then(|dir| indexes.get(dir))
                    .unwrap_or(&empty);
                let classification = self.engine.classify(record, siblings);
                let reason = match &classification.rule_name {
                    Some(rule) => format!("{} (rule '{}')", classification.category, rule),
                    None => classification.category.to_string(),
                };

                match classification.category {
                    Category::Junk | Category::OldInstaller | Category::RedundantArchive => {
                        CleanupAction::delete(&record.path, reason)
                    }
                    Category::TypedMedia(kind) => {
                        self.plan_organize(record, &kind, reason, &mut destinations)
                    }
                    Category::Unclassified => CleanupAction::skip(&record.path, reason),
                }
            })
            .collect()
    }

    fn plan_organize(
        &self,
        record: &FileRecord,
        kind: &str,
        reason: String,
        destinations: &mut DestinationAllocator,
    ) -> CleanupAction {
        if !self.options.organize {
            return CleanupAction::skip(&record.path, format!("{}, organizing disabled", reason));
        }

        let folder = self.root.join(kind);
        if record.parent() == Some(folder.as_path()) {
            return CleanupAction::skip(&record.path, format!("already in {}", kind));
        }

        let destination = destinations.claim(&folder, &record.filename, CollisionStyle::Parenthesized);
        CleanupAction::move_to(&record.path, destination, reason)
    }
}

/// Actions removing every non-keeper member of each duplicate group.
pub fn plan_duplicate_removal(report: &DuplicateReport, target: &DuplicateTarget) -> Vec<CleanupAction> {
    let mut destinations = DestinationAllocator::new();
    let mut actions = Vec::new();

    for group in &report.groups {
        let keeper = match group.keeper() {
            Some(keeper) => keeper,
            None => continue,
        };
        let reason = format!("duplicate of {}", keeper.path.display());

        for file in group.redundant() {
            let action = match target {
                DuplicateTarget::Delete => CleanupAction::delete(&file.path, reason.clone()),
                DuplicateTarget::MoveTo(dir) if file.parent() == Some(dir.as_path()) => {
                    CleanupAction::skip(&file.path, "already in duplicates folder")
                }
                DuplicateTarget::MoveTo(dir) => {
                    let destination = destinations.claim(dir, &file.filename, CollisionStyle::Underscored);
                    CleanupAction::move_to(&file.path, destination, reason.clone())
                }
            };
            actions.push(action);
        }
    }

    actions
}

/// Delete actions for every record whose extension is in `extensions`.
pub fn plan_purge(records: &[FileRecord], extensions: &[String]) -> Vec<CleanupAction> {
    let wanted: HashSet<String> = extensions.iter().map(|e| normalize_extension(e)).collect();

    records
        .iter()
        .filter(|r| r.extension.as_ref().map_or(false, |ext| wanted.contains(ext)))
        .map(|r| {
            let reason = format!("purged extension .{}", r.extension.as_deref().unwrap_or_default());
            CleanupAction::delete(&r.path, reason)
        })
        .collect()
}
