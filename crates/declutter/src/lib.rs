pub mod classify;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod model;
pub mod util;

pub use classify::{Classification, ClassificationRule, ClassificationRules, Predicate, RuleEngine};
pub use cleanup::{
    plan_duplicate_removal, plan_purge, remove_empty_dirs, CleanupExecutor, CleanupPlanner,
    DuplicateTarget, EmptyDirFilter, EmptyDirScope, ExecutionReport, PlannerOptions,
};
pub use config::{CleanupConfig, Config, DedupConfig, ExtractConfig};
pub use error::{DeclutterError, Result};
pub use extract::{AttachmentExtractor, ExtractionReport, MailContents};
pub use index::{
    canonical_root, find_duplicates, hash_file, scan_directory, scan_roots, DuplicateReport,
    ScanOptions, ScanResult, ScanStats, SiblingIndex,
};
pub use model::{
    ActionKind, Category, CleanupAction, ContentDigest, DuplicateGroup, ExecutionMode, FileRecord,
    HashAlgorithm,
};
