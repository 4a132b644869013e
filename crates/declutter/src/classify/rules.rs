//! Ordered classification rules.
//!
//! A rule is a list of predicates over a [`FileRecord`] (all must hold) and the
//! [`Category`] it assigns. Rules are evaluated in declaration order and the
//! first match wins; a file no rule matches is `Unclassified`. Later, broader
//! rules therefore never shadow earlier, specific ones.
//!
//! Predicates are pure. The only context beyond the record itself is the
//! engine's fixed reference time (for age checks) and the sibling index of
//! the record's directory (for redundant-archive checks).
//!
//! Rule sets are plain TOML:
//!
//! ```toml
//! [[rules]]
//! name = "old_installers"
//! category = { kind = "old_installer" }
//!
//! [[rules.when]]
//! type = "extension_in"
//! extensions = ["exe", "msi"]
//!
//! [[rules.when]]
//! type = "older_than_days"
//! days = 90
//! ```

use crate::error::{DeclutterError, Result};
use crate::index::siblings::SiblingIndex;
use crate::index::normalize_extension;
use crate::model::{is_plain_folder_name, Category, FileRecord};
use chrono::{DateTime, Utc};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const JUNK_EXTENSIONS: &[&str] = &["crdownload", "tmp", "ics", "partial"];
pub const INSTALLER_EXTENSIONS: &[&str] = &["exe", "msi", "msix"];
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z"];
pub const PROTECTED_NAMES: &[&str] = &["desktop.ini", "thumbs.db", ".ds_store"];
pub const DEFAULT_INSTALLER_AGE_DAYS: i64 = 90;

/// Organized folder name and the extensions that belong in it.
pub const ORGANIZE_FOLDERS: &[(&str, &[&str])] = &[
    ("Videos", &["mp4", "mov", "avi", "mkv", "wmv", "webm"]),
    ("Audio", &["mp3", "wav", "flac", "aac", "m4a", "ogg"]),
    (
        "Images",
        &["jpg", "jpeg", "png", "gif", "bmp", "heic", "webp", "svg", "tiff", "ico"],
    ),
    ("Case Files", &["pdf"]),
    ("Documents", &["docx", "doc", "pptx", "ppt", "txt", "rtf"]),
    ("Spreadsheets", &["xlsx", "xls", "csv"]),
    (
        "Web and Code",
        &["html", "htm", "php", "js", "json", "py", "md", "css", "xml"],
    ),
    ("Compressed", &["zip", "rar", "7z", "tar", "gz"]),
];

/// A single condition over a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Extension is one of these (case-insensitive, leading dot optional).
    ExtensionIn { extensions: Vec<String> },
    /// File name matches any of these globs (case-insensitive).
    NameGlob { patterns: Vec<String> },
    NoExtension,
    OlderThanDays { days: i64 },
    LargerThan { bytes: u64 },
    SmallerThan { bytes: u64 },
    /// Another entry in the same directory shares the base name and is a
    /// directory or a file with an extension outside `ignore_extensions`.
    HasSibling {
        #[serde(default = "default_archive_extensions")]
        ignore_extensions: Vec<String>,
    },
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::ExtensionIn { extensions } => write!(f, "extension in [{}]", extensions.join(", ")),
            Predicate::NameGlob { patterns } => write!(f, "name matches [{}]", patterns.join(", ")),
            Predicate::NoExtension => f.write_str("no extension"),
            Predicate::OlderThanDays { days } => write!(f, "older than {} days", days),
            Predicate::LargerThan { bytes } => write!(f, "larger than {} bytes", bytes),
            Predicate::SmallerThan { bytes } => write!(f, "smaller than {} bytes", bytes),
            Predicate::HasSibling { .. } => f.write_str("has sibling"),
        }
    }
}

fn default_archive_extensions() -> Vec<String> {
    ARCHIVE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub name: String,
    pub category: Category,
    /// Conditions that must all hold. An empty list matches every file.
    #[serde(default, rename = "when")]
    pub predicates: Vec<Predicate>,
}

impl ClassificationRule {
    pub fn new(name: &str, category: Category, predicates: Vec<Predicate>) -> Self {
        Self {
            name: name.to_string(),
            category,
            predicates,
        }
    }
}

/// An ordered rule set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationRules {
    #[serde(default)]
    pub rules: Vec<ClassificationRule>,
}

impl ClassificationRules {
    /// Built-in rules for a Downloads folder.
    pub fn downloads_defaults(installer_age_days: i64) -> Self {
        let mut rules = vec![
            ClassificationRule::new(
                "protected_system_files",
                Category::Unclassified,
                vec![Predicate::NameGlob {
                    patterns: strings(PROTECTED_NAMES),
                }],
            ),
            ClassificationRule::new(
                "junk_extensions",
                Category::Junk,
                vec![Predicate::ExtensionIn {
                    extensions: strings(JUNK_EXTENSIONS),
                }],
            ),
            ClassificationRule::new(
                "office_temp_files",
                Category::Junk,
                vec![Predicate::NameGlob {
                    patterns: vec!["~WRL*".to_string(), "~$*".to_string()],
                }],
            ),
            ClassificationRule::new(
                "guid_blobs",
                Category::Junk,
                vec![
                    Predicate::NoExtension,
                    Predicate::NameGlob {
                        patterns: vec![format!("{}-*", "[0-9a-f]".repeat(8))],
                    },
                ],
            ),
            ClassificationRule::new(
                "old_installers",
                Category::OldInstaller,
                vec![
                    Predicate::ExtensionIn {
                        extensions: strings(INSTALLER_EXTENSIONS),
                    },
                    Predicate::OlderThanDays {
                        days: installer_age_days,
                    },
                ],
            ),
            ClassificationRule::new(
                "redundant_archives",
                Category::RedundantArchive,
                vec![
                    Predicate::ExtensionIn {
                        extensions: strings(ARCHIVE_EXTENSIONS),
                    },
                    Predicate::HasSibling {
                        ignore_extensions: default_archive_extensions(),
                    },
                ],
            ),
        ];

        for (folder, extensions) in ORGANIZE_FOLDERS {
            rules.push(ClassificationRule::new(
                &format!("organize_{}", folder.to_lowercase().replace(' ', "_")),
                Category::TypedMedia(folder.to_string()),
                vec![Predicate::ExtensionIn {
                    extensions: strings(extensions),
                }],
            ));
        }

        Self { rules }
    }

    /// Load rules from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DeclutterError::PathNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse rules from TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| DeclutterError::UnsupportedFormat(format!("Failed to parse rules TOML: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DeclutterError::Config(format!("Failed to serialize rules: {}", e)))
    }

    /// Save rules to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// The outcome of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// Name of the matching rule, `None` for the implicit default.
    pub rule_name: Option<String>,
}

impl Classification {
    fn unclassified() -> Self {
        Self {
            category: Category::Unclassified,
            rule_name: None,
        }
    }
}

enum CompiledPredicate {
    ExtensionIn(Vec<String>),
    NameGlob(GlobSet),
    NoExtension,
    OlderThanDays(i64),
    LargerThan(u64),
    SmallerThan(u64),
    HasSibling(Vec<String>),
}

struct CompiledRule {
    name: String,
    category: Category,
    predicates: Vec<CompiledPredicate>,
}

/// Classification engine that applies rules to files.
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    reference_time: DateTime<Utc>,
}

impl RuleEngine {
    /// Compiles `rules`. Ages are measured against `reference_time`, fixed for
    /// the engine's lifetime.
    pub fn new(rules: ClassificationRules, reference_time: DateTime<Utc>) -> Result<Self> {
        let rules = rules
            .rules
            .into_iter()
            .map(compile_rule)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            reference_time,
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the category of the first matching rule.
    pub fn classify(&self, record: &FileRecord, siblings: &SiblingIndex) -> Classification {
        for rule in &self.rules {
            if rule
                .predicates
                .iter()
                .all(|p| self.matches(p, record, siblings))
            {
                log::debug!("{} matched rule '{}'", record.path.display(), rule.name);
                return Classification {
                    category: rule.category.clone(),
                    rule_name: Some(rule.name.clone()),
                };
            }
        }

        Classification::unclassified()
    }

    /// Classifies many files, building each directory's sibling index once.
    pub fn classify_batch(&self, records: &[FileRecord]) -> Vec<Classification> {
        let indexes = build_sibling_indexes(records);
        let empty = SiblingIndex::new();

        records
            .iter()
            .map(|record| {
                let siblings = record
                    .parent()
                    .and_then(|dir| indexes.get(dir))
                    .unwrap_or(&empty);
                self.classify(record, siblings)
            })
            .collect()
    }

    fn matches(&self, predicate: &CompiledPredicate, record: &FileRecord, siblings: &SiblingIndex) -> bool {
        match predicate {
            CompiledPredicate::ExtensionIn(extensions) => record
                .extension
                .as_ref()
                .map_or(false, |ext| extensions.iter().any(|e| e == ext)),
            CompiledPredicate::NameGlob(globset) => globset.is_match(&record.filename),
            CompiledPredicate::NoExtension => record.extension.is_none(),
            CompiledPredicate::OlderThanDays(days) => record
                .age_days(self.reference_time)
                .map_or(false, |age| age > *days),
            CompiledPredicate::LargerThan(bytes) => record.size_bytes > *bytes,
            CompiledPredicate::SmallerThan(bytes) => record.size_bytes < *bytes,
            CompiledPredicate::HasSibling(ignore) => siblings.has_counterpart(&record.stem(), ignore),
        }
    }
}

fn compile_rule(rule: ClassificationRule) -> Result<CompiledRule> {
    if let Category::TypedMedia(folder) = &rule.category {
        validate_folder_name(&rule.name, folder)?;
    }

    let predicates = rule
        .predicates
        .iter()
        .map(|p| compile_predicate(&rule.name, p))
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledRule {
        name: rule.name,
        category: rule.category,
        predicates,
    })
}

/// Organize targets are single folder names directly under the root.
fn validate_folder_name(rule_name: &str, folder: &str) -> Result<()> {
    if !is_plain_folder_name(folder) {
        return Err(DeclutterError::Config(format!(
            "Invalid folder '{}' in rule '{}': must be a single folder name",
            folder, rule_name
        )));
    }
    Ok(())
}

fn compile_predicate(rule_name: &str, predicate: &Predicate) -> Result<CompiledPredicate> {
    Ok(match predicate {
        Predicate::ExtensionIn { extensions } => {
            CompiledPredicate::ExtensionIn(extensions.iter().map(|e| normalize_extension(e)).collect())
        }
        Predicate::NameGlob { patterns } => {
            let mut builder = GlobSetBuilder::new();
            for pattern in patterns {
                let glob = GlobBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        DeclutterError::Config(format!(
                            "Invalid glob pattern '{}' in rule '{}': {}",
                            pattern, rule_name, e
                        ))
                    })?;
                builder.add(glob);
            }
            let globset = builder
                .build()
                .map_err(|e| DeclutterError::Config(format!("Failed to build globset: {}", e)))?;
            CompiledPredicate::NameGlob(globset)
        }
        Predicate::NoExtension => CompiledPredicate::NoExtension,
        Predicate::OlderThanDays { days } => {
            if *days < 0 {
                return Err(DeclutterError::Config(format!(
                    "Rule '{}': older_than_days must not be negative",
                    rule_name
                )));
            }
            CompiledPredicate::OlderThanDays(*days)
        }
        Predicate::LargerThan { bytes } => CompiledPredicate::LargerThan(*bytes),
        Predicate::SmallerThan { bytes } => CompiledPredicate::SmallerThan(*bytes),
        Predicate::HasSibling { ignore_extensions } => CompiledPredicate::HasSibling(
            ignore_extensions.iter().map(|e| normalize_extension(e)).collect(),
        ),
    })
}

/// Builds one sibling index per distinct parent directory of `records`.
///
/// Directories that cannot be listed get an empty index and a warning.
pub fn build_sibling_indexes(records: &[FileRecord]) -> HashMap<PathBuf, SiblingIndex> {
    let mut indexes = HashMap::new();

    for record in records {
        let Some(dir) = record.parent() else { continue };
        if indexes.contains_key(dir) {
            continue;
        }
        let index = SiblingIndex::build(dir).unwrap_or_else(|e| {
            log::warn!("Cannot index {}: {}", dir.display(), e);
            SiblingIndex::new()
        });
        indexes.insert(dir.to_path_buf(), index);
    }

    indexes
}
