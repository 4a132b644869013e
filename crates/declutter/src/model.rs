use crate::error::{DeclutterError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

/// A file as seen by a single scan. Never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub filename: String,
    /// Lower-cased, without the leading dot.
    pub extension: Option<String>,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn from_metadata<P: AsRef<Path>>(path: P, metadata: &Metadata) -> Self {
        let path = path.as_ref();
        let modified_at = metadata.modified().ok().map(DateTime::<Utc>::from);
        Self {
            path: path.to_path_buf(),
            filename: file_name_of(path),
            extension: extension_of(path),
            size_bytes: metadata.len(),
            modified_at,
        }
    }

    /// Reads metadata for `path`, following symlinks.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata =
            std::fs::metadata(path).map_err(|e| DeclutterError::unreadable(path, e))?;
        Ok(Self::from_metadata(path, &metadata))
    }

    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }

    /// File name without its final extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.modified_at.map(|m| (now - m).num_days())
    }
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Blake3,
    Md5,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Md5 => "md5",
        }
    }

    pub fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "md5" => Ok(HashAlgorithm::Md5),
            _ => Err(DeclutterError::UnsupportedFormat(format!(
                "Invalid algorithm '{}'. Use 'blake3' or 'md5'",
                value
            ))),
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Blake3
    }
}

/// Fixed-length fingerprint of a file's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl ContentDigest {
    pub fn new(algorithm: HashAlgorithm, bytes: Vec<u8>) -> Self {
        Self { algorithm, bytes }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Files sharing both size and digest, in traversal order.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub digest: ContentDigest,
    pub size_bytes: u64,
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// The copy to retain: fewest characters in the path, then
    /// lexicographically smallest.
    pub fn keeper(&self) -> Option<&FileRecord> {
        self.files.iter().min_by(|a, b| {
            let a_str = a.path.to_string_lossy();
            let b_str = b.path.to_string_lossy();
            a_str
                .chars()
                .count()
                .cmp(&b_str.chars().count())
                .then_with(|| a_str.cmp(&b_str))
        })
    }

    pub fn redundant(&self) -> impl Iterator<Item = &FileRecord> {
        let keeper = self.keeper().map(|k| k.path.clone());
        self.files
            .iter()
            .filter(move |f| Some(&f.path) != keeper.as_ref())
    }

    pub fn wasted_bytes(&self) -> u64 {
        self.size_bytes * (self.files.len().saturating_sub(1) as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "folder", rename_all = "snake_case")]
pub enum Category {
    Junk,
    OldInstaller,
    RedundantArchive,
    /// Belongs in an organized folder of the given name.
    TypedMedia(String),
    Unclassified,
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Junk => "junk",
            Category::OldInstaller => "old_installer",
            Category::RedundantArchive => "redundant_archive",
            Category::TypedMedia(kind) => kind,
            Category::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::TypedMedia(kind) => write!(f, "typed_media({})", kind),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "destination", rename_all = "lowercase")]
pub enum ActionKind {
    Delete,
    Move(PathBuf),
    Skip,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Delete => "delete",
            ActionKind::Move(_) => "move",
            ActionKind::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupAction {
    pub target: PathBuf,
    pub kind: ActionKind,
    pub reason: String,
}

impl CleanupAction {
    pub fn delete(target: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: ActionKind::Delete,
            reason: reason.into(),
        }
    }

    pub fn move_to(
        target: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            kind: ActionKind::Move(destination.into()),
            reason: reason.into(),
        }
    }

    pub fn skip(target: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: ActionKind::Skip,
            reason: reason.into(),
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self.kind, ActionKind::Skip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    DryRun,
    Apply,
}

impl ExecutionMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            ExecutionMode::DryRun
        } else {
            ExecutionMode::Apply
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, ExecutionMode::DryRun)
    }
}

/// True for a single folder name such as `Images`: no separators, no `.`
/// or `..`, not empty.
pub fn is_plain_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, size: u64) -> FileRecord {
        let path = PathBuf::from(path);
        FileRecord {
            filename: file_name_of(&path),
            extension: extension_of(&path),
            path,
            size_bytes: size,
            modified_at: None,
        }
    }

    #[test]
    fn test_plain_folder_name() {
        assert!(is_plain_folder_name("Case Files"));
        for name in ["", ".", "..", "../x", "a/b", "a\\b", "/abs"] {
            assert!(!is_plain_folder_name(name), "{:?}", name);
        }
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(extension_of(Path::new("/tmp/Setup.EXE")), Some("exe".to_string()));
        assert_eq!(extension_of(Path::new("/tmp/README")), None);
        assert_eq!(extension_of(Path::new("/tmp/.bashrc")), None);
    }

    #[test]
    fn test_keeper_prefers_shortest_path() {
        let group = DuplicateGroup {
            digest: ContentDigest::new(HashAlgorithm::Blake3, vec![1, 2, 3]),
            size_bytes: 10,
            files: vec![
                record("/data/report_copy.pdf", 10),
                record("/data/report.pdf", 10),
                record("/data/b/report.pdf", 10),
            ],
        };

        assert_eq!(group.keeper().unwrap().path, PathBuf::from("/data/report.pdf"));
        assert_eq!(group.redundant().count(), 2);
        assert_eq!(group.wasted_bytes(), 20);
    }

    #[test]
    fn test_keeper_tie_breaks_lexicographically() {
        let group = DuplicateGroup {
            digest: ContentDigest::new(HashAlgorithm::Md5, vec![0xab]),
            size_bytes: 1,
            files: vec![record("/x/b.txt", 1), record("/x/a.txt", 1)],
        };

        assert_eq!(group.keeper().unwrap().path, PathBuf::from("/x/a.txt"));
    }

    #[test]
    fn test_keeper_counts_characters_not_bytes() {
        let group = DuplicateGroup {
            digest: ContentDigest::new(HashAlgorithm::Blake3, vec![7]),
            size_bytes: 1,
            files: vec![record("/x/abcd.txt", 1), record("/x/ééé.txt", 1)],
        };

        assert_eq!(group.keeper().unwrap().path, PathBuf::from("/x/ééé.txt"));
    }

    #[test]
    fn test_digest_hex() {
        let digest = ContentDigest::new(HashAlgorithm::Md5, vec![0x00, 0x0f, 0xff]);
        assert_eq!(digest.to_hex(), "000fff");
        assert_eq!(digest.to_string(), "000fff");
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!(HashAlgorithm::from_str("BLAKE3").unwrap(), HashAlgorithm::Blake3);
        assert_eq!(HashAlgorithm::from_str("md5").unwrap(), HashAlgorithm::Md5);
        assert!(matches!(
            HashAlgorithm::from_str("sha1"),
            Err(DeclutterError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Junk.to_string(), "junk");
        assert_eq!(Category::TypedMedia("Images".into()).to_string(), "typed_media(Images)");
    }
}
