use crate::error::{DeclutterError, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// What exists in a directory under one base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingEntry {
    /// Lower-cased extensions of files with this base name. Files without an
    /// extension contribute an empty string.
    pub extensions: BTreeSet<String>,
    /// A subdirectory with exactly this base name exists.
    pub has_directory: bool,
}

/// Per-directory map from lower-cased base name to the entries sharing it.
///
/// Built once per directory and read by the classifier, so classification of
/// one file never depends on the order other files are processed in.
#[derive(Debug, Clone, Default)]
pub struct SiblingIndex {
    entries: HashMap<String, SiblingEntry>,
}

impl SiblingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists `dir` (not recursively) and indexes every entry.
    pub fn build<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut index = Self::new();

        let read_dir = fs::read_dir(dir).map_err(|e| DeclutterError::unreadable(dir, e))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| DeclutterError::unreadable(dir, e))?;
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                index.add_directory(&entry.file_name().to_string_lossy());
            } else {
                index.add_file(&path);
            }
        }

        Ok(index)
    }

    pub fn add_file(&mut self, path: &Path) {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.entries.entry(stem).or_default().extensions.insert(ext);
    }

    pub fn add_directory(&mut self, name: &str) {
        self.entries.entry(name.to_lowercase()).or_default().has_directory = true;
    }

    pub fn get(&self, stem: &str) -> Option<&SiblingEntry> {
        self.entries.get(&stem.to_lowercase())
    }

    /// True when `stem` also names a directory, or a file whose extension is
    /// not one of `excluded`.
    pub fn has_counterpart(&self, stem: &str, excluded: &[String]) -> bool {
        match self.get(stem) {
            Some(entry) => {
                entry.has_directory
                    || entry
                        .extensions
                        .iter()
                        .any(|ext| !excluded.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archives() -> Vec<String> {
        vec!["zip".to_string(), "rar".to_string(), "7z".to_string()]
    }

    #[test]
    fn test_file_counterpart() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("archive.zip"), b"z").unwrap();
        fs::write(temp_dir.path().join("Archive.PDF"), b"p").unwrap();

        let index = SiblingIndex::build(temp_dir.path()).unwrap();
        assert!(index.has_counterpart("archive", &archives()));
        assert_eq!(
            index.get("ARCHIVE").unwrap().extensions,
            ["pdf", "zip"].iter().map(|s| s.to_string()).collect::<BTreeSet<String>>()
        );
    }

    #[test]
    fn test_directory_counterpart() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("photos.zip"), b"z").unwrap();
        fs::create_dir(temp_dir.path().join("photos")).unwrap();

        let index = SiblingIndex::build(temp_dir.path()).unwrap();
        assert!(index.has_counterpart("photos", &archives()));
    }

    #[test]
    fn test_only_archives_is_not_a_counterpart() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bundle.zip"), b"z").unwrap();
        fs::write(temp_dir.path().join("bundle.rar"), b"r").unwrap();

        let index = SiblingIndex::build(temp_dir.path()).unwrap();
        assert!(!index.has_counterpart("bundle", &archives()));
        assert!(!index.has_counterpart("missing", &archives()));
    }

    #[test]
    fn test_build_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = SiblingIndex::build(temp_dir.path().join("nope"));
        assert!(matches!(result, Err(DeclutterError::UnreadableFile { .. })));
    }
}
