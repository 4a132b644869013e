#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use walkdir::WalkDir;

pub mod helpers;

/// A scratch directory standing in for a Downloads folder.
///
/// `root()` is canonical, matching the paths the scanner records.
pub struct TestFixture {
    pub temp_dir: TempDir,
    root: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        Self { temp_dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Writes a file whose modification time is `days` in the past.
    pub fn write_aged(&self, rel: &str, content: &[u8], days: u64) -> PathBuf {
        let path = self.write(rel, content);
        set_age_days(&path, days);
        path
    }

    /// Every entry under the root with its contents (`None` for directories).
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        WalkDir::new(self.root())
            .min_depth(1)
            .into_iter()
            .map(|entry| entry.unwrap())
            .map(|entry| {
                let rel = entry.path().strip_prefix(self.root()).unwrap().to_path_buf();
                let content = if entry.file_type().is_dir() {
                    None
                } else {
                    Some(fs::read(entry.path()).unwrap())
                };
                (rel, content)
            })
            .collect()
    }
}

pub fn set_age_days(path: &Path, days: u64) {
    let mtime = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}
