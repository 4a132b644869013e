use crate::error::{DeclutterError, Result};
use crate::model::FileRecord;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Tool and dependency folders that are never scanned or pruned.
pub const DEFAULT_SKIP_FOLDERS: &[&str] = &["node_modules", ".git", "__pycache__", ".venv", "venv"];

#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub dirs_scanned: usize,
    pub bytes_scanned: u64,
    pub files_filtered: usize,
    pub errors: Vec<(PathBuf, String)>,
}

/// Options for filesystem scanning
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
    pub min_file_size: u64,
    /// Lower-cased extensions without the dot.
    pub skip_extensions: HashSet<String>,
    /// Lower-cased directory names that are pruned from the walk.
    pub skip_folders: HashSet<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            max_depth: None,
            min_file_size: 0,
            skip_extensions: HashSet::new(),
            skip_folders: HashSet::new(),
        }
    }
}

impl ScanOptions {
    pub fn with_skip_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    pub fn with_skip_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_folders = folders
            .into_iter()
            .map(|f| f.as_ref().to_lowercase())
            .collect();
        self
    }
}

/// Accepts `.ZIP`, `zip` or `Zip` and returns `zip`.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// The result of walking one root.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub records: Vec<FileRecord>,
    pub stats: ScanStats,
}

/// Recursively collects regular files under `root`.
///
/// The root is canonicalized first, so every record carries an absolute path
/// however the root was spelled. Records are returned in traversal order,
/// siblings sorted by name. Entries that cannot be read are logged and counted
/// in `stats.errors`; only a missing root is an error.
pub fn scan_directory<P: AsRef<Path>>(root: P, options: &ScanOptions) -> Result<ScanResult> {
    let root = canonical_root(root.as_ref())?;
    let root = root.as_path();

    let mut result = ScanResult::default();

    let mut walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name();
    if let Some(max_depth) = options.max_depth {
        walker = walker.max_depth(max_depth);
    }

    let walker = walker
        .into_iter()
        .filter_entry(|entry| !is_skipped_folder(entry, options, root));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if let Err(e) = process_entry(&entry, &mut result, options) {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    result.stats.errors.push((entry.path().to_path_buf(), e.to_string()));
                }
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                log::warn!("Walk error at {}: {}", path.display(), e);
                result.stats.errors.push((path, e.to_string()));
            }
        }
    }

    Ok(result)
}

/// Resolves `root` to an existing, absolute directory.
pub fn canonical_root(root: &Path) -> Result<PathBuf> {
    match fs::canonicalize(root) {
        Ok(canonical) if canonical.is_dir() => Ok(canonical),
        _ => Err(DeclutterError::PathNotFound(root.to_path_buf())),
    }
}

/// Scans several roots, skipping (with a warning) any that do not exist.
///
/// A file reachable from more than one root, whether through overlapping
/// roots or two spellings of the same one, is recorded once.
pub fn scan_roots<P: AsRef<Path>>(roots: &[P], options: &ScanOptions) -> ScanResult {
    let mut combined = ScanResult::default();
    let mut seen_roots = HashSet::new();
    let mut seen_files = HashSet::new();

    for root in roots {
        let root = root.as_ref();
        if let Ok(canonical) = canonical_root(root) {
            if !seen_roots.insert(canonical) {
                log::debug!("Root listed twice, scanning once: {}", root.display());
                continue;
            }
        }

        match scan_directory(root, options) {
            Ok(result) => {
                for record in result.records {
                    if !seen_files.insert(identity_of(&record.path, options)) {
                        log::debug!("Already scanned via another root: {}", record.path.display());
                        continue;
                    }
                    combined.stats.files_scanned += 1;
                    combined.stats.bytes_scanned += record.size_bytes;
                    combined.records.push(record);
                }
                combined.stats.dirs_scanned += result.stats.dirs_scanned;
                combined.stats.files_filtered += result.stats.files_filtered;
                combined.stats.errors.extend(result.stats.errors);
            }
            Err(e) => {
                log::warn!("Folder not found, skipping: {}", root.display());
                combined.stats.errors.push((root.to_path_buf(), e.to_string()));
            }
        }
    }

    combined
}

/// Paths under a canonical root are already unique unless symlinks were
/// followed into the tree.
fn identity_of(path: &Path, options: &ScanOptions) -> PathBuf {
    if options.follow_symlinks {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    }
}

fn is_skipped_folder(entry: &DirEntry, options: &ScanOptions, root: &Path) -> bool {
    if !entry.file_type().is_dir() || entry.path() == root {
        return false;
    }
    let name = entry.file_name().to_string_lossy().to_lowercase();
    options.skip_folders.contains(&name)
}

fn process_entry(entry: &DirEntry, result: &mut ScanResult, options: &ScanOptions) -> Result<()> {
    if entry.file_type().is_dir() {
        result.stats.dirs_scanned += 1;
        return Ok(());
    }

    let path = entry.path();
    let metadata = entry
        .metadata()
        .map_err(|e| DeclutterError::unreadable(path, e.into()))?;

    if !metadata.is_file() {
        return Ok(());
    }

    let record = FileRecord::from_metadata(path, &metadata);

    let skip_ext = record
        .extension
        .as_ref()
        .map(|ext| options.skip_extensions.contains(ext))
        .unwrap_or(false);

    if skip_ext || record.size_bytes < options.min_file_size {
        result.stats.files_filtered += 1;
        return Ok(());
    }

    result.stats.files_scanned += 1;
    result.stats.bytes_scanned += record.size_bytes;
    result.records.push(record);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let result = scan_directory(temp_dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(result.stats.files_scanned, 0);
        assert_eq!(result.stats.dirs_scanned, 1);
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_scan_with_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("file1.txt"), b"content1").unwrap();
        fs::write(temp_dir.path().join("file2.TXT"), b"content2").unwrap();

        let result = scan_directory(temp_dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(result.stats.files_scanned, 2);
        assert_eq!(result.stats.bytes_scanned, 16);
        assert!(result
            .records
            .iter()
            .all(|r| r.extension.as_deref() == Some("txt")));
    }

    #[test]
    fn test_scan_with_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("file.txt"), b"content").unwrap();

        let result = scan_directory(temp_dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(result.stats.files_scanned, 1);
        assert_eq!(result.stats.dirs_scanned, 2);
    }

    #[test]
    fn test_scan_options_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let level1 = temp_dir.path().join("level1");
        let level2 = level1.join("level2");
        fs::create_dir_all(&level2).unwrap();
        fs::write(level1.join("file1.txt"), b"").unwrap();
        fs::write(level2.join("file2.txt"), b"").unwrap();

        let options = ScanOptions {
            max_depth: Some(2),
            ..Default::default()
        };
        let result = scan_directory(temp_dir.path(), &options).unwrap();

        assert_eq!(result.stats.files_scanned, 1);
        assert_eq!(result.records[0].filename, "file1.txt");
    }

    #[test]
    fn test_skip_folders_are_pruned() {
        let temp_dir = TempDir::new().unwrap();
        let modules = temp_dir.path().join("Node_Modules").join("pkg");
        fs::create_dir_all(&modules).unwrap();
        fs::write(modules.join("index.js"), b"x").unwrap();
        fs::write(temp_dir.path().join("keep.js"), b"x").unwrap();

        let options = ScanOptions::default().with_skip_folders(["node_modules"]);
        let result = scan_directory(temp_dir.path(), &options).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].filename, "keep.js");
    }

    #[test]
    fn test_skip_extensions_and_min_size() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.lnk"), b"shortcut").unwrap();
        fs::write(temp_dir.path().join("empty.txt"), b"").unwrap();
        fs::write(temp_dir.path().join("data.txt"), b"data").unwrap();

        let options = ScanOptions {
            min_file_size: 1,
            ..Default::default()
        }
        .with_skip_extensions([".LNK"]);
        let result = scan_directory(temp_dir.path(), &options).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].filename, "data.txt");
        assert_eq!(result.stats.files_filtered, 2);
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let result = scan_directory(&missing, &ScanOptions::default());
        assert!(matches!(result, Err(DeclutterError::PathNotFound(p)) if p == missing));
    }

    #[test]
    fn test_scan_roots_skips_missing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
        let missing = temp_dir.path().join("missing");

        let result = scan_roots(&[temp_dir.path().to_path_buf(), missing], &ScanOptions::default());

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.stats.errors.len(), 1);
    }

    #[test]
    fn test_records_are_absolute_for_relative_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("inbox")).unwrap();
        fs::write(temp_dir.path().join("inbox/a.txt"), b"a").unwrap();
        let dotted = temp_dir.path().join("inbox/../inbox/.");

        let result = scan_directory(&dotted, &ScanOptions::default()).unwrap();

        let expected = fs::canonicalize(temp_dir.path().join("inbox/a.txt")).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].path, expected);
        assert!(result.records[0].path.is_absolute());
    }

    #[test]
    fn test_overlapping_roots_record_each_file_once() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(temp_dir.path().join("top.txt"), b"top").unwrap();
        fs::write(sub.join("only.txt"), b"only").unwrap();

        let roots = vec![
            temp_dir.path().to_path_buf(),
            sub.clone(),
            sub.join("."),
        ];
        let result = scan_roots(&roots, &ScanOptions::default());

        let names: Vec<&str> = result.records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["only.txt", "top.txt"]);
        assert_eq!(result.stats.files_scanned, 2);
        assert_eq!(result.stats.bytes_scanned, 7);
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".ZIP"), "zip");
        assert_eq!(normalize_extension(" tar "), "tar");
    }
}
