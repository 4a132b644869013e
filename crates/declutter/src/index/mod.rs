pub mod dedup;
pub mod hasher;
pub mod scanner;
pub mod siblings;

pub use dedup::{count_hash_candidates, find_duplicates, find_duplicates_with_progress, DuplicateReport};
pub use hasher::{hash_file, hash_file_blake3, hash_file_md5};
pub use scanner::{
    canonical_root, normalize_extension, scan_directory, scan_roots, ScanOptions, ScanResult, ScanStats,
    DEFAULT_SKIP_FOLDERS,
};
pub use siblings::{SiblingEntry, SiblingIndex};
