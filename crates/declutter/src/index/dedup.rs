//! Duplicate detection by (size, digest).
//!
//! Files are bucketed by size first, which costs no I/O. Only buckets with at
//! least two members are hashed, then split again by digest. Groups keep the
//! traversal order of their members and are returned in order of first
//! appearance.

use crate::index::hasher::hash_file;
use crate::model::{ContentDigest, DuplicateGroup, FileRecord, HashAlgorithm};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Default, Clone, Serialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    pub files_considered: usize,
    pub files_hashed: usize,
    /// Files that could not be hashed, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

impl DuplicateReport {
    /// Number of files that would be removed if every group kept one copy.
    pub fn duplicate_file_count(&self) -> usize {
        self.groups.iter().map(|g| g.files.len() - 1).sum()
    }

    pub fn wasted_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_bytes).sum()
    }

    /// Groups ordered largest-first for display; ties keep discovery order.
    pub fn groups_by_copies(&self) -> Vec<&DuplicateGroup> {
        let mut groups: Vec<&DuplicateGroup> = self.groups.iter().collect();
        groups.sort_by(|a, b| b.files.len().cmp(&a.files.len()));
        groups
    }
}

/// Buckets records by size, preserving first-seen order of sizes and members.
pub fn bucket_by_size(records: &[FileRecord]) -> Vec<(u64, Vec<&FileRecord>)> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut buckets: Vec<(u64, Vec<&FileRecord>)> = Vec::new();

    for record in records {
        match index.get(&record.size_bytes) {
            Some(&slot) => buckets[slot].1.push(record),
            None => {
                index.insert(record.size_bytes, buckets.len());
                buckets.push((record.size_bytes, vec![record]));
            }
        }
    }

    buckets
}

/// Finds duplicate groups among `records`.
///
/// `on_hashed` is called once per file hashed (successfully or not), which
/// lets callers drive a progress bar.
pub fn find_duplicates_with_progress<F: FnMut(&FileRecord)>(
    records: &[FileRecord],
    algorithm: HashAlgorithm,
    mut on_hashed: F,
) -> DuplicateReport {
    let mut report = DuplicateReport {
        files_considered: records.len(),
        ..Default::default()
    };

    for (size, bucket) in bucket_by_size(records) {
        if bucket.len() < 2 {
            continue;
        }

        let mut slots: HashMap<ContentDigest, usize> = HashMap::new();
        let mut by_digest: Vec<(ContentDigest, Vec<FileRecord>)> = Vec::new();

        for record in bucket {
            let digest = match hash_file(&record.path, algorithm) {
                Ok(digest) => digest,
                Err(e) => {
                    log::warn!("Cannot hash {}: {}", record.path.display(), e);
                    report.skipped.push((record.path.clone(), e.to_string()));
                    on_hashed(record);
                    continue;
                }
            };
            report.files_hashed += 1;
            on_hashed(record);

            match slots.get(&digest) {
                Some(&slot) => by_digest[slot].1.push(record.clone()),
                None => {
                    slots.insert(digest.clone(), by_digest.len());
                    by_digest.push((digest, vec![record.clone()]));
                }
            }
        }

        for (digest, files) in by_digest {
            if files.len() < 2 {
                continue;
            }
            log::debug!("Duplicate group {} ({} files, {} bytes each)", digest, files.len(), size);
            report.groups.push(DuplicateGroup {
                digest,
                size_bytes: size,
                files,
            });
        }
    }

    report
}

pub fn find_duplicates(records: &[FileRecord], algorithm: HashAlgorithm) -> DuplicateReport {
    find_duplicates_with_progress(records, algorithm, |_| {})
}

/// Number of files that will actually be hashed, i.e. members of size
/// buckets with two or more files.
pub fn count_hash_candidates(records: &[FileRecord]) -> usize {
    bucket_by_size(records)
        .into_iter()
        .filter(|(_, bucket)| bucket.len() > 1)
        .map(|(_, bucket)| bucket.len())
        .sum()
}
