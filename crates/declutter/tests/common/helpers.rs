use chrono::{DateTime, Duration, Utc};
use declutter_lib::model::{extension_of, file_name_of};
use declutter_lib::FileRecord;
use std::path::PathBuf;

pub fn create_record_builder(path: &str) -> FileRecordBuilder {
    FileRecordBuilder::new(path)
}

/// Builds in-memory records for tests that never touch the disk.
pub struct FileRecordBuilder {
    record: FileRecord,
}

impl FileRecordBuilder {
    pub fn new(path: &str) -> Self {
        let path = PathBuf::from(path);
        Self {
            record: FileRecord {
                filename: file_name_of(&path),
                extension: extension_of(&path),
                path,
                size_bytes: 1024,
                modified_at: Some(Utc::now()),
            },
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.record.size_bytes = size;
        self
    }

    pub fn with_age_days(mut self, now: DateTime<Utc>, days: i64) -> Self {
        self.record.modified_at = Some(now - Duration::days(days));
        self
    }

    pub fn without_mtime(mut self) -> Self {
        self.record.modified_at = None;
        self
    }

    pub fn build(self) -> FileRecord {
        self.record
    }
}
