use super::{attachment_file_name, read_message_file, safe_name, MailContents, MessageFormat};
use crate::cleanup::{CollisionStyle, DestinationAllocator};
use crate::error::{DeclutterError, Result};
use crate::index::{scan_directory, ScanOptions};
use crate::model::ExecutionMode;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Tally of one extraction run. In DryRun the counts describe the files that
/// would have been written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    pub messages_scanned: usize,
    pub messages_with_attachments: usize,
    pub nested_messages: usize,
    pub attachments_written: usize,
    pub bytes_written: u64,
    pub written: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
    pub dry_run: bool,
}

/// Writes every attachment of every email under a root into one
/// destination, one folder per email and a sub-folder per attached message.
pub struct AttachmentExtractor {
    destination: PathBuf,
    mode: ExecutionMode,
    max_nesting: usize,
    skip_folders: Vec<String>,
}

impl AttachmentExtractor {
    pub fn new(destination: impl Into<PathBuf>, mode: ExecutionMode) -> Self {
        Self {
            destination: destination.into(),
            mode,
            max_nesting: 5,
            skip_folders: Vec::new(),
        }
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    pub fn with_skip_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_folders = folders.into_iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// `.eml` and `.msg` files under `root`, in traversal order. Anything
    /// already inside the destination is left out.
    pub fn find_messages(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let options = ScanOptions::default().with_skip_folders(&self.skip_folders);
        let scan = scan_directory(root, &options)?;
        let destination = fs::canonicalize(&self.destination).unwrap_or_else(|_| self.destination.clone());

        Ok(scan
            .records
            .into_iter()
            .filter(|r| MessageFormat::from_name(&r.filename).is_some())
            .filter(|r| !r.path.starts_with(&destination))
            .map(|r| r.path)
            .collect())
    }

    pub fn extract_tree(&self, root: &Path) -> Result<ExtractionReport> {
        let messages = self.find_messages(root)?;
        Ok(self.extract_with_progress(&messages, |_| {}))
    }

    /// Extracts `messages` in order. A message that cannot be parsed or
    /// written is logged and recorded, and the run continues.
    pub fn extract_with_progress<F: FnMut(&Path)>(
        &self,
        messages: &[PathBuf],
        mut on_message: F,
    ) -> ExtractionReport {
        let mut report = ExtractionReport {
            dry_run: self.mode.is_dry_run(),
            ..Default::default()
        };
        let mut allocator = DestinationAllocator::new();

        for path in messages {
            report.messages_scanned += 1;
            if let Err(e) = self.extract_message(path, &mut allocator, &mut report) {
                log::error!("Extraction failed for {}: {}", path.display(), e);
                report.failures.push((path.clone(), e.to_string()));
            }
            on_message(path);
        }

        report
    }

    fn extract_message(
        &self,
        path: &Path,
        allocator: &mut DestinationAllocator,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let contents = read_message_file(path, self.max_nesting)?;
        if contents.is_empty() {
            log::debug!("No attachments in {}", path.display());
            return Ok(());
        }

        report.messages_with_attachments += 1;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let folder = allocator.claim(&self.destination, &safe_name(&stem, 100), CollisionStyle::Underscored);
        log::info!(
            "{} attachment(s) from {} -> {}",
            contents.attachment_count(),
            path.display(),
            folder.display()
        );

        self.write_contents(&contents, &folder, allocator, report)
    }

    fn write_contents(
        &self,
        contents: &MailContents,
        folder: &Path,
        allocator: &mut DestinationAllocator,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        for attachment in &contents.attachments {
            let target = allocator.claim(folder, &attachment_file_name(&attachment.name), CollisionStyle::Underscored);

            if self.mode.is_dry_run() {
                log::info!("DRY RUN: would write {}", target.display());
            } else {
                fs::create_dir_all(folder).map_err(|e| write_failed(folder, e))?;
                fs::write(&target, &attachment.data).map_err(|e| write_failed(&target, e))?;
                log::debug!("Wrote {}", target.display());
            }

            report.attachments_written += 1;
            report.bytes_written += attachment.data.len() as u64;
            report.written.push(target);
        }

        for nested in &contents.nested {
            if nested.contents.is_empty() {
                continue;
            }
            report.nested_messages += 1;
            let stem = Path::new(&nested.name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| nested.name.clone());
            let sub_folder = allocator.claim(folder, &safe_name(&stem, 100), CollisionStyle::Underscored);
            self.write_contents(&nested.contents, &sub_folder, allocator, report)?;
        }

        Ok(())
    }
}

fn write_failed(path: &Path, err: std::io::Error) -> DeclutterError {
    DeclutterError::ActionFailed {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
