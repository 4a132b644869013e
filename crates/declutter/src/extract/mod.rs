//! Attachment extraction from saved emails.
//!
//! `.eml` files are parsed as MIME, Outlook `.msg` files as compound files.
//! Both readers produce the same [`MailContents`] tree: the message's own
//! attachments plus the messages attached to it, unpacked to a fixed depth.

pub mod eml;
pub mod extractor;
pub mod msg;

pub use extractor::{AttachmentExtractor, ExtractionReport};

use crate::error::{DeclutterError, Result};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub data: Vec<u8>,
}

/// A message attached to another message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedMessage {
    pub name: String,
    pub contents: MailContents,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailContents {
    pub attachments: Vec<Attachment>,
    pub nested: Vec<NestedMessage>,
}

impl MailContents {
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty() && self.nested.iter().all(|n| n.contents.is_empty())
    }

    /// Attachments at every level.
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
            + self
                .nested
                .iter()
                .map(|n| n.contents.attachment_count())
                .sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Eml,
    Msg,
}

impl MessageFormat {
    /// Decided by extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if lower.ends_with(".eml") {
            Some(MessageFormat::Eml)
        } else if lower.ends_with(".msg") {
            Some(MessageFormat::Msg)
        } else {
            None
        }
    }
}

/// Reads the email at `path`, unpacking up to `max_nesting` levels of
/// attached messages.
pub fn read_message_file(path: &Path, max_nesting: usize) -> Result<MailContents> {
    let name = path.to_string_lossy();
    let format = MessageFormat::from_name(&name)
        .ok_or_else(|| DeclutterError::UnsupportedFormat(format!("not an email: {}", path.display())))?;

    match format {
        MessageFormat::Eml => {
            let raw = fs::read(path).map_err(|e| DeclutterError::unreadable(path, e))?;
            eml::read_eml(&raw, max_nesting).ok_or_else(|| DeclutterError::MalformedMessage {
                path: path.to_path_buf(),
                message: "no MIME structure found".to_string(),
            })
        }
        MessageFormat::Msg => {
            let file = fs::File::open(path).map_err(|e| DeclutterError::unreadable(path, e))?;
            msg::read_msg(file, max_nesting).map_err(|e| DeclutterError::MalformedMessage {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}

/// Parses an attachment that is itself an email file, if it is one.
pub(crate) fn read_attached_message(name: &str, data: &[u8], max_nesting: usize) -> Option<MailContents> {
    match MessageFormat::from_name(name)? {
        MessageFormat::Eml => eml::read_eml(data, max_nesting),
        MessageFormat::Msg => match msg::read_msg(Cursor::new(data), max_nesting) {
            Ok(contents) => Some(contents),
            Err(e) => {
                log::warn!("Attached {} is not a readable .msg: {}", name, e);
                None
            }
        },
    }
}

/// Makes `name` usable as a file or folder name on any platform.
///
/// Reserved characters and control characters become `_`, the result is cut
/// to `max_len` characters and an empty result becomes `unnamed`.
pub fn safe_name(name: &str, max_len: usize) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(max_len)
        .collect();

    let cleaned = cleaned.trim().trim_end_matches('.').to_string();
    if cleaned.is_empty() || cleaned == "." {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Attachment file name: safe, and given a `.bin` extension when it has none.
pub fn attachment_file_name(name: &str) -> String {
    let safe = safe_name(name, 200);
    if Path::new(&safe).extension().is_some() {
        safe
    } else {
        format!("{}.bin", safe)
    }
}
