//! Outlook `.msg` reading.
//!
//! A `.msg` is a compound file. Each attachment is a storage named
//! `__attach_version1.0_#NNNNNNNN` holding property streams; an attached
//! message is a sub-storage laid out like a whole `.msg`.

use super::{read_attached_message, Attachment, MailContents, NestedMessage};
use cfb::CompoundFile;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

const ATTACHMENT_PREFIX: &str = "__attach_version1.0_#";
const LONG_FILENAME: &str = "3707";
const SHORT_FILENAME: &str = "3704";
const DISPLAY_NAME: &str = "3001";
const SUBJECT: &str = "0037";
const BINARY_DATA: &str = "__substg1.0_37010102";
const EMBEDDED_MESSAGE: &str = "__substg1.0_3701000D";

pub fn read_msg<F: Read + Seek>(inner: F, max_nesting: usize) -> io::Result<MailContents> {
    let mut file = CompoundFile::open(inner)?;
    let mut contents = MailContents::default();
    collect(&mut file, Path::new("/"), max_nesting, &mut contents)?;
    Ok(contents)
}

fn collect<F: Read + Seek>(
    file: &mut CompoundFile<F>,
    base: &Path,
    max_nesting: usize,
    out: &mut MailContents,
) -> io::Result<()> {
    let mut storages: Vec<PathBuf> = file
        .read_storage(base)?
        .filter(|entry| entry.is_storage() && entry.name().starts_with(ATTACHMENT_PREFIX))
        .map(|entry| entry.path().to_path_buf())
        .collect();
    storages.sort();

    for (index, storage) in storages.iter().enumerate() {
        let declared = [LONG_FILENAME, SHORT_FILENAME, DISPLAY_NAME]
            .iter()
            .find_map(|tag| read_string(file, storage, tag));

        let embedded = storage.join(EMBEDDED_MESSAGE);
        if file.is_storage(&embedded) {
            let name = declared
                .or_else(|| read_string(file, &embedded, SUBJECT).map(|s| format!("{}.msg", s)))
                .unwrap_or_else(|| format!("embedded_{}.msg", index));
            if max_nesting == 0 {
                log::warn!("Nesting limit reached, skipping attached message {}", name);
                continue;
            }
            let mut contents = MailContents::default();
            collect(file, &embedded, max_nesting - 1, &mut contents)?;
            out.nested.push(NestedMessage { name, contents });
            continue;
        }

        let data = match read_stream(file, &storage.join(BINARY_DATA)) {
            Some(data) if !data.is_empty() => data,
            _ => continue,
        };
        let name = declared.unwrap_or_else(|| format!("attachment_{}", index));

        if max_nesting > 0 {
            if let Some(contents) = read_attached_message(&name, &data, max_nesting - 1) {
                out.nested.push(NestedMessage { name, contents });
                continue;
            }
        }

        out.attachments.push(Attachment { name, data });
    }

    Ok(())
}

fn read_stream<F: Read + Seek>(file: &mut CompoundFile<F>, path: &Path) -> Option<Vec<u8>> {
    if !file.is_stream(path) {
        return None;
    }
    let mut data = Vec::new();
    match file.open_stream(path).and_then(|mut stream| stream.read_to_end(&mut data)) {
        Ok(_) => Some(data),
        Err(e) => {
            log::warn!("Cannot read stream {}: {}", path.display(), e);
            None
        }
    }
}

/// A string property: UTF-16LE (`001F`) preferred over 8-bit (`001E`).
fn read_string<F: Read + Seek>(file: &mut CompoundFile<F>, storage: &Path, tag: &str) -> Option<String> {
    let text = if let Some(raw) = read_stream(file, &storage.join(format!("__substg1.0_{}001F", tag))) {
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        let raw = read_stream(file, &storage.join(format!("__substg1.0_{}001E", tag)))?;
        String::from_utf8_lossy(&raw).into_owned()
    };

    let text = text.trim_end_matches('\0').trim().to_string();
    (!text.is_empty()).then_some(text)
}
