use super::{read_attached_message, Attachment, MailContents, NestedMessage};
use mail_parser::{Message, MessageParser, MimeHeaders};

/// Parses a MIME message. `None` when `raw` holds no message at all.
pub fn read_eml(raw: &[u8], max_nesting: usize) -> Option<MailContents> {
    let message = MessageParser::default().parse(raw)?;
    let mut contents = MailContents::default();
    collect(&message, max_nesting, &mut contents);
    Some(contents)
}

fn collect(message: &Message<'_>, max_nesting: usize, out: &mut MailContents) {
    for (index, part) in message.attachments().enumerate() {
        let declared = part.attachment_name().map(str::to_string);

        if let Some(inner) = part.message() {
            let name = declared
                .or_else(|| inner.subject().map(|s| format!("{}.eml", s)))
                .unwrap_or_else(|| format!("embedded_{}.eml", index));

            if max_nesting == 0 {
                log::debug!("Nesting limit reached, keeping {} as a file", name);
                out.attachments.push(Attachment {
                    name,
                    data: part.contents().to_vec(),
                });
            } else {
                let mut contents = MailContents::default();
                collect(inner, max_nesting - 1, &mut contents);
                out.nested.push(NestedMessage { name, contents });
            }
            continue;
        }

        let data = part.contents();
        if data.is_empty() {
            continue;
        }
        let name = declared.unwrap_or_else(|| format!("attachment_{}", index));

        if max_nesting > 0 {
            if let Some(contents) = read_attached_message(&name, data, max_nesting - 1) {
                out.nested.push(NestedMessage { name, contents });
                continue;
            }
        }

        out.attachments.push(Attachment {
            name,
            data: data.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart(boundary: &str, parts: &[String]) -> String {
        let mut body = format!(
            "From: a@example.com\r\nTo: b@example.com\r\nSubject: Outer\r\nMIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"{b}\"\r\n\r\n--{b}\r\n\
             Content-Type: text/plain\r\n\r\nSee attached.\r\n",
            b = boundary
        );
        for part in parts {
            body.push_str(&format!("--{}\r\n{}\r\n", boundary, part));
        }
        body.push_str(&format!("--{}--\r\n", boundary));
        body
    }

    fn file_part(name: &str, content: &str) -> String {
        format!(
            "Content-Type: application/octet-stream\r\n\
             Content-Disposition: attachment; filename=\"{}\"\r\n\r\n{}",
            name, content
        )
    }

    fn message_part(inner: &str) -> String {
        format!(
            "Content-Type: message/rfc822\r\nContent-Disposition: attachment\r\n\r\n{}",
            inner
        )
    }

    #[test]
    fn test_reads_plain_attachments() {
        let raw = multipart("outer", &[file_part("invoice.pdf", "%PDF-1.4"), file_part("notes", "n")]);

        let contents = read_eml(raw.as_bytes(), 5).unwrap();

        let names: Vec<&str> = contents.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["invoice.pdf", "notes"]);
        assert_eq!(contents.attachments[0].data, b"%PDF-1.4");
        assert!(contents.nested.is_empty());
    }

    #[test]
    fn test_descends_into_attached_messages() {
        let inner = multipart("inner", &[file_part("photo.jpg", "JPEGDATA")]);
        let raw = multipart("outer", &[file_part("cover.txt", "hi"), message_part(&inner)]);

        let contents = read_eml(raw.as_bytes(), 5).unwrap();

        assert_eq!(contents.attachments.len(), 1);
        assert_eq!(contents.nested.len(), 1);
        assert_eq!(contents.nested[0].name, "Outer.eml");
        assert_eq!(contents.nested[0].contents.attachments[0].name, "photo.jpg");
        assert_eq!(contents.nested[0].contents.attachments[0].data, b"JPEGDATA");
        assert_eq!(contents.attachment_count(), 2);
    }

    #[test]
    fn test_nesting_limit_keeps_message_as_file() {
        let inner = multipart("inner", &[file_part("photo.jpg", "JPEGDATA")]);
        let raw = multipart("outer", &[message_part(&inner)]);

        let contents = read_eml(raw.as_bytes(), 0).unwrap();

        assert!(contents.nested.is_empty());
        assert_eq!(contents.attachments.len(), 1);
        assert!(contents.attachments[0].name.ends_with(".eml"));
    }
}
