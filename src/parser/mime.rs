//! Raw MIME messages: flatten the part tree into attachment records.

use mail_parser::{ContentType, MessageParser, MessagePart, MimeHeaders, PartType};

use crate::error::{DropError, Result};
use crate::model::attachment::Attachment;

/// Extension used when a content type has no known mapping.
const FALLBACK_EXTENSION: &str = "bin";

/// Extensions preferred over the first `mime_guess` candidate, which is
/// often an obscure alias (`text/plain` → `asc`).
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("application/octet-stream", "bin"),
    ("application/pdf", "pdf"),
    ("application/zip", "zip"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/tiff", "tif"),
    ("message/rfc822", "eml"),
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("text/csv", "csv"),
    ("text/xml", "xml"),
    ("text/calendar", "ics"),
];

/// Parse a raw RFC 822 message and return every non-multipart part as an
/// attachment, in document order.
///
/// Parts without a file name are named `part-NNN.ext`, where `NNN` counts
/// non-multipart parts from 1 (named parts consume a number too). Contents
/// are the part body exactly as it appears in the message, still
/// transfer-encoded.
pub fn extract_raw_attachments(raw_message: &[u8]) -> Result<Vec<Attachment>> {
    if raw_message.iter().all(u8::is_ascii_whitespace) {
        return Err(DropError::MalformedMessage("message is empty".into()));
    }

    let message = MessageParser::default()
        .parse(raw_message)
        .ok_or_else(|| DropError::MalformedMessage("no header block found".into()))?;

    let digest_children = digest_children(&message.parts);
    let raw = message.raw_message();

    let mut attachments = Vec::new();
    let mut counter = 0usize;

    for (id, part) in message.parts.iter().enumerate() {
        if is_container(part) {
            continue;
        }
        counter += 1;

        let content_type = declared_content_type(part, digest_children.contains(&id));
        let file_name = match part.attachment_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => synthesize_file_name(counter, &content_type),
        };
        let contents = raw
            .get(part.raw_body_offset()..part.raw_end_offset())
            .unwrap_or_default()
            .to_vec();

        tracing::debug!(
            file_name = %file_name,
            content_type = %content_type,
            size = contents.len(),
            "Found MIME part"
        );

        attachments.push(Attachment::new(content_type, file_name, contents));
    }

    Ok(attachments)
}

/// `part-NNN.ext` for the `counter`-th non-multipart part.
pub fn synthesize_file_name(counter: usize, content_type: &str) -> String {
    format!("part-{counter:03}.{}", extension_for(content_type))
}

/// File extension (without the dot) for a content type.
pub fn extension_for(content_type: &str) -> &'static str {
    let content_type = content_type.trim().to_ascii_lowercase();
    PREFERRED_EXTENSIONS
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&content_type)
                .and_then(|exts| exts.first().copied())
        })
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Lowercase `type/subtype` of a parsed content type, parameters dropped.
pub(crate) fn essence(ct: &ContentType<'_>) -> String {
    match ct.subtype() {
        Some(sub) => format!("{}/{}", ct.ctype(), sub).to_ascii_lowercase(),
        None => ct.ctype().to_ascii_lowercase(),
    }
}

/// Structural parts: parsed as multipart, or declared `multipart/*` even
/// when the boundary could not be used.
fn is_container(part: &MessagePart<'_>) -> bool {
    matches!(part.body, PartType::Multipart(_))
        || part
            .content_type()
            .is_some_and(|ct| ct.ctype().eq_ignore_ascii_case("multipart"))
}

/// Declared type, or the RFC 2045 default when the header is absent or has
/// no subtype.
fn declared_content_type(part: &MessagePart<'_>, in_digest: bool) -> String {
    match part.content_type() {
        Some(ct) if ct.subtype().is_some() => essence(ct),
        None if in_digest => "message/rfc822".to_string(),
        _ => "text/plain".to_string(),
    }
}

/// Ids of the direct children of every `multipart/digest` part.
fn digest_children(parts: &[MessagePart<'_>]) -> Vec<usize> {
    parts
        .iter()
        .filter(|part| {
            part.content_type().is_some_and(|ct| {
                ct.ctype().eq_ignore_ascii_case("multipart")
                    && ct.subtype().is_some_and(|s| s.eq_ignore_ascii_case("digest"))
            })
        })
        .filter_map(|part| match &part.body {
            PartType::Multipart(children) => Some(children.iter().copied()),
            _ => None,
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_preferred() {
        assert_eq!(extension_for("text/plain"), "txt");
        assert_eq!(extension_for("IMAGE/JPEG"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }

    #[test]
    fn test_extension_from_mime_database() {
        let ext = extension_for("image/webp");
        assert_eq!(ext, "webp");
    }

    #[test]
    fn test_extension_unknown_falls_back() {
        assert_eq!(extension_for("application/x-made-up-type"), "bin");
    }

    #[test]
    fn test_synthesize_file_name() {
        assert_eq!(synthesize_file_name(1, "image/jpeg"), "part-001.jpg");
        assert_eq!(synthesize_file_name(12, "application/x-nope"), "part-012.bin");
        assert_eq!(synthesize_file_name(1000, "text/plain"), "part-1000.txt");
    }

    #[test]
    fn test_single_part_message_is_one_attachment() {
        let raw = b"From: a@b.com\r\nSubject: plain\r\n\r\nJust text.\r\n";
        let attachments = extract_raw_attachments(raw).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].content_type, "text/plain");
        assert_eq!(attachments[0].file_name, "part-001.txt");
        assert_eq!(
            String::from_utf8_lossy(&attachments[0].contents).trim(),
            "Just text."
        );
    }

    #[test]
    fn test_invalid_content_type_defaults_to_text_plain() {
        let raw = b"From: a@b.com\r\nContent-Type: garbage\r\n\r\nBody.\r\n";
        let attachments = extract_raw_attachments(raw).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].content_type, "text/plain");
        assert_eq!(attachments[0].file_name, "part-001.txt");
    }

    #[test]
    fn test_empty_message_is_malformed() {
        assert!(matches!(
            extract_raw_attachments(b"  \r\n"),
            Err(DropError::MalformedMessage(_))
        ));
    }
}
