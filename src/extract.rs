//! Attachment extraction: form uploads or a raw MIME message.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{DropError, Result};
use crate::model::attachment::{Attachment, UploadedFile};
use crate::model::payload::InboundPayload;
use crate::parser::mime;

/// File names injected by the upload layer for non-file artifacts.
const RESERVED_FILE_NAMES: [&str; 2] = ["fdopen", "<fdopen>"];

/// Where a request's attachments come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Uploaded file parts, announced by an `attachment-info` field.
    Form,
    /// The raw message in the `email` field.
    RawMime,
}

impl ExtractionStrategy {
    /// Pick the strategy from the payload shape. A raw message takes
    /// precedence over form uploads; `None` means there is nothing to
    /// extract.
    pub fn select(payload: &InboundPayload) -> Option<Self> {
        if payload.email().is_some() {
            Some(Self::RawMime)
        } else if payload.attachment_info().is_some() {
            Some(Self::Form)
        } else {
            None
        }
    }
}

/// Extract the attachments of one request. Zero attachments is `Ok(vec![])`.
pub fn extract_attachments(payload: &InboundPayload) -> Result<Vec<Attachment>> {
    match ExtractionStrategy::select(payload) {
        Some(ExtractionStrategy::RawMime) => {
            let raw = payload.email().unwrap_or_default();
            mime::extract_raw_attachments(raw.as_bytes())
        }
        Some(ExtractionStrategy::Form) => extract_form_attachments(payload.files()),
        None => Ok(Vec::new()),
    }
}

/// Turn uploaded file parts into attachments with base64 contents.
///
/// Parts with an empty or reserved file name are skipped. File names are
/// kept verbatim; they are sanitized when the storage path is built.
pub fn extract_form_attachments(files: &[UploadedFile]) -> Result<Vec<Attachment>> {
    let mut attachments = Vec::with_capacity(files.len());

    for file in files {
        if file.file_name.is_empty() || RESERVED_FILE_NAMES.contains(&file.file_name.as_str()) {
            tracing::debug!(field = %file.field_name, file_name = %file.file_name, "Skipping non-file part");
            continue;
        }

        let content_type = file
            .content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .ok_or_else(|| DropError::MissingContentType {
                file_name: file.file_name.clone(),
            })?;

        attachments.push(Attachment::new(
            content_type,
            file.file_name.clone(),
            STANDARD.encode(&file.contents),
        ));
    }

    Ok(attachments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(file_name: &str, content_type: Option<&str>, contents: &[u8]) -> UploadedFile {
        UploadedFile {
            field_name: "attachment1".to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.map(String::from),
            contents: contents.to_vec(),
        }
    }

    #[test]
    fn test_form_skips_reserved_and_empty_names() {
        let files = vec![
            upload("fdopen", Some("text/plain"), b"x"),
            upload("<fdopen>", Some("text/plain"), b"x"),
            upload("", Some("text/plain"), b"x"),
            upload("notes.txt", Some("text/plain"), b"hello"),
        ];
        let attachments = extract_form_attachments(&files).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].file_name, "notes.txt");
        assert_eq!(attachments[0].content_type, "text/plain");
        assert_eq!(attachments[0].contents, b"aGVsbG8=");
    }

    #[test]
    fn test_form_keeps_file_name_verbatim() {
        let files = vec![upload("../../etc/passwd", Some("text/plain"), b"")];
        let attachments = extract_form_attachments(&files).unwrap();
        assert_eq!(attachments[0].file_name, "../../etc/passwd");
    }

    #[test]
    fn test_form_missing_content_type_fails() {
        let files = vec![upload("scan.pdf", None, b"%PDF")];
        let err = extract_form_attachments(&files).unwrap_err();
        assert!(matches!(err, DropError::MissingContentType { ref file_name } if file_name == "scan.pdf"));
    }

    #[test]
    fn test_select_strategy() {
        let none = InboundPayload::from_parts([("subject", "x")], Vec::new());
        assert_eq!(ExtractionStrategy::select(&none), None);

        let form = InboundPayload::from_parts([("attachment-info", "{}")], Vec::new());
        assert_eq!(ExtractionStrategy::select(&form), Some(ExtractionStrategy::Form));

        let both = InboundPayload::from_parts(
            [("attachment-info", "{}"), ("email", "Subject: x\r\n\r\nbody")],
            Vec::new(),
        );
        assert_eq!(ExtractionStrategy::select(&both), Some(ExtractionStrategy::RawMime));
    }

    #[test]
    fn test_raw_message_replaces_form_uploads() {
        let payload = InboundPayload::from_parts(
            [
                ("attachment-info", "{}"),
                ("email", "Subject: x\r\nContent-Type: text/html\r\n\r\n<p>hi</p>\r\n"),
            ],
            vec![upload("notes.txt", Some("text/plain"), b"hello")],
        );
        let attachments = extract_attachments(&payload).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].file_name, "part-001.html");
        assert_eq!(attachments[0].content_type, "text/html");
    }

    #[test]
    fn test_no_trigger_yields_empty() {
        let payload = InboundPayload::from_parts(
            [("subject", "x")],
            vec![upload("notes.txt", Some("text/plain"), b"hello")],
        );
        assert!(extract_attachments(&payload).unwrap().is_empty());
    }
}
