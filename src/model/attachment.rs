//! Attachment records produced by extraction.

/// A single attachment recovered from an inbound request.
///
/// Created during extraction and never mutated afterwards. `contents` is
/// base64 text for form uploads and the raw, still transfer-encoded part
/// body for raw MIME messages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Attachment {
    /// MIME content type, lowercase `type/subtype` for raw MIME parts.
    pub content_type: String,

    /// File name; synthesized (`part-NNN.ext`) when the part declares none.
    pub file_name: String,

    /// Stored bytes.
    #[serde(skip)]
    pub contents: Vec<u8>,
}

impl Attachment {
    pub fn new(
        content_type: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    /// Size of the stored contents in bytes.
    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

/// A file part of a multipart form upload, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field name (e.g. `attachment1`).
    pub field_name: String,
    /// Client-supplied file name, verbatim.
    pub file_name: String,
    /// Declared content type, if the part carried one.
    pub content_type: Option<String>,
    /// Decoded part body.
    pub contents: Vec<u8>,
}
