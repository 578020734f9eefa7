//! Webhook request bodies: `multipart/form-data` and urlencoded forms.
//!
//! Multipart bodies are framed with their `Content-Type` header and handed to
//! `mail-parser`, which already understands boundaries, dispositions and
//! RFC 2231 parameters.

use mail_parser::{MessageParser, MessagePart, MimeHeaders, PartType};

use crate::model::attachment::UploadedFile;
use crate::model::payload::InboundPayload;
use crate::parser::mime::essence;

/// A captured inbound HTTP request, as handed over by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    /// Value of the request's `Content-Type` header.
    pub content_type: String,
    /// Raw request body.
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Decode the body and keep only the recognized fields.
    ///
    /// Never fails: an undecodable body simply yields an empty payload.
    pub fn parse(&self) -> InboundPayload {
        let form = decode_form(&self.content_type, &self.body);
        InboundPayload::from_parts(form.fields, form.files)
    }
}

/// Text fields and file parts of a decoded form, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

/// Decode a request body according to its content type.
pub fn decode_form(content_type: &str, body: &[u8]) -> FormData {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match media_type.as_str() {
        "multipart/form-data" => decode_multipart(content_type, body),
        "application/x-www-form-urlencoded" => decode_urlencoded(body),
        other => {
            tracing::warn!(content_type = other, "Unsupported request content type");
            FormData::default()
        }
    }
}

fn decode_urlencoded(body: &[u8]) -> FormData {
    FormData {
        fields: url::form_urlencoded::parse(body).into_owned().collect(),
        files: Vec::new(),
    }
}

fn decode_multipart(content_type: &str, body: &[u8]) -> FormData {
    // Header values cannot carry line breaks; drop any so the framing holds.
    let header: String = content_type
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();

    let mut framed = Vec::with_capacity(body.len() + header.len() + 18);
    framed.extend_from_slice(b"Content-Type: ");
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(b"\r\n\r\n");
    framed.extend_from_slice(body);

    let Some(message) = MessageParser::default().parse(&framed[..]) else {
        tracing::warn!(size = body.len(), "Failed to decode multipart body");
        return FormData::default();
    };

    let children = match message.parts.first().map(|root| &root.body) {
        Some(PartType::Multipart(children)) => children,
        _ => {
            tracing::warn!("Multipart body has no usable boundary");
            return FormData::default();
        }
    };
    let raw = message.raw_message();

    let mut form = FormData::default();
    for part in children.iter().filter_map(|&id| message.parts.get(id)) {
        let disposition = part.content_disposition();
        let field_name = disposition
            .and_then(|d| d.attribute("name"))
            .unwrap_or_default()
            .to_string();

        match disposition.and_then(|d| d.attribute("filename")) {
            Some(file_name) => form.files.push(UploadedFile {
                field_name,
                file_name: file_name.to_string(),
                content_type: part.content_type().map(essence),
                contents: raw_body(raw, part).to_vec(),
            }),
            None if !field_name.is_empty() => {
                form.fields.push((field_name, field_value(raw, part)));
            }
            None => {
                tracing::debug!("Skipping form part without a name");
            }
        }
    }

    form
}

fn field_value(raw: &[u8], part: &MessagePart<'_>) -> String {
    match part.text_contents() {
        Some(text) => text.to_string(),
        None => String::from_utf8_lossy(raw_body(raw, part)).into_owned(),
    }
}

/// Bytes of a part exactly as uploaded: no charset or transfer decoding, and
/// without the line break that belongs to the next boundary delimiter.
fn raw_body<'a>(raw: &'a [u8], part: &MessagePart<'_>) -> &'a [u8] {
    let body = raw
        .get(part.raw_body_offset()..part.raw_end_offset())
        .unwrap_or_default();
    body.strip_suffix(b"\r\n")
        .or_else(|| body.strip_suffix(b"\n"))
        .unwrap_or(body)
}
