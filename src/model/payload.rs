//! The recognized subset of an Inbound Parse webhook request.

use std::collections::BTreeMap;

use super::attachment::UploadedFile;

/// Field names the provider may post. Anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PayloadKey {
    From,
    Attachments,
    Headers,
    Text,
    Envelope,
    To,
    Html,
    SenderIp,
    AttachmentInfo,
    Subject,
    Dkim,
    Spf,
    Charsets,
    ContentIds,
    SpamReport,
    SpamScore,
    Email,
}

impl PayloadKey {
    /// Every recognized key, in the provider's documented order.
    pub const ALL: [PayloadKey; 17] = [
        PayloadKey::From,
        PayloadKey::Attachments,
        PayloadKey::Headers,
        PayloadKey::Text,
        PayloadKey::Envelope,
        PayloadKey::To,
        PayloadKey::Html,
        PayloadKey::SenderIp,
        PayloadKey::AttachmentInfo,
        PayloadKey::Subject,
        PayloadKey::Dkim,
        PayloadKey::Spf,
        PayloadKey::Charsets,
        PayloadKey::ContentIds,
        PayloadKey::SpamReport,
        PayloadKey::SpamScore,
        PayloadKey::Email,
    ];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKey::From => "from",
            PayloadKey::Attachments => "attachments",
            PayloadKey::Headers => "headers",
            PayloadKey::Text => "text",
            PayloadKey::Envelope => "envelope",
            PayloadKey::To => "to",
            PayloadKey::Html => "html",
            PayloadKey::SenderIp => "sender_ip",
            PayloadKey::AttachmentInfo => "attachment-info",
            PayloadKey::Subject => "subject",
            PayloadKey::Dkim => "dkim",
            PayloadKey::Spf => "SPF",
            PayloadKey::Charsets => "charsets",
            PayloadKey::ContentIds => "content-ids",
            PayloadKey::SpamReport => "spam_report",
            PayloadKey::SpamScore => "spam_score",
            PayloadKey::Email => "email",
        }
    }

    /// Map a wire field name to its key. Matching is case-sensitive.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for PayloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable view of one webhook request: recognized text fields plus the
/// uploaded file parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundPayload {
    fields: BTreeMap<PayloadKey, String>,
    files: Vec<UploadedFile>,
}

impl InboundPayload {
    /// Build a payload from decoded form fields and files.
    ///
    /// Unrecognized field names are dropped; when a name repeats the first
    /// value wins.
    pub fn from_parts<I, K, V>(fields: I, files: Vec<UploadedFile>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in fields {
            match PayloadKey::from_field_name(name.as_ref()) {
                Some(key) => {
                    map.entry(key).or_insert_with(|| value.into());
                }
                None => {
                    tracing::trace!(field = name.as_ref(), "Dropping unrecognized field");
                }
            }
        }
        Self { fields: map, files }
    }

    pub fn get(&self, key: PayloadKey) -> Option<&str> {
        self.fields.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: PayloadKey) -> bool {
        self.fields.contains_key(&key)
    }

    /// The recognized keys present in this request, with their values.
    pub fn key_values(&self) -> &BTreeMap<PayloadKey, String> {
        &self.fields
    }

    /// File parts of a multipart upload, in request order.
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn envelope(&self) -> Option<&str> {
        self.get(PayloadKey::Envelope)
    }

    /// Raw RFC 822 message, present when the webhook posts raw MIME.
    pub fn email(&self) -> Option<&str> {
        self.get(PayloadKey::Email)
    }

    pub fn attachment_info(&self) -> Option<&str> {
        self.get(PayloadKey::AttachmentInfo)
    }

    pub fn attachment_count(&self) -> Option<&str> {
        self.get(PayloadKey::Attachments)
    }

    pub fn from(&self) -> Option<&str> {
        self.get(PayloadKey::From)
    }

    pub fn to(&self) -> Option<&str> {
        self.get(PayloadKey::To)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(PayloadKey::Subject)
    }

    pub fn headers(&self) -> Option<&str> {
        self.get(PayloadKey::Headers)
    }

    pub fn text(&self) -> Option<&str> {
        self.get(PayloadKey::Text)
    }

    pub fn html(&self) -> Option<&str> {
        self.get(PayloadKey::Html)
    }

    pub fn sender_ip(&self) -> Option<&str> {
        self.get(PayloadKey::SenderIp)
    }

    pub fn dkim(&self) -> Option<&str> {
        self.get(PayloadKey::Dkim)
    }

    pub fn spf(&self) -> Option<&str> {
        self.get(PayloadKey::Spf)
    }

    pub fn charsets(&self) -> Option<&str> {
        self.get(PayloadKey::Charsets)
    }

    pub fn content_ids(&self) -> Option<&str> {
        self.get(PayloadKey::ContentIds)
    }

    pub fn spam_report(&self) -> Option<&str> {
        self.get(PayloadKey::SpamReport)
    }

    pub fn spam_score(&self) -> Option<&str> {
        self.get(PayloadKey::SpamScore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for key in PayloadKey::ALL {
            assert_eq!(PayloadKey::from_field_name(key.as_str()), Some(key));
        }
        assert_eq!(PayloadKey::from_field_name("spf"), None);
        assert_eq!(PayloadKey::from_field_name("attachment1"), None);
    }

    #[test]
    fn test_unrecognized_fields_dropped() {
        let payload = InboundPayload::from_parts(
            [("subject", "Hi"), ("x-custom", "1"), ("SPF", "pass")],
            Vec::new(),
        );
        assert_eq!(payload.key_values().len(), 2);
        assert_eq!(payload.subject(), Some("Hi"));
        assert_eq!(payload.spf(), Some("pass"));
        assert!(!payload.contains(PayloadKey::Email));
    }

    #[test]
    fn test_first_value_wins() {
        let payload =
            InboundPayload::from_parts([("subject", "first"), ("subject", "second")], Vec::new());
        assert_eq!(payload.subject(), Some("first"));
    }
}
