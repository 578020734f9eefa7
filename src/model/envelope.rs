//! SMTP envelope parsing.
//!
//! The provider delivers the envelope as a JSON object in the `envelope`
//! field, e.g. `{"to":["drop@parse.example.com"],"from":"client1@parse.example.com"}`.

use serde::Deserialize;

use crate::error::{DropError, Result};

/// Transport-level sender and recipients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    /// Envelope sender (`MAIL FROM`).
    pub from: String,
    /// Envelope recipients (`RCPT TO`).
    #[serde(default)]
    pub to: Vec<String>,
}

impl Envelope {
    /// Parse the JSON value of the `envelope` field.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| DropError::InvalidEnvelope(e.to_string()))
    }

    /// Split the sender into local-part and domain.
    pub fn sender(&self) -> Result<SenderAddress> {
        SenderAddress::parse(&self.from)
    }
}

/// A `local@domain` address split at its single `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderAddress {
    /// Portion before `@`.
    pub local_part: String,
    /// Portion after `@`.
    pub domain: String,
}

impl SenderAddress {
    /// Parse a bare address. Exactly one `@` with text on both sides is
    /// required.
    ///
    /// # Examples
    /// - `"client1@parse.example.com"` → `local_part = "client1"`, `domain = "parse.example.com"`
    /// - `"client1"`, `"a@b@c"`, `"@b"` → `InvalidSenderFormat`
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let mut pieces = trimmed.split('@');
        match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self {
                    local_part: local.to_string(),
                    domain: domain.to_string(),
                })
            }
            _ => Err(DropError::InvalidSenderFormat(raw.to_string())),
        }
    }
}

impl std::fmt::Display for SenderAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let env = Envelope::parse(r#"{"to":["drop@parse.neustar.com"],"from":"client1@parse.neustar.com"}"#)
            .unwrap();
        assert_eq!(env.from, "client1@parse.neustar.com");
        assert_eq!(env.to, vec!["drop@parse.neustar.com".to_string()]);
    }

    #[test]
    fn test_parse_envelope_without_to() {
        let env = Envelope::parse(r#"{"from":"a@b.com"}"#).unwrap();
        assert!(env.to.is_empty());
    }

    #[test]
    fn test_parse_envelope_missing_from() {
        let err = Envelope::parse(r#"{"to":["x@y.com"]}"#).unwrap_err();
        assert!(matches!(err, DropError::InvalidEnvelope(_)));
    }

    #[test]
    fn test_parse_envelope_not_json() {
        assert!(matches!(
            Envelope::parse("from=a@b.com"),
            Err(DropError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_sender_split() {
        let addr = SenderAddress::parse("client1@parse.neustar.com").unwrap();
        assert_eq!(addr.local_part, "client1");
        assert_eq!(addr.domain, "parse.neustar.com");
        assert_eq!(addr.to_string(), "client1@parse.neustar.com");
    }

    #[test]
    fn test_sender_malformed() {
        for raw in ["client1", "a@b@c.com", "@parse.neustar.com", "client1@", ""] {
            assert!(
                matches!(SenderAddress::parse(raw), Err(DropError::InvalidSenderFormat(_))),
                "expected InvalidSenderFormat for {raw:?}"
            );
        }
    }
}
