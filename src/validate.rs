//! Sender validation: the only authorization gate of the public endpoint.

use crate::config::{ClientConfig, Config};
use crate::error::{DropError, Result};
use crate::model::envelope::{Envelope, SenderAddress};
use crate::model::payload::InboundPayload;

/// A sender that passed the allow-list, with its client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedSender<'a> {
    pub address: SenderAddress,
    pub client: &'a ClientConfig,
}

/// Check the envelope sender of a payload against the configured domain and
/// client table.
pub fn authorize<'a>(payload: &InboundPayload, config: &'a Config) -> Result<AuthorizedSender<'a>> {
    let raw = payload
        .envelope()
        .ok_or_else(|| DropError::InvalidEnvelope("missing envelope field".into()))?;
    let envelope = Envelope::parse(raw)?;
    validate_sender(&envelope, config)
}

/// Accept the sender only when its domain equals the configured domain and
/// its local-part names a configured client.
pub fn validate_sender<'a>(envelope: &Envelope, config: &'a Config) -> Result<AuthorizedSender<'a>> {
    let address = envelope.sender()?;

    if address.domain != config.inbound.email_domain {
        return Err(DropError::UnknownSender(envelope.from.clone()));
    }

    let client = config
        .client(&address.local_part)
        .ok_or_else(|| DropError::UnknownSender(envelope.from.clone()))?;

    Ok(AuthorizedSender { address, client })
}
