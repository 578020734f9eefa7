//! The webhook pipeline: validate, extract, classify, store, respond.
//!
//! Only an authorization failure changes the HTTP status. Every other
//! failure is logged and answered with `200 OK`, because the provider
//! re-delivers on anything else.

use crate::classify::classify;
use crate::config::Config;
use crate::error::DropError;
use crate::extract::extract_attachments;
use crate::model::attachment::Attachment;
use crate::parser::form::WebhookRequest;
use crate::store::{upload_batch, ObjectStore};
use crate::validate::authorize;

/// HTTP answer returned to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: &'static str,
}

impl WebhookResponse {
    pub const OK: Self = Self {
        status: 200,
        body: "OK",
    };
    pub const FORBIDDEN: Self = Self {
        status: 403,
        body: "",
    };
}

/// What happened to one request.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Every attachment was stored.
    Stored { sender: String, paths: Vec<String> },
    /// The request carried no attachments.
    NoAttachments { sender: String },
    /// At least one attachment had a disallowed type; nothing was stored.
    RejectedContentTypes {
        sender: String,
        rejected: Vec<Attachment>,
    },
    /// Attachments could not be extracted.
    ExtractionFailed { sender: String, error: DropError },
    /// Writing to storage failed; earlier objects of the batch may exist.
    StorageFailed { sender: String, error: DropError },
    /// The sender was not authorized. No storage was touched.
    Forbidden { error: DropError },
}

impl WebhookOutcome {
    pub fn response(&self) -> WebhookResponse {
        match self {
            Self::Forbidden { .. } => WebhookResponse::FORBIDDEN,
            _ => WebhookResponse::OK,
        }
    }
}

/// Process one webhook request end to end.
///
/// `timestamp` (seconds since the epoch) is shared by every object stored
/// for this request.
pub fn handle(
    request: &WebhookRequest,
    config: &Config,
    store: &dyn ObjectStore,
    timestamp: i64,
) -> WebhookOutcome {
    let payload = request.parse();

    let sender = match authorize(&payload, config) {
        Ok(sender) => sender,
        Err(error) => {
            tracing::error!(error = %error, "Refusing webhook");
            return WebhookOutcome::Forbidden { error };
        }
    };
    let sender_name = sender.address.to_string();

    let attachments = match extract_attachments(&payload) {
        Ok(attachments) => attachments,
        Err(error) => {
            tracing::error!(sender = %sender_name, error = %error, "Failed to extract attachments");
            return WebhookOutcome::ExtractionFailed {
                sender: sender_name,
                error,
            };
        }
    };

    if attachments.is_empty() {
        tracing::error!(sender = %sender_name, "No attachments from sender");
        return WebhookOutcome::NoAttachments {
            sender: sender_name,
        };
    }

    let batch = match classify(attachments, sender.client).approve() {
        Ok(batch) => batch,
        Err(rejected) => {
            for attachment in &rejected {
                tracing::error!(
                    sender = %sender_name,
                    file_name = %attachment.file_name,
                    content_type = %attachment.content_type,
                    "Attachment has wrong content type"
                );
            }
            return WebhookOutcome::RejectedContentTypes {
                sender: sender_name,
                rejected,
            };
        }
    };

    match upload_batch(
        store,
        &sender.client.storage_prefix,
        timestamp,
        &batch,
        config.storage.duplicate_names,
    ) {
        Ok(paths) => {
            tracing::info!(sender = %sender_name, count = paths.len(), "Stored attachments");
            WebhookOutcome::Stored {
                sender: sender_name,
                paths,
            }
        }
        Err(error) => {
            tracing::error!(sender = %sender_name, error = %error, "Failed to store attachments");
            WebhookOutcome::StorageFailed {
                sender: sender_name,
                error,
            }
        }
    }
}
