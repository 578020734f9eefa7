//! Centralized error types for inbound-drop.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the inbound-drop library.
#[derive(Error, Debug)]
pub enum DropError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file exists but could not be read or parsed.
    #[error("Invalid configuration in '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    /// The `envelope` field is missing or is not valid envelope JSON.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// The envelope sender is not a `local@domain` address.
    #[error("Invalid sender address format: '{0}'")]
    InvalidSenderFormat(String),

    /// The sender domain or local-part is not on the allow-list.
    #[error("Unknown sender: {0}")]
    UnknownSender(String),

    /// An uploaded form file did not declare a content type.
    #[error("Attachment '{file_name}' has no content type")]
    MissingContentType { file_name: String },

    /// The raw `email` field could not be parsed as an RFC 822 message.
    #[error("Malformed raw message: {0}")]
    MalformedMessage(String),

    /// An object could not be written to storage.
    #[error("Storage error for '{path}': {reason}")]
    Storage { path: String, reason: String },
}

/// Convenience alias for `Result<T, DropError>`.
pub type Result<T> = std::result::Result<T, DropError>;

impl DropError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Storage` variant for an object path.
    pub fn storage(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` for errors that mean the sender could not be authorized.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidEnvelope(_) | Self::InvalidSenderFormat(_) | Self::UnknownSender(_)
        )
    }
}
