//! `inbound-drop` — an Inbound Parse webhook receiver for email attachments.
//!
//! This crate decodes the provider's callback (form uploads or a raw MIME
//! message), authorizes the envelope sender against a client table, keeps
//! only batches whose attachments all have allowed content types, and writes
//! them to per-client storage locations keyed by a timestamp.

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;
pub mod store;
pub mod validate;
pub mod webhook;
