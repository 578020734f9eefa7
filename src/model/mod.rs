//! Core data model types: inbound payload, envelope, and attachments.

pub mod attachment;
pub mod envelope;
pub mod payload;
