//! Request decoding: webhook form bodies and raw MIME messages.

pub mod form;
pub mod mime;
