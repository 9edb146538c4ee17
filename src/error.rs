//! Error handling for the browser engine
//!
//! This module provides idiomatic Rust error types using thiserror. Errors
//! never cross the engine boundary as panics: every failed operation is
//! terminal for that one operation, reported as a message, and leaves the
//! previously committed state usable.

use thiserror::Error;

/// Main error type for the browser engine
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Network/HTTP/JSON failure while loading the service catalog
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Catalog loaded but yielded zero usable entity sets
    #[error("service catalog contains no usable entity sets")]
    EmptyCatalog,

    /// Network/HTTP/JSON failure while loading a navigated resource
    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// Failure reported by the authenticated fetch collaborator
///
/// Carries the HTTP status when one was received; transport-level failures
/// (DNS, timeout, malformed JSON before a status was known) leave it unset.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct FetchFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl FetchFailure {
    /// A failure with no associated HTTP status
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// A failure carrying the HTTP status that produced it
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}
