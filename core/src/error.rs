//! Error types for the Gerrit accounts client.
//!
//! # Design
//! Both server-side failures carry the server-relative `path` that was hit,
//! so a failed `/accounts/jdoe/emails/...` call can be told apart from a failed
//! `/accounts/jdoe` lookup. A 404 becomes `NotFound { path }`; every other
//! non-2xx status becomes `Request { status, path, body }`. `status()` reads
//! the HTTP status off either one. Nothing is retried here.

use thiserror::Error;

/// Errors returned by `AccountsClient`, its transport and its parser.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404 for `path`.
    #[error("resource not found: {path}")]
    NotFound { path: String },

    /// The server returned a non-2xx status other than 404.
    #[error("request to {path} failed with HTTP {status}: {body}")]
    Request {
        status: u16,
        path: String,
        body: String,
    },

    /// The HTTP round-trip itself failed (connection refused, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body does not have the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An account or change identifier was empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(&'static str),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}
