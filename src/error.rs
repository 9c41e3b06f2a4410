// SPDX-License-Identifier: MPL-2.0
use crate::status;
use std::fmt;

/// Errors a load can end with, as reported by a [`crate::loader::ResourceLoader`].
///
/// The binding layer never produces errors of its own; whatever the loader
/// reports is relayed to the caller untouched inside the completion outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Transport-level failure (connection refused, TLS, timeout, ...).
    Network(String),

    /// The server answered with a non-success HTTP status.
    Http { code: u16 },

    /// The response body could not be decoded as an image.
    Decode(String),

    /// Local I/O failure while handling the response.
    Io(String),

    /// The task's cancellation token was triggered before the fetch finished.
    Cancelled,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Network(msg) => write!(f, "Network error: {msg}"),
            LoadError::Http { code } => match status::reason_phrase(*code) {
                Some(phrase) => write!(f, "HTTP {code} {phrase}"),
                None => write!(f, "HTTP {code} ({:?})", status::categorize(*code)),
            },
            LoadError::Decode(msg) => write!(f, "Decode error: {msg}"),
            LoadError::Io(msg) => write!(f, "I/O error: {msg}"),
            LoadError::Cancelled => write!(f, "Load cancelled"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
