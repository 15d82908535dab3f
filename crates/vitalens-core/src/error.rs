//! Unified error handling for vitalens-core
//!
//! Every gateway operation surfaces exactly one [`Error`] variant. The
//! presentation layer maps each one to a message with [`Error::user_message`].

use serde::Serialize;
use thiserror::Error;

use crate::gateway::transport::TransportError;
use crate::store::StoreError;

/// Payload-free classification of an [`Error`]
///
/// Kept in observable session state, which must stay cheap to clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    InvalidResponse,
    Http,
    Decoding,
    Network,
    Unauthorized,
    InvalidFile,
    Validation,
    Store,
}

/// Core error type for vitalens-core
#[derive(Error, Debug)]
pub enum Error {
    /// URL could not be built; nothing was sent
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport succeeded but the response could not be used
    #[error("Invalid response from server")]
    InvalidResponse,

    /// Server rejected the request
    #[error("HTTP {status_code}: {message}")]
    Http { status_code: u16, message: String },

    /// Body did not match the expected schema
    #[error("Failed to decode response: {0}")]
    Decoding(String),

    /// No response was received
    #[error("Network error: {0}")]
    Network(#[source] TransportError),

    /// Credential missing locally or rejected by a resource endpoint
    #[error("Unauthorized")]
    Unauthorized,

    /// Local file validation failed before upload
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// Form input rejected before any call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential store failed while persisting or erasing a credential
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for vitalens-core
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid URL error
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Error::InvalidUrl(msg.into())
    }

    /// Create an invalid file error
    pub fn invalid_file(msg: impl Into<String>) -> Self {
        Error::InvalidFile(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a decoding error
    pub fn decoding(msg: impl Into<String>) -> Self {
        Error::Decoding(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Error::InvalidResponse => ErrorKind::InvalidResponse,
            Error::Http { .. } => ErrorKind::Http,
            Error::Decoding(_) => ErrorKind::Decoding,
            Error::Network(_) => ErrorKind::Network,
            Error::Unauthorized => ErrorKind::Unauthorized,
            Error::InvalidFile(_) => ErrorKind::InvalidFile,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Store(_) => ErrorKind::Store,
        }
    }

    /// HTTP status code, for errors the server produced
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidUrl(_) => "Invalid URL".to_string(),
            Error::InvalidResponse => "Invalid response from server".to_string(),
            Error::Http { message, .. } => message.clone(),
            Error::Decoding(_) => "Failed to decode response".to_string(),
            Error::Network(cause) => cause.to_string(),
            Error::Unauthorized => "Unauthorized. Please login again.".to_string(),
            Error::InvalidFile(_) => "Invalid file selected".to_string(),
            Error::Validation(message) => message.clone(),
            Error::Store(_) => "Failed to access secure storage".to_string(),
        }
    }
}

// Convert to String for presentation layers that only carry text
impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.user_message()
    }
}
