//! Error type definitions for the order menu service

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// User-facing validation failures, raised before any state changes
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Image fetch or decode failures
    #[error("Image load error: {0}")]
    Load(#[from] LoadError),

    /// Compressor input could not be decoded or re-encoded
    #[error("Image decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Remote store failures that escaped the repository boundary
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Local storage I/O failures
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Persisted state could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failure to fetch or decode an image through the platform loader.
///
/// Cloneable because every caller attached to a shared in-flight load
/// observes the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load image {url}: {message}")]
pub struct LoadError {
    pub url: String,
    pub message: String,
}

impl LoadError {
    pub fn new<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Image compressor failures
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not a recognizable image
    #[error("Input is not a decodable image: {0}")]
    Image(#[from] image::ImageError),

    /// Data URL was malformed
    #[error("Invalid data URL: {message}")]
    InvalidDataUrl { message: String },

    /// Base64 section of a data URL could not be decoded
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Blocking compression task was cancelled or panicked
    #[error("Compression task failed: {message}")]
    Task { message: String },
}

/// Remote store specific errors
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport failure talking to the remote store
    #[error("Request failed: {operation} - {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// Remote store answered with a non-success status
    #[error("Remote store rejected {operation}: {status} - {message}")]
    Status {
        operation: String,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected row shape
    #[error("Unexpected response for {operation}: {message}")]
    InvalidResponse { operation: String, message: String },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error is caused by user input rather than the system
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. } | AppError::NotFound { .. } | AppError::Decode(_)
        )
    }
}

impl RemoteError {
    pub fn transport<O: Into<String>>(operation: O, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    pub fn status<O: Into<String>, M: Into<String>>(operation: O, status: u16, message: M) -> Self {
        Self::Status {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::InvalidResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
