//! Storage-specific error types for the hosted REST backend.
//!
//! This module provides error types that wrap reqwest/serde errors and convert
//! them to the transport-agnostic error types defined in `goalpath_core`.

use goalpath_core::errors::{Error, PersistenceError};
use thiserror::Error;

/// Storage-specific errors.
///
/// These errors are internal to the storage layer and are converted to
/// `goalpath_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Service responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("No row matched {0}")]
    NoRows(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Request(e) if e.is_decode() => {
                Error::Persistence(PersistenceError::Decode(e.to_string()))
            }
            StorageError::Request(e) => {
                Error::Persistence(PersistenceError::Transport(e.to_string()))
            }
            StorageError::Status { status, message } if status == 401 || status == 403 => {
                Error::Persistence(PersistenceError::Unauthorized(message))
            }
            StorageError::Status { status, message } => {
                Error::Persistence(PersistenceError::Rejected { status, message })
            }
            StorageError::Decode(e) => Error::Persistence(PersistenceError::Decode(e.to_string())),
            StorageError::InvalidHeader(e) => Error::Unexpected(e),
            StorageError::NoRows(target) => Error::NotFound(target),
        }
    }
}

/// Error body returned by PostgREST and the auth API.
///
/// PostgREST uses `message`/`details`/`hint`/`code`; the auth API uses
/// `error`/`error_description` or `msg`.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ApiErrorResponse {
    /// Best human-readable message for a failed response body.
    pub(crate) fn describe(body: &str, status: u16) -> String {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(err) => {
                let message = err
                    .message
                    .or(err.error_description)
                    .or(err.msg)
                    .or(err.error);
                match (message, err.details, err.code) {
                    (Some(m), Some(d), _) => format!("{} ({})", m, d),
                    (Some(m), None, Some(c)) => format!("{} [{}]", m, c),
                    (Some(m), None, None) => m,
                    (None, _, _) => format!("HTTP {}", status),
                }
            }
            Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
            Err(_) => body.chars().take(200).collect(),
        }
    }
}
