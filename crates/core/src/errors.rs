//! Core error types for the GoalPath application.
//!
//! This module defines storage-agnostic error types. Transport-specific errors
//! (from reqwest, PostgREST, etc.) are converted to these types by the storage layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the goal domain.
///
/// `Validation` and `NotAuthenticated` are raised before anything reaches the
/// remote store. `NotFound` and `Persistence` come back from (or are checked
/// against) the remote state.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Goal not found: {0}")]
    NotFound(String),

    #[error("Remote store operation failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Missing configuration key: {0}")]
    MissingConfigKey(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Transport-agnostic error type for remote store operations.
///
/// All details are carried as strings so the storage layer can convert
/// reqwest/serde errors into this format without leaking its types.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The service rejected the caller's credentials or row access.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The service answered with a non-success status.
    #[error("Rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Validation errors for user input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Field '{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        value: i64,
    },

    #[error("Cannot change status from '{from}' to '{to}'")]
    InvalidStatusTransition { from: String, to: String },
}

impl ValidationError {
    pub(crate) fn out_of_range(field: &str, min: i32, max: i32, value: i32) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            min: min.into(),
            max: max.into(),
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persistence(PersistenceError::Decode(err.to_string()))
    }
}
