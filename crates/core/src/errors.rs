//! Core error types for the bookkeeping engine.
//!
//! This module defines storage-agnostic error types. Adapter-specific errors
//! (from whatever backs the repositories) are converted to these types by the
//! storage layer.

use chrono::ParseError as ChronoParseError;
use std::num::ParseFloatError;
use thiserror::Error;

use crate::distributed::ScheduleError;
use crate::vouchers::VoucherError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the bookkeeping engine.
///
/// Storage-specific errors are wrapped in string form to keep this type
/// adapter-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Voucher error: {0}")]
    Voucher(#[from] VoucherError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Storage-agnostic error type for repository operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert backend-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A repository query failed to execute.
    #[error("Storage query failed: {0}")]
    QueryFailed(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Internal/unexpected storage error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Failed to parse number: {0}")]
    NumberParse(#[from] ParseFloatError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
