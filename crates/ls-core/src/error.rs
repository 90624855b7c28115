//! # AppError
//!
//! Centralized error handling for the LinkSpace client.
//! Port implementations return `anyhow::Result`; services translate those
//! failures into one of these variants at the operation boundary.

use thiserror::Error;

/// The primary error type for all service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Profile for an identity)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Rejected before any network call (e.g., empty post, image too large)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Object store call failed
    #[error("upload failed: {0}")]
    UploadError(String),

    /// Record store write failed
    #[error("insert failed: {0}")]
    InsertError(String),

    /// Record store read failed
    #[error("fetch failed: {0}")]
    FetchError(String),

    /// Session missing, invalid or expired
    #[error("unauthorized: {0}")]
    AuthError(String),

    /// The owning view was torn down while the call was in flight
    #[error("operation cancelled")]
    Cancelled,

    /// Infrastructure failure outside the categories above
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(..))
    }
}

/// A specialized Result type for LinkSpace logic.
pub type Result<T> = std::result::Result<T, AppError>;
