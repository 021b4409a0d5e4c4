//! Error types for the image compressor.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use thiserror::Error;
use serde::Serialize;

/// Validation errors for intake batches and quality settings.
#[derive(Error, Debug, Serialize)]
pub enum ValidationError {
    /// The picked/dropped batch contained no image files
    #[error("No image files in selection")]
    NoImageInput,
    /// Invalid quality or settings value
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Main error type for the compressor.
///
/// All errors in the crate are converted to this type before being
/// returned to the host.
#[derive(Error, Debug, Serialize)]
pub enum CompressorError {
    /// Batch or settings validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Image decoding failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// JPEG re-encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Archive construction failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Archive capability could not be loaded
    #[error("Capability error: {0}")]
    Capability(String),

    /// Host-side IO failed (download trigger)
    #[error("IO error: {0}")]
    Io(String),

    /// No record with the given id exists in the registry
    #[error("Unknown record: {0}")]
    UnknownRecord(String),

    /// A freshly generated id collided with an existing record
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),
}

/// Convenience result type for compressor operations.
pub type CompressorResult<T> = Result<T, CompressorError>;

// Helper methods for error creation
impl CompressorError {
    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn archive<T: Into<String>>(msg: T) -> Self {
        Self::Archive(msg.into())
    }

    pub fn capability<T: Into<String>>(msg: T) -> Self {
        Self::Capability(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::Io(msg.into())
    }

    pub fn unknown_record(id: impl std::fmt::Display) -> Self {
        Self::UnknownRecord(id.to_string())
    }
}

impl ValidationError {
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}
