//! Error types for document conversion operations.
//!
//! Every failure inside a backend is expressed as a [`DocweaveError`]. The
//! converter turns these into failed `ConversionResult`s, so callers of the
//! top-level API only ever see the error *message*; the variants exist for
//! code that drives backends directly.

use crate::format::InputFormat;
use thiserror::Error;

/// Error types that can occur during document conversion.
///
/// # Examples
///
/// ```rust
/// use docweave_core::{DocweaveError, InputFormat};
///
/// let err = DocweaveError::BackendMissing(InputFormat::Pdf);
/// assert_eq!(err.to_string(), "No backend available for format PDF");
/// ```
#[derive(Error, Debug)]
pub enum DocweaveError {
    /// Format detection failed or the format is excluded by the allow-list.
    #[error("{0}")]
    FormatError(String),

    /// The format was recognized but no backend is registered for it.
    #[error("No backend available for format {0}")]
    BackendMissing(InputFormat),

    /// The backend's cheap validity check rejected the input.
    #[error("Invalid {0} document")]
    ValidationError(InputFormat),

    /// General conversion error.
    ///
    /// Raised when the content cannot be structurally interpreted.
    #[error("Conversion error: {0}")]
    ConversionError(String),

    /// Backend-specific error (library failure, missing optional dependency).
    #[error("Backend error: {0}")]
    BackendError(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Parser error from format-specific parsers.
    #[error("Parser error: {0}")]
    ParserError(#[from] anyhow::Error),
}

impl DocweaveError {
    /// Shorthand for a [`DocweaveError::BackendError`] built from any displayable error.
    #[inline]
    #[must_use = "returns the constructed error"]
    pub fn backend(context: &str, err: impl std::fmt::Display) -> Self {
        Self::BackendError(format!("{context}: {err}"))
    }
}

/// Type alias for [`Result<T, DocweaveError>`].
pub type Result<T> = std::result::Result<T, DocweaveError>;
