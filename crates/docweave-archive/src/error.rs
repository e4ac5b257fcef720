//! Error types for archive operations

use thiserror::Error;

/// Errors that can occur during archive operations
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The container itself could not be opened (bad central directory, not a ZIP)
    #[error("Invalid ZIP archive: {0}")]
    InvalidZip(#[from] ::zip::result::ZipError),

    /// The entry processor aborted extraction
    #[error("Archive error: {0}")]
    Other(String),
}
