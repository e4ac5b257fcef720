//! Archive entry extraction for docweave
//!
//! This crate opens ZIP containers held in memory and yields their file
//! entries one at a time, in archive order. It knows nothing about document
//! formats: the `ArchiveBackend` in `docweave-backend` feeds each entry back
//! into the converter.
//!
//! Entries are never written to disk. Directories are ignored; entries with
//! unsafe paths, encrypted entries and entries above [`MAX_FILE_SIZE`] are
//! reported as [`SkippedEntry`] values instead of failing the archive.
//!
//! # Usage
//!
//! ```no_run
//! use docweave_archive::zip::{extract_zip_streaming, ZipEntry};
//!
//! let bytes = std::fs::read("bundle.zip").unwrap();
//! extract_zip_streaming(&bytes, |entry| {
//!     match entry {
//!         ZipEntry::File(file) => println!("{} ({} bytes)", file.name, file.size),
//!         ZipEntry::Skipped(skipped) => println!("skipped {}: {}", skipped.name, skipped.reason),
//!     }
//!     Ok(())
//! })
//! .unwrap();
//! ```

pub mod error;
pub mod zip;

// =============================================================================
// Archive Constants
// =============================================================================

/// Maximum size for a single file within an archive (100 MB).
///
/// Larger entries are skipped during extraction.
pub const MAX_FILE_SIZE: u64 = 100_000_000;

/// Maximum nesting depth for recursive archive conversion.
///
/// A nested conversion requested at a deeper level is refused.
pub const MAX_NESTING_DEPTH: usize = 10;

// Re-export commonly used types
pub use error::ArchiveError;
pub use self::zip::{extract_zip_streaming, is_zip, ExtractedFile, SkipReason, SkippedEntry, ZipEntry};
