//! ZIP archive extraction
//!
//! Works on archives held in memory. Entries are visited in central-directory
//! order, which is the order the archive expander emits them in.

use crate::error::ArchiveError;
use crate::MAX_FILE_SIZE;
use ::zip::ZipArchive;
use log::{debug, warn};
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// Local file header signature.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Returns `true` if `bytes` starts with a ZIP local file header.
#[inline]
#[must_use = "returns whether the bytes look like a ZIP archive"]
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Validate an entry name, rejecting anything that could escape the archive
/// root (`..` components, absolute paths, drive prefixes).
///
/// `.` components are dropped. Returns `None` for unsafe or empty paths.
#[inline]
fn safe_entry_path(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!path.as_os_str().is_empty()).then_some(path)
}

/// A file extracted from a ZIP archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ExtractedFile {
    /// Entry name, `/`-separated, relative to the archive root
    pub name: String,
    /// Entry path
    pub path: PathBuf,
    /// Uncompressed size in bytes
    pub size: usize,
    /// File contents
    pub contents: Vec<u8>,
}

/// Why an entry was not extracted
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SkipReason {
    /// Name contains `..` or is absolute
    UnsafePath,
    /// Entry is password-protected
    Encrypted,
    /// Entry exceeds [`MAX_FILE_SIZE`]
    TooLarge {
        /// Declared or observed size in bytes
        size: u64,
    },
    /// Entry data could not be decompressed
    Unreadable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsafePath => write!(f, "unsafe path"),
            Self::Encrypted => write!(f, "entry is encrypted"),
            Self::TooLarge { size } => {
                write!(f, "entry is too large ({size} bytes, max {MAX_FILE_SIZE} bytes)")
            }
            Self::Unreadable(msg) => write!(f, "entry could not be read: {msg}"),
        }
    }
}

/// An entry that was not extracted
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SkippedEntry {
    /// Entry name as stored in the archive
    pub name: String,
    /// Reason the entry was skipped
    pub reason: SkipReason,
}

/// One non-directory entry, in archive order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZipEntry {
    /// Extracted file
    File(ExtractedFile),
    /// Entry that was skipped
    Skipped(SkippedEntry),
}

fn open(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, ArchiveError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Visit every non-directory entry of an in-memory ZIP archive, one at a time.
///
/// Opening the container is all-or-nothing: a corrupt central directory fails
/// before `processor` sees any entry. After that, per-entry problems are
/// reported as [`ZipEntry::Skipped`] and extraction continues.
///
/// # Errors
///
/// Returns `ArchiveError` if the archive cannot be opened, or propagates
/// errors from the processor callback.
pub fn extract_zip_streaming<F>(bytes: &[u8], mut processor: F) -> Result<(), ArchiveError>
where
    F: FnMut(ZipEntry) -> Result<(), ArchiveError>,
{
    let mut archive = open(bytes)?;
    debug!("Opened ZIP archive with {} entries", archive.len());

    for i in 0..archive.len() {
        // Inspect the header without decrypting or decompressing.
        let (raw_name, declared_size, is_dir, encrypted) = {
            let header = archive.by_index_raw(i)?;
            (
                header.name().to_string(),
                header.size(),
                header.is_dir(),
                header.encrypted(),
            )
        };

        if is_dir {
            continue;
        }

        let skip = |reason: SkipReason| {
            warn!("Skipping archive entry {raw_name}: {reason}");
            ZipEntry::Skipped(SkippedEntry {
                name: raw_name.clone(),
                reason,
            })
        };

        let Some(path) = safe_entry_path(&raw_name) else {
            processor(skip(SkipReason::UnsafePath))?;
            continue;
        };
        if encrypted {
            processor(skip(SkipReason::Encrypted))?;
            continue;
        }
        if declared_size > MAX_FILE_SIZE {
            processor(skip(SkipReason::TooLarge {
                size: declared_size,
            }))?;
            continue;
        }

        let contents = match read_entry(&mut archive, i) {
            Ok(contents) => contents,
            Err(reason) => {
                processor(skip(reason))?;
                continue;
            }
        };

        let name = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        processor(ZipEntry::File(ExtractedFile {
            name,
            path,
            size: contents.len(),
            contents,
        }))?;
    }

    Ok(())
}

/// Read one entry, bounded by [`MAX_FILE_SIZE`] regardless of the declared size.
fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, index: usize) -> Result<Vec<u8>, SkipReason> {
    let file = archive
        .by_index(index)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let mut contents = Vec::new();
    file.take(MAX_FILE_SIZE + 1)
        .read_to_end(&mut contents)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let size = contents.len() as u64;
    if size > MAX_FILE_SIZE {
        return Err(SkipReason::TooLarge { size });
    }
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::zip::write::{SimpleFileOptions, ZipWriter};
    use std::io::Write;

    /// Helper: build a ZIP in memory from `(name, contents)` pairs
    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.add_directory("subdir/", options).unwrap();
        for (name, contents) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_is_zip() {
        assert!(is_zip(b"PK\x03\x04rest"));
        assert!(!is_zip(b"PK\x05\x06"));
        assert!(!is_zip(b""));
    }

    #[test]
    fn test_safe_entry_path() {
        assert_eq!(safe_entry_path("a/b.txt"), Some(PathBuf::from("a/b.txt")));
        assert_eq!(safe_entry_path("./a.txt"), Some(PathBuf::from("a.txt")));
        assert_eq!(safe_entry_path("../etc/passwd"), None);
        assert_eq!(safe_entry_path("a/../../b"), None);
        assert_eq!(safe_entry_path("/abs.txt"), None);
        assert_eq!(safe_entry_path(""), None);
    }

    #[test]
    fn test_extract_in_archive_order() {
        let bytes = build_zip(&[
            ("file1.txt", b"Hello from file 1"),
            ("subdir/file3.txt", b"Hello from subdirectory"),
            ("file2.txt", b"Hello from file 2"),
        ]);
        let mut files = Vec::new();
        extract_zip_streaming(&bytes, |entry| {
            if let ZipEntry::File(file) = entry {
                files.push(file);
            }
            Ok(())
        })
        .expect("Failed to extract ZIP");

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["file1.txt", "subdir/file3.txt", "file2.txt"]);
        assert_eq!(files[0].contents, b"Hello from file 1");
        assert_eq!(files[0].size, 17);
    }

    #[test]
    fn test_unsafe_paths_reported_as_skipped() {
        let bytes = build_zip(&[("../evil.txt", b"x"), ("ok.txt", b"y")]);
        let mut entries = Vec::new();
        extract_zip_streaming(&bytes, |entry| {
            entries.push(entry);
            Ok(())
        })
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(matches!(
            &entries[0],
            ZipEntry::Skipped(SkippedEntry { reason: SkipReason::UnsafePath, .. })
        ));
        assert!(matches!(&entries[1], ZipEntry::File(f) if f.name == "ok.txt"));
    }

    #[test]
    fn test_corrupt_container_fails_before_entries() {
        let mut seen = 0;
        let result = extract_zip_streaming(b"PK\x03\x04 definitely not a zip", |_| {
            seen += 1;
            Ok(())
        });
        assert!(matches!(result, Err(ArchiveError::InvalidZip(_))));
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_processor_error_stops_extraction() {
        let bytes = build_zip(&[("a.txt", b"1"), ("b.txt", b"2")]);
        let mut seen = 0;
        let result = extract_zip_streaming(&bytes, |_| {
            seen += 1;
            Err(ArchiveError::Other("stop".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::Encrypted.to_string(), "entry is encrypted");
        assert!(SkipReason::TooLarge { size: 200_000_000 }
            .to_string()
            .contains("200000000 bytes"));
    }
}
