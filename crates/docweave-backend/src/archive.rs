//! ZIP archive backend
//!
//! Expands an archive entry by entry, in archive order. Every file entry gets
//! a level-2 heading with its path and is converted through the owning
//! [`DocumentConverter`]; the nested document's items are spliced in after the
//! heading. Entries that cannot be converted fall back to a code block (small
//! text-like files) or a `[Binary file: N bytes]` placeholder, so one bad entry
//! never fails the whole archive.
//!
//! The backend holds only a [`Weak`] reference to its converter: the converter
//! owns the backend registry, and the registry owns this backend.

use crate::converter::DocumentConverter;
use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::{extension_of, is_text_like};
use docweave_archive::{extract_zip_streaming, is_zip, ExtractedFile, ZipEntry, MAX_NESTING_DEPTH};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result};
use log::{debug, warn};
use std::sync::{Arc, Weak};

/// Text-like entries up to this size are inlined when they cannot be converted.
pub const MAX_INLINE_TEXT_SIZE: usize = 64 * 1024;

/// Archive backend for ZIP files
#[derive(Debug, Clone, Default)]
pub struct ArchiveBackend {
    converter: Weak<DocumentConverter>,
}

impl ArchiveBackend {
    /// Create an archive backend that converts entries through `converter`
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new(converter: Weak<DocumentConverter>) -> Self {
        Self { converter }
    }

    /// Fence language for an inlined entry
    fn code_language(name: &str) -> Option<&'static str> {
        Some(match extension_of(name)?.as_str() {
            "md" => "markdown",
            "csv" => "csv",
            "json" => "json",
            "xml" => "xml",
            "html" | "htm" => "html",
            "yaml" | "yml" => "yaml",
            "ini" | "cfg" => "ini",
            "toml" => "toml",
            "py" => "python",
            "rs" => "rust",
            "js" => "javascript",
            "ts" => "typescript",
            "sh" => "bash",
            _ => return None,
        })
    }

    /// Item for an entry that could not be converted
    fn fallback_item(file: &ExtractedFile) -> DocItem {
        if is_text_like(&file.name) && file.contents.len() < MAX_INLINE_TEXT_SIZE {
            let text = String::from_utf8_lossy(&file.contents);
            return DocItem::code(text.trim_end(), Self::code_language(&file.name));
        }
        warn!(
            "Entry {} could not be converted, emitting placeholder ({} bytes)",
            file.name, file.size
        );
        DocItem::paragraph(format!("[Binary file: {} bytes]", file.contents.len()))
    }

    fn convert_entry(
        converter: Option<&Arc<DocumentConverter>>,
        file: &ExtractedFile,
        depth: usize,
        options: &BackendOptions,
        content: &mut Vec<DocItem>,
        warnings: &mut Vec<String>,
    ) {
        content.push(DocItem::heading(2, file.name.clone()));
        let Some(converter) = converter else {
            content.push(Self::fallback_item(file));
            return;
        };
        match converter.convert_nested(&file.contents, &file.name, depth, options) {
            Ok(nested) => {
                content.extend(nested.content);
                warnings.extend(
                    nested
                        .warnings
                        .into_iter()
                        .map(|w| format!("{}: {w}", file.name)),
                );
            }
            Err(e) => {
                debug!("Nested conversion of {} failed: {e}", file.name);
                content.push(Self::fallback_item(file));
            }
        }
    }
}

impl DocumentBackend for ArchiveBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Zip]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        is_zip(input.data)
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        if input.depth > MAX_NESTING_DEPTH {
            return Err(DocweaveError::ConversionError(format!(
                "Archive nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}"
            )));
        }
        let converter = self.converter.upgrade();
        if converter.is_none() {
            warn!("Archive backend has no converter; entries will not be converted");
        }

        let mut content = Vec::new();
        let mut warnings = Vec::new();
        let mut entry_count = 0usize;
        let mut skipped_count = 0usize;

        extract_zip_streaming(input.data, |entry| {
            match entry {
                ZipEntry::File(file) => {
                    entry_count += 1;
                    Self::convert_entry(
                        converter.as_ref(),
                        &file,
                        input.depth + 1,
                        options,
                        &mut content,
                        &mut warnings,
                    );
                }
                ZipEntry::Skipped(skipped) => {
                    skipped_count += 1;
                    warn!("Skipping archive entry {}: {}", skipped.name, skipped.reason);
                    warnings.push(format!("Skipped {}: {}", skipped.name, skipped.reason));
                }
            }
            Ok(())
        })
        .map_err(|e| DocweaveError::backend("Failed to read ZIP archive", e))?;
        debug!(
            "Archive {} expanded: {entry_count} entries, {skipped_count} skipped, depth {}",
            input.display_name(),
            input.depth
        );

        let name = input.display_name();
        let metadata = DocumentMetadata::new(name.clone(), InputFormat::Zip)
            .with_title(Some(name))
            .with_extra("entry_count", entry_count)
            .with_extra("skipped_count", skipped_count);
        let mut doc = Document::new(metadata, content);
        if converter.is_none() && entry_count > 0 {
            doc.warn("No converter attached; archive entries were not converted");
        }
        for warning in warnings {
            doc.warn(warning);
        }
        Ok(doc)
    }
}
