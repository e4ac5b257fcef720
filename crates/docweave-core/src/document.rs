//! Core document types
//!
//! This module defines the `Document` produced by every backend, its
//! metadata, and the `ConversionResult` the converter hands back to callers.

use crate::content::{DocItem, Metadata, MetadataValue};
use crate::error::Result;
use crate::format::InputFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Document metadata containing information about the source document.
///
/// `filename` and `format` are always present; everything else is optional
/// because not all formats carry it. Format-specific keys go into `extra`,
/// which is flattened into the serialized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source file name (or a synthetic one for anonymous byte input)
    pub filename: String,

    /// Detected input format
    pub format: InputFormat,

    /// Document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Document author(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Number of pages (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<usize>,

    /// Creation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<chrono::DateTime<chrono::Utc>>,

    /// Last modified date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<chrono::DateTime<chrono::Utc>>,

    /// Language (ISO 639-1 code where known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Document subject/description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Format-specific extension fields
    #[serde(default, flatten)]
    pub extra: Metadata,
}

impl DocumentMetadata {
    /// Creates metadata with only the mandatory fields set.
    #[inline]
    #[must_use = "creates new document metadata"]
    pub fn new(filename: impl Into<String>, format: InputFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            title: None,
            author: None,
            num_pages: None,
            created: None,
            modified: None,
            language: None,
            description: None,
            extra: Metadata::new(),
        }
    }

    /// Sets the title; blank titles are ignored.
    #[inline]
    #[must_use = "returns metadata with title set"]
    pub fn with_title(mut self, title: Option<impl Into<String>>) -> Self {
        self.title = title.map(Into::into).filter(|t: &String| !t.trim().is_empty());
        self
    }

    /// Sets the author; blank authors are ignored.
    #[inline]
    #[must_use = "returns metadata with author set"]
    pub fn with_author(mut self, author: Option<impl Into<String>>) -> Self {
        self.author = author.map(Into::into).filter(|a: &String| !a.trim().is_empty());
        self
    }

    /// Inserts an `extra` entry.
    #[inline]
    #[must_use = "returns metadata with the extra entry set"]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A converted document: metadata plus the ordered item tree.
///
/// # Examples
///
/// ```rust
/// use docweave_core::{DocItem, Document, DocumentMetadata, InputFormat};
///
/// let doc = Document::new(
///     DocumentMetadata::new("notes.txt", InputFormat::Text),
///     vec![DocItem::paragraph("Hello")],
/// );
/// assert_eq!(doc.content.len(), 1);
/// assert!(doc.warnings.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata
    pub metadata: DocumentMetadata,

    /// Top-level content items in reading order
    pub content: Vec<DocItem>,

    /// Non-fatal diagnostics raised while converting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Document {
    /// Creates a document without warnings.
    #[inline]
    #[must_use = "creates a new document"]
    pub const fn new(metadata: DocumentMetadata, content: Vec<DocItem>) -> Self {
        Self {
            metadata,
            content,
            warnings: Vec::new(),
        }
    }

    /// Appends a warning.
    #[inline]
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Returns `true` if the document has no content items.
    #[inline]
    #[must_use = "returns whether the document is empty"]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of items in the tree, nested children included.
    #[must_use = "returns the total item count"]
    pub fn item_count(&self) -> usize {
        let mut count = 0;
        for item in &self.content {
            item.walk(&mut |_| count += 1);
        }
        count
    }
}

/// Outcome of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    /// The document was converted
    Success,
    /// The conversion failed; see `errors`
    Failure,
}

impl std::fmt::Display for ConversionStatus {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Result of one top-level conversion.
///
/// Built once by the converter and never mutated afterwards. On success the
/// document and both serializations are present; on failure only `errors`
/// (and possibly `warnings`) are populated.
///
/// # Examples
///
/// ```rust
/// use docweave_core::{ConversionResult, ConversionStatus};
/// use std::time::Duration;
///
/// let result = ConversionResult::failure(
///     "Unable to detect document format",
///     Vec::new(),
///     Duration::from_millis(1),
/// );
/// assert_eq!(result.status, ConversionStatus::Failure);
/// assert!(!result.is_success());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    /// Success or failure
    pub status: ConversionStatus,
    /// The converted document (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    /// The document content array as JSON (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_content: Option<serde_json::Value>,
    /// Markdown rendering without frontmatter (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_content: Option<String>,
    /// Error messages (failure only)
    pub errors: Vec<String>,
    /// Non-fatal diagnostics
    pub warnings: Vec<String>,
    /// Time taken to perform the conversion
    #[serde(skip)]
    pub latency: Duration,
}

impl ConversionResult {
    /// Builds a successful result; the document's warnings move into the result.
    #[must_use = "creates a successful conversion result"]
    pub fn success(
        mut document: Document,
        json_content: serde_json::Value,
        markdown_content: String,
        latency: Duration,
    ) -> Self {
        let warnings = std::mem::take(&mut document.warnings);
        Self {
            status: ConversionStatus::Success,
            document: Some(document),
            json_content: Some(json_content),
            markdown_content: Some(markdown_content),
            errors: Vec::new(),
            warnings,
            latency,
        }
    }

    /// Builds a failed result carrying one error message.
    #[must_use = "creates a failed conversion result"]
    pub fn failure(error: impl Into<String>, warnings: Vec<String>, latency: Duration) -> Self {
        Self {
            status: ConversionStatus::Failure,
            document: None,
            json_content: None,
            markdown_content: None,
            errors: vec![error.into()],
            warnings,
            latency,
        }
    }

    /// Returns `true` on success.
    #[inline]
    #[must_use = "returns whether the conversion succeeded"]
    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }

    /// First error message, if any.
    #[inline]
    #[must_use = "returns the first error message if present"]
    pub fn error_message(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// Save the markdown output to a file.
    ///
    /// Writes nothing and returns `Ok(false)` when the conversion failed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_markdown<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        match &self.markdown_content {
            Some(markdown) => {
                std::fs::write(path, markdown)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Save the JSON content array to a file (pretty-printed).
    ///
    /// Writes nothing and returns `Ok(false)` when the conversion failed.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        match &self.json_content {
            Some(json) => {
                std::fs::write(path, serde_json::to_string_pretty(json)?)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_extra_is_flattened() {
        let meta = DocumentMetadata::new("a.zip", InputFormat::Zip)
            .with_title(Some("a.zip"))
            .with_extra("entry_count", 3_usize);
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            json!({"filename": "a.zip", "format": "ZIP", "title": "a.zip", "entry_count": 3})
        );
        let back: DocumentMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_blank_title_ignored() {
        let meta = DocumentMetadata::new("x", InputFormat::Text).with_title(Some("   "));
        assert_eq!(meta.title, None);
        let meta = DocumentMetadata::new("x", InputFormat::Text).with_author(None::<String>);
        assert_eq!(meta.author, None);
    }

    #[test]
    fn test_success_moves_warnings() {
        let mut doc = Document::new(
            DocumentMetadata::new("a.txt", InputFormat::Text),
            vec![DocItem::paragraph("x")],
        );
        doc.warn("something odd");
        let result = ConversionResult::success(doc, json!([]), String::new(), Duration::ZERO);
        assert!(result.is_success());
        assert_eq!(result.warnings, vec!["something odd".to_string()]);
        assert!(result.document.as_ref().unwrap().warnings.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_failure_has_single_error() {
        let result = ConversionResult::failure("Invalid PDF document", vec![], Duration::ZERO);
        assert_eq!(result.status, ConversionStatus::Failure);
        assert_eq!(result.error_message(), Some("Invalid PDF document"));
        assert!(result.document.is_none());
        assert!(result.markdown_content.is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(ConversionStatus::Success).unwrap(),
            json!("success")
        );
        assert_eq!(ConversionStatus::Failure.to_string(), "failure");
    }

    #[test]
    fn test_item_count_includes_children() {
        let doc = Document::new(
            DocumentMetadata::new("a", InputFormat::Html),
            vec![
                DocItem::heading(1, "h"),
                DocItem::list(false, vec![DocItem::list_item("a"), DocItem::list_item("b")]),
            ],
        );
        assert_eq!(doc.item_count(), 4);
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_save_skips_failed_results() {
        let dir = std::env::temp_dir().join("docweave-core-save-test.md");
        let result = ConversionResult::failure("x", vec![], Duration::ZERO);
        assert!(!result.save_markdown(&dir).unwrap());
        assert!(!result.save_json(&dir).unwrap());
    }
}
