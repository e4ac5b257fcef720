//! Core trait definitions for document backends

// Clippy pedantic allows:
// - BackendOptions uses multiple bool flags for feature toggles
#![allow(clippy::struct_excessive_bools)]

use docweave_core::{Document, InputFormat, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Options for backend processing
///
/// Every backend receives the same options value and ignores the keys that
/// are not meaningful to it. The struct deserializes from JSON with every
/// field optional:
///
/// ```rust
/// use docweave_backend::BackendOptions;
///
/// let opts: BackendOptions =
///     serde_json::from_str(r#"{"page_range": [2, 3], "ocr_languages": ["deu"]}"#).unwrap();
/// assert_eq!(opts.page_range, Some((2, 3)));
/// assert!(opts.extract_tables);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    /// Embed raw image bytes in image items
    pub extract_images: bool,

    /// Emit table items (when false, table-producing backends skip tables)
    pub extract_tables: bool,

    /// Record inline formatting (bold/italic/...) on text items
    pub extract_formatting: bool,

    /// Languages passed to the OCR engine (Tesseract-style codes)
    pub ocr_languages: Vec<String>,

    /// Inclusive 1-based page range for paged formats (None = all)
    pub page_range: Option<(usize, usize)>,

    /// Base URL used to resolve relative links and image sources in HTML
    pub base_url: Option<String>,

    /// Keep whitespace of plain text verbatim instead of normalizing it
    pub preserve_whitespace: bool,

    /// Fetch a transcript for video pages (requires a transcript fetcher)
    pub enable_transcript: bool,

    /// Preferred transcript language
    pub transcript_language: Option<String>,

    /// Original URL of the document, when it was fetched from the web
    pub url: Option<String>,
}

impl Default for BackendOptions {
    #[inline]
    fn default() -> Self {
        Self {
            extract_images: false,
            extract_tables: true,
            extract_formatting: true,
            ocr_languages: vec!["eng".to_string()],
            page_range: None,
            base_url: None,
            preserve_whitespace: false,
            enable_transcript: false,
            transcript_language: None,
            url: None,
        }
    }
}

impl BackendOptions {
    /// Create options with image extraction
    #[inline]
    #[must_use = "returns options with image extraction setting configured"]
    pub const fn with_images(mut self, enable: bool) -> Self {
        self.extract_images = enable;
        self
    }

    /// Create options with table extraction
    #[inline]
    #[must_use = "returns options with table extraction setting configured"]
    pub const fn with_tables(mut self, enable: bool) -> Self {
        self.extract_tables = enable;
        self
    }

    /// Create options with formatting extraction
    #[inline]
    #[must_use = "returns options with formatting setting configured"]
    pub const fn with_formatting(mut self, enable: bool) -> Self {
        self.extract_formatting = enable;
        self
    }

    /// Set OCR languages
    #[inline]
    #[must_use = "returns options with OCR languages configured"]
    pub fn with_ocr_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ocr_languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict paged formats to an inclusive 1-based page range
    #[inline]
    #[must_use = "returns options with page range configured"]
    pub const fn with_page_range(mut self, range: Option<(usize, usize)>) -> Self {
        self.page_range = range;
        self
    }

    /// Set the base URL for resolving relative references
    #[inline]
    #[must_use = "returns options with base URL configured"]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Keep plain-text whitespace verbatim
    #[inline]
    #[must_use = "returns options with whitespace setting configured"]
    pub const fn with_preserve_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_whitespace = preserve;
        self
    }

    /// Request a transcript for video pages, optionally in a given language
    #[inline]
    #[must_use = "returns options with transcript setting configured"]
    pub fn with_transcript(mut self, enable: bool, language: Option<&str>) -> Self {
        self.enable_transcript = enable;
        self.transcript_language = language.map(ToString::to_string);
        self
    }

    /// Set the original URL of the document
    #[inline]
    #[must_use = "returns options with URL configured"]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Whether 1-based `page` falls inside the configured page range.
    #[inline]
    #[must_use = "returns whether the page is selected"]
    pub const fn page_selected(&self, page: usize) -> bool {
        match self.page_range {
            Some((first, last)) => page >= first && page <= last,
            None => true,
        }
    }
}

/// Raw input handed to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendInput<'a> {
    /// Document bytes
    pub data: &'a [u8],
    /// Original file name (or archive entry path)
    pub filename: Option<&'a str>,
    /// Format the dispatcher resolved for this input
    pub format: InputFormat,
    /// Archive nesting depth (0 for top-level conversions)
    pub depth: usize,
}

impl<'a> BackendInput<'a> {
    /// Create a top-level input without a file name
    #[inline]
    #[must_use = "creates a new backend input"]
    pub const fn new(data: &'a [u8], format: InputFormat) -> Self {
        Self {
            data,
            filename: None,
            format,
            depth: 0,
        }
    }

    /// Attach a file name
    #[inline]
    #[must_use = "returns input with file name set"]
    pub const fn with_filename(mut self, filename: Option<&'a str>) -> Self {
        self.filename = filename;
        self
    }

    /// Set the nesting depth
    #[inline]
    #[must_use = "returns input with depth set"]
    pub const fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// File name for metadata, synthesized from the format when absent.
    #[must_use = "returns the display file name"]
    pub fn display_name(&self) -> String {
        match self.filename {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                let ext = self.format.extensions().first().copied().unwrap_or("html");
                format!("document.{ext}")
            }
        }
    }

    /// File name without directories and extension.
    #[must_use = "returns the file stem"]
    pub fn file_stem(&self) -> Option<&'a str> {
        let name = self.filename?;
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
        (!stem.is_empty()).then_some(stem)
    }

    /// Input decoded as UTF-8 (lossy), with a leading BOM removed.
    #[must_use = "returns the decoded text"]
    pub fn text(&self) -> Cow<'a, str> {
        let data = self.data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(self.data);
        String::from_utf8_lossy(data)
    }
}

/// Main trait for document backends
///
/// Each backend (PDF, DOCX, etc.) implements this trait. Backends are
/// immutable after construction and hold no per-conversion state, so a single
/// instance serves concurrent conversions.
pub trait DocumentBackend: Send + Sync + std::fmt::Debug {
    /// Formats this backend handles
    fn formats(&self) -> &'static [InputFormat];

    /// Check if this backend can handle the given format
    fn supports_format(&self, format: InputFormat) -> bool {
        self.formats().contains(&format)
    }

    /// Cheap structural check. Must not fail or mutate anything.
    fn is_valid(&self, input: &BackendInput<'_>) -> bool;

    /// Convert the input into a document
    ///
    /// # Errors
    /// Returns an error carrying a human-readable message if the content
    /// cannot be interpreted.
    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document>;
}

/// Optical character recognition engine
///
/// No engine ships with this crate; callers plug one in through
/// `ConverterConfig::ocr_engine`.
pub trait OcrEngine: Send + Sync + std::fmt::Debug {
    /// Recognize the text in an encoded image
    ///
    /// # Errors
    /// Returns an error if recognition fails.
    fn recognize(&self, image: &[u8], languages: &[String]) -> Result<String>;
}

/// One transcript segment of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start offset in seconds
    pub start: f64,
    /// Segment duration in seconds
    pub duration: f64,
    /// Spoken text
    pub text: String,
}

/// Source of video transcripts
pub trait TranscriptFetcher: Send + Sync + std::fmt::Debug {
    /// Fetch the transcript of `video_id`, preferring `language`
    ///
    /// # Errors
    /// Returns an error if no transcript is available.
    fn fetch(&self, video_id: &str, language: Option<&str>) -> Result<Vec<TranscriptSegment>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_core::{DocItem, DocumentMetadata};

    #[test]
    fn test_backend_options_default() {
        let opts = BackendOptions::default();
        assert!(!opts.extract_images);
        assert!(opts.extract_tables);
        assert!(opts.extract_formatting);
        assert_eq!(opts.ocr_languages, vec!["eng".to_string()]);
        assert!(opts.page_range.is_none());
        assert!(!opts.enable_transcript);
    }

    #[test]
    fn test_backend_options_chaining() {
        let opts = BackendOptions::default()
            .with_images(true)
            .with_tables(false)
            .with_page_range(Some((2, 4)))
            .with_ocr_languages(["deu", "fra"])
            .with_transcript(true, Some("de"))
            .with_base_url("https://example.com/docs/");

        assert!(opts.extract_images);
        assert!(!opts.extract_tables);
        assert_eq!(opts.page_range, Some((2, 4)));
        assert_eq!(opts.ocr_languages, vec!["deu", "fra"]);
        assert_eq!(opts.transcript_language.as_deref(), Some("de"));
        assert_eq!(opts.base_url.as_deref(), Some("https://example.com/docs/"));
    }

    #[test]
    fn test_backend_options_from_empty_json() {
        let opts: BackendOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, BackendOptions::default());
    }

    #[test]
    fn test_page_selected() {
        let all = BackendOptions::default();
        assert!(all.page_selected(1));
        assert!(all.page_selected(999));

        let range = BackendOptions::default().with_page_range(Some((2, 3)));
        assert!(!range.page_selected(1));
        assert!(range.page_selected(2));
        assert!(range.page_selected(3));
        assert!(!range.page_selected(4));
    }

    #[test]
    fn test_backend_input_names() {
        let input = BackendInput::new(b"x", InputFormat::Csv).with_filename(Some("data/sales.2024.csv"));
        assert_eq!(input.display_name(), "data/sales.2024.csv");
        assert_eq!(input.file_stem(), Some("sales.2024"));

        let anonymous = BackendInput::new(b"x", InputFormat::Xlsx);
        assert_eq!(anonymous.display_name(), "document.xlsx");
        assert_eq!(anonymous.file_stem(), None);

        let serp = BackendInput::new(b"x", InputFormat::BingSerp);
        assert_eq!(serp.display_name(), "document.html");
    }

    #[test]
    fn test_backend_input_text_strips_bom() {
        let input = BackendInput::new(b"\xef\xbb\xbfhello", InputFormat::Text);
        assert_eq!(input.text(), "hello");
    }

    // Mock backend for testing DocumentBackend trait
    #[derive(Debug)]
    struct MockBackend;

    impl DocumentBackend for MockBackend {
        fn formats(&self) -> &'static [InputFormat] {
            &[InputFormat::Rss, InputFormat::Atom]
        }

        fn is_valid(&self, input: &BackendInput<'_>) -> bool {
            !input.data.is_empty()
        }

        fn convert(&self, input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
            Ok(Document::new(
                DocumentMetadata::new(input.display_name(), input.format),
                vec![DocItem::paragraph("Mock document")],
            ))
        }
    }

    #[test]
    fn test_supports_format() {
        let backend = MockBackend;
        assert!(backend.supports_format(InputFormat::Rss));
        assert!(backend.supports_format(InputFormat::Atom));
        assert!(!backend.supports_format(InputFormat::Html));
    }

    #[test]
    fn test_trait_object_dispatch() {
        let backend: std::sync::Arc<dyn DocumentBackend> = std::sync::Arc::new(MockBackend);
        let input = BackendInput::new(b"<rss/>", InputFormat::Rss);
        assert!(backend.is_valid(&input));
        let doc = backend.convert(&input, &BackendOptions::default()).unwrap();
        assert_eq!(doc.metadata.filename, "document.rss");
        assert_eq!(doc.content.len(), 1);
    }

    #[test]
    fn test_document_backend_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn DocumentBackend>();
        assert_send_sync::<dyn OcrEngine>();
        assert_send_sync::<dyn TranscriptFetcher>();
    }
}
