//! Document converter: format detection and backend dispatch
//!
//! [`DocumentConverter`] owns the backend registry. A conversion sniffs the
//! input format, checks it against the allow-list, looks up the backend,
//! runs its validity check and then its `convert`. Every failure (including a
//! backend panic) ends up as a failed [`ConversionResult`] carrying one error
//! message; successful documents are serialized to JSON and Markdown once.
//!
//! ```rust,no_run
//! use docweave_backend::{DocumentConverter, Source};
//!
//! let converter = DocumentConverter::new();
//! let result = converter.convert(Source::Path("report.docx".into()), None);
//! if let Some(markdown) = &result.markdown_content {
//!     println!("{markdown}");
//! }
//! ```

use crate::bing::BingSerpBackend;
use crate::csv::CsvBackend;
use crate::docx::DocxBackend;
use crate::feed::FeedBackend;
use crate::html::HtmlBackend;
use crate::ipynb::IpynbBackend;
use crate::json::JsonBackend;
use crate::pptx::PptxBackend;
use crate::raster::ImageBackend;
use crate::subtitle::SubtitleBackend;
use crate::text::TextBackend;
use crate::traits::{BackendInput, BackendOptions, DocumentBackend, OcrEngine, TranscriptFetcher};
use crate::xlsx::XlsxBackend;
use crate::xml::XmlBackend;
use docweave_core::{
    sniff, ConversionResult, Document, DocweaveError, InputFormat, JsonSerializer,
    MarkdownSerializer, Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Instant;

#[cfg(feature = "archive")]
use crate::archive::ArchiveBackend;
#[cfg(feature = "pdf")]
use crate::pdf::PdfBackend;
#[cfg(feature = "archive")]
use docweave_archive::MAX_NESTING_DEPTH;

/// Input to a conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file on disk; its extension takes part in detection
    Path(PathBuf),
    /// Raw bytes already in memory
    Bytes(Vec<u8>),
}

impl From<PathBuf> for Source {
    #[inline]
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Source {
    #[inline]
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for Source {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Source {
    #[inline]
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Converter configuration
///
/// The allow-list and default options can be loaded from JSON; the OCR engine
/// and transcript fetcher are attached in code.
///
/// ```rust
/// use docweave_backend::ConverterConfig;
/// use docweave_core::InputFormat;
///
/// let config: ConverterConfig = serde_json::from_str(
///     r#"{"allowed_formats": ["PDF", "DOCX"], "default_options": {"extract_images": true}}"#,
/// )
/// .unwrap();
/// let allowed = config.allowed_formats.as_ref().unwrap();
/// assert!(allowed.contains(&InputFormat::Docx));
/// assert!(config.default_options.extract_images);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Formats the converter accepts; `None` allows every format
    #[serde(default)]
    pub allowed_formats: Option<HashSet<InputFormat>>,

    /// Options used when a call does not supply its own
    #[serde(default)]
    pub default_options: BackendOptions,

    /// Text recognition for image input
    #[serde(skip)]
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Transcript source for video pages
    #[serde(skip)]
    pub transcript_fetcher: Option<Arc<dyn TranscriptFetcher>>,
}

impl ConverterConfig {
    /// Restrict the converter to `formats`
    #[must_use = "returns the config with the allow-list set"]
    pub fn with_allowed_formats(mut self, formats: impl IntoIterator<Item = InputFormat>) -> Self {
        self.allowed_formats = Some(formats.into_iter().collect());
        self
    }

    /// Set the default backend options
    #[inline]
    #[must_use = "returns the config with default options set"]
    pub fn with_default_options(mut self, options: BackendOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Attach an OCR engine
    #[inline]
    #[must_use = "returns the config with an OCR engine attached"]
    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    /// Attach a transcript fetcher
    #[inline]
    #[must_use = "returns the config with a transcript fetcher attached"]
    pub fn with_transcript_fetcher(mut self, fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        self.transcript_fetcher = Some(fetcher);
        self
    }
}

type BackendRegistry = HashMap<InputFormat, Arc<dyn DocumentBackend>>;

/// Format-detecting document converter
///
/// Always handed out as `Arc<DocumentConverter>`: the archive backend keeps a
/// weak reference back to it for nested conversions. The converter is
/// `Send + Sync`; concurrent conversions share nothing but the registry.
#[derive(Debug)]
pub struct DocumentConverter {
    backends: RwLock<BackendRegistry>,
    allowed_formats: HashSet<InputFormat>,
    default_options: BackendOptions,
}

impl DocumentConverter {
    /// Create a converter with every built-in backend and no restrictions
    #[must_use = "creating a converter that is not used is a waste of resources"]
    pub fn new() -> Arc<Self> {
        Self::with_config(ConverterConfig::default())
    }

    /// Create a converter from `config`
    #[must_use = "creating a converter that is not used is a waste of resources"]
    pub fn with_config(config: ConverterConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            let backends = Self::default_backends(&config, weak.clone());
            Self {
                backends: RwLock::new(backends),
                allowed_formats: config
                    .allowed_formats
                    .unwrap_or_else(|| InputFormat::ALL.into_iter().collect()),
                default_options: config.default_options,
            }
        })
    }

    #[cfg_attr(not(feature = "archive"), allow(unused_variables, unused_mut))]
    fn default_backends(config: &ConverterConfig, converter: Weak<Self>) -> BackendRegistry {
        let mut html = HtmlBackend::new();
        if let Some(fetcher) = &config.transcript_fetcher {
            html = html.with_transcript_fetcher(Arc::clone(fetcher));
        }
        let mut image = ImageBackend::new();
        if let Some(engine) = &config.ocr_engine {
            image = image.with_ocr_engine(Arc::clone(engine));
        }

        let mut backends: Vec<Arc<dyn DocumentBackend>> = vec![
            Arc::new(TextBackend::new()),
            Arc::new(CsvBackend::new()),
            Arc::new(JsonBackend::new()),
            Arc::new(IpynbBackend::new()),
            Arc::new(SubtitleBackend::new()),
            Arc::new(html),
            Arc::new(BingSerpBackend::new()),
            Arc::new(FeedBackend::new()),
            Arc::new(XmlBackend::new()),
            Arc::new(DocxBackend::new()),
            Arc::new(PptxBackend::new()),
            Arc::new(XlsxBackend::new()),
            Arc::new(image),
        ];
        #[cfg(feature = "pdf")]
        backends.push(Arc::new(PdfBackend::new()));
        #[cfg(feature = "archive")]
        backends.push(Arc::new(ArchiveBackend::new(converter)));

        let mut registry = BackendRegistry::new();
        for backend in backends {
            for format in backend.formats() {
                registry.insert(*format, Arc::clone(&backend));
            }
        }
        registry
    }

    /// Replace (or add) the backend for `format`
    pub fn set_backend(&self, format: InputFormat, backend: Arc<dyn DocumentBackend>) {
        debug!("Registering {backend:?} for {format}");
        self.backends
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(format, backend);
    }

    /// Backend registered for `format`
    #[must_use = "returns the registered backend, if any"]
    pub fn backend_for(&self, format: InputFormat) -> Option<Arc<dyn DocumentBackend>> {
        self.backends
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&format)
            .cloned()
    }

    /// Formats this converter accepts
    #[inline]
    #[must_use = "returns the allow-list"]
    pub const fn allowed_formats(&self) -> &HashSet<InputFormat> {
        &self.allowed_formats
    }

    /// Options used by [`convert`](Self::convert)
    #[inline]
    #[must_use = "returns the default options"]
    pub const fn default_options(&self) -> &BackendOptions {
        &self.default_options
    }

    /// Convert `source` with the default options
    ///
    /// `filename` (if given) drives extension-based detection and names the
    /// document; for [`Source::Path`] the path is used when it is absent.
    #[must_use = "conversion result contains the converted document and should be processed"]
    pub fn convert(&self, source: impl Into<Source>, filename: Option<&str>) -> ConversionResult {
        self.convert_with_options(source, filename, &self.default_options)
    }

    /// Convert `source` with explicit options
    #[must_use = "conversion result contains the converted document and should be processed"]
    pub fn convert_with_options(
        &self,
        source: impl Into<Source>,
        filename: Option<&str>,
        options: &BackendOptions,
    ) -> ConversionResult {
        let start = Instant::now();
        let document = match self.document_from_source(source.into(), filename, options) {
            Ok(document) => document,
            Err(e) => {
                warn!("Conversion failed: {e}");
                return ConversionResult::failure(e.to_string(), Vec::new(), start.elapsed());
            }
        };

        let json_content = match JsonSerializer::content_value(&document) {
            Ok(value) => value,
            Err(e) => return ConversionResult::failure(e.to_string(), Vec::new(), start.elapsed()),
        };
        let markdown = MarkdownSerializer::new().serialize(&document);
        let latency = start.elapsed();
        info!(
            "Converted {} ({}) in {latency:?}: {} items, {} warnings",
            document.metadata.filename,
            document.metadata.format,
            document.item_count(),
            document.warnings.len()
        );
        ConversionResult::success(document, json_content, markdown, latency)
    }

    /// Convert `source` and render it as Markdown (metadata not included)
    ///
    /// # Errors
    /// Returns the conversion error if the document cannot be converted.
    pub fn convert_to_markdown(&self, source: impl Into<Source>, filename: Option<&str>) -> Result<String> {
        let document = self.document_from_source(source.into(), filename, &self.default_options)?;
        Ok(MarkdownSerializer::new().serialize(&document))
    }

    /// Convert `source` and render its content array as a JSON string
    ///
    /// # Errors
    /// Returns the conversion error if the document cannot be converted.
    pub fn convert_to_json(&self, source: impl Into<Source>, filename: Option<&str>) -> Result<String> {
        let document = self.document_from_source(source.into(), filename, &self.default_options)?;
        Ok(serde_json::to_string(&JsonSerializer::content_value(&document)?)?)
    }

    /// Convert one archive entry at nesting `depth`
    ///
    /// Used by the archive backend. Unlike [`convert`](Self::convert) this
    /// returns the document itself, warnings included.
    ///
    /// # Errors
    /// Fails like a top-level conversion, and additionally when `depth`
    /// exceeds the nesting limit.
    #[cfg(feature = "archive")]
    pub fn convert_nested(
        &self,
        data: &[u8],
        filename: &str,
        depth: usize,
        options: &BackendOptions,
    ) -> Result<Document> {
        if depth > MAX_NESTING_DEPTH {
            return Err(DocweaveError::ConversionError(format!(
                "Archive nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}"
            )));
        }
        self.convert_document(data, Some(filename), None, depth, options)
    }

    fn document_from_source(
        &self,
        source: Source,
        filename: Option<&str>,
        options: &BackendOptions,
    ) -> Result<Document> {
        match source {
            Source::Bytes(bytes) => self.convert_document(&bytes, filename, None, 0, options),
            Source::Path(path) => {
                let bytes = std::fs::read(&path)?;
                let name = filename
                    .map(Cow::Borrowed)
                    .or_else(|| path.file_name().map(|n| n.to_string_lossy()));
                self.convert_document(&bytes, name.as_deref(), Some(&path), 0, options)
            }
        }
    }

    fn convert_document(
        &self,
        data: &[u8],
        filename: Option<&str>,
        path: Option<&Path>,
        depth: usize,
        options: &BackendOptions,
    ) -> Result<Document> {
        let format = sniff::detect_source(data, filename, path).ok_or_else(|| {
            DocweaveError::FormatError("Unable to detect document format".to_string())
        })?;
        if !self.allowed_formats.contains(&format) {
            return Err(DocweaveError::FormatError(format!(
                "Format {format} is not allowed"
            )));
        }
        let backend = self
            .backend_for(format)
            .ok_or(DocweaveError::BackendMissing(format))?;
        debug!(
            "Dispatching {} ({format}, {} bytes, depth {depth}) to {backend:?}",
            filename.unwrap_or("<bytes>"),
            data.len()
        );

        let input = BackendInput::new(data, format)
            .with_filename(filename)
            .with_depth(depth);
        Self::run_backend(backend.as_ref(), &input, options)
    }

    /// Validate and convert, turning a backend panic into an error
    fn run_backend(
        backend: &dyn DocumentBackend,
        input: &BackendInput<'_>,
        options: &BackendOptions,
    ) -> Result<Document> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            if backend.is_valid(input) {
                backend.convert(input, options)
            } else {
                Err(DocweaveError::ValidationError(input.format))
            }
        }));
        outcome.unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("{} backend panicked: {message}", input.format);
            Err(DocweaveError::BackendError(format!(
                "{} backend panicked: {message}",
                input.format
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_core::{ConversionStatus, DocItem, DocumentMetadata};

    #[derive(Debug)]
    struct PanickingBackend;

    impl DocumentBackend for PanickingBackend {
        fn formats(&self) -> &'static [InputFormat] {
            &[InputFormat::Text]
        }

        fn is_valid(&self, _input: &BackendInput<'_>) -> bool {
            true
        }

        fn convert(&self, _input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
            panic!("parser exploded");
        }
    }

    #[derive(Debug)]
    struct UpperBackend;

    impl DocumentBackend for UpperBackend {
        fn formats(&self) -> &'static [InputFormat] {
            &[InputFormat::Text]
        }

        fn is_valid(&self, _input: &BackendInput<'_>) -> bool {
            true
        }

        fn convert(&self, input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
            Ok(Document::new(
                DocumentMetadata::new(input.display_name(), input.format),
                vec![DocItem::paragraph(input.text().to_uppercase())],
            ))
        }
    }

    #[test]
    fn test_every_format_has_a_backend() {
        let converter = DocumentConverter::new();
        for format in InputFormat::ALL {
            #[cfg(not(feature = "pdf"))]
            if format == InputFormat::Pdf {
                continue;
            }
            #[cfg(not(feature = "archive"))]
            if format == InputFormat::Zip {
                continue;
            }
            let backend = converter.backend_for(format);
            assert!(backend.is_some(), "no backend for {format}");
            assert!(backend.is_some_and(|b| b.supports_format(format)));
        }
    }

    #[test]
    fn test_text_success_result() {
        let converter = DocumentConverter::new();
        let result = converter.convert(b"Hello\n\nWorld".as_slice(), Some("a.txt"));
        assert_eq!(result.status, ConversionStatus::Success);
        assert_eq!(result.markdown_content.as_deref(), Some("Hello\n\nWorld"));
        assert_eq!(
            result.json_content,
            Some(serde_json::json!([
                {"type": "paragraph", "text": "Hello"},
                {"type": "paragraph", "text": "World"}
            ]))
        );
    }

    #[test]
    fn test_undetectable_input() {
        let converter = DocumentConverter::new();
        let result = converter.convert(vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x13], None);
        assert_eq!(result.status, ConversionStatus::Failure);
        assert_eq!(result.errors, ["Unable to detect document format"]);
    }

    #[test]
    fn test_panic_becomes_failure() {
        let converter = DocumentConverter::new();
        converter.set_backend(InputFormat::Text, Arc::new(PanickingBackend));
        let result = converter.convert(b"text".as_slice(), Some("a.txt"));
        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.errors[0].contains("parser exploded"), "{:?}", result.errors);
    }

    #[test]
    fn test_set_backend_replaces_entry() {
        let converter = DocumentConverter::new();
        converter.set_backend(InputFormat::Text, Arc::new(UpperBackend));
        let markdown = converter
            .convert_to_markdown(b"quiet".as_slice(), Some("a.txt"))
            .unwrap();
        assert_eq!(markdown, "QUIET");
    }

    #[test]
    fn test_convert_to_json_is_content_array() {
        let converter = DocumentConverter::new();
        let json = converter
            .convert_to_json(b"a,b\n1,2\n".as_slice(), Some("t.csv"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["type"], "table");
        assert_eq!(value[0]["num_rows"], 2);
    }
}
