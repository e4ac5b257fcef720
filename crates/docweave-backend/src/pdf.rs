//! PDF backend (pure Rust, lopdf)
//!
//! Text is extracted page by page and split into paragraphs at blank lines;
//! every paragraph records its page number. No layout analysis, OCR or table
//! recovery is attempted.

use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::{non_blank, parse_datetime, split_paragraphs};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result};
use lopdf::{Dictionary, Object};

/// PDF backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PdfBackend;

impl PdfBackend {
    /// Create a new PDF backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    /// The trailer's `/Info` dictionary, if any
    fn info_dict(doc: &lopdf::Document) -> Option<&Dictionary> {
        match doc.trailer.get(b"Info").ok()? {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// PDF text string: UTF-16BE with BOM, UTF-8, or Latin-1.
    fn decode_text_string(bytes: &[u8]) -> String {
        if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            return String::from_utf16_lossy(&units);
        }
        String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| char::from(b)).collect())
    }

    fn info_string(info: &Dictionary, key: &[u8]) -> Option<String> {
        match info.get(key).ok()? {
            Object::String(bytes, _) => non_blank(&Self::decode_text_string(bytes)),
            _ => None,
        }
    }

    /// `D:YYYYMMDDHHmmSS[Z|+HH'mm']` → UTC timestamp
    fn info_date(info: &Dictionary, key: &[u8]) -> Option<chrono::DateTime<chrono::Utc>> {
        let raw = Self::info_string(info, key)?;
        let digits: String = raw
            .trim_start_matches("D:")
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if digits.len() < 8 {
            return None;
        }
        let padded = format!("{digits:0<14}");
        let iso = format!(
            "{}-{}-{}T{}:{}:{}Z",
            &padded[0..4],
            &padded[4..6],
            &padded[6..8],
            &padded[8..10],
            &padded[10..12],
            &padded[12..14]
        );
        parse_datetime(&iso)
    }
}

impl DocumentBackend for PdfBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Pdf]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        input.data.starts_with(b"%PDF-")
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let doc = lopdf::Document::load_mem(input.data)
            .map_err(|e| DocweaveError::backend("Failed to load PDF", e))?;
        if doc.is_encrypted() {
            return Err(DocweaveError::ConversionError(
                "Encrypted PDF documents are not supported".to_string(),
            ));
        }

        let pages = doc.get_pages();
        let num_pages = pages.len();
        log::debug!("PDF with {num_pages} pages");

        let mut content = Vec::new();
        let mut failed_pages = Vec::new();
        for &page in pages.keys() {
            let page_no = page as usize;
            if !options.page_selected(page_no) {
                continue;
            }
            match doc.extract_text(&[page]) {
                Ok(text) => content.extend(
                    split_paragraphs(&text, options.preserve_whitespace)
                        .into_iter()
                        .map(|p| DocItem::paragraph(p).with_metadata("page", page_no)),
                ),
                Err(e) => {
                    log::warn!("Text extraction failed on page {page_no}: {e}");
                    failed_pages.push(page_no);
                }
            }
        }

        let mut metadata = DocumentMetadata::new(input.display_name(), InputFormat::Pdf);
        metadata.num_pages = Some(num_pages);
        if let Some(info) = Self::info_dict(&doc) {
            metadata = metadata
                .with_title(Self::info_string(info, b"Title"))
                .with_author(Self::info_string(info, b"Author"));
            metadata.description = Self::info_string(info, b"Subject");
            metadata.created = Self::info_date(info, b"CreationDate");
            metadata.modified = Self::info_date(info, b"ModDate");
            if let Some(producer) = Self::info_string(info, b"Producer") {
                metadata = metadata.with_extra("producer", producer);
            }
        }
        metadata = metadata.with_extra("pdf_version", doc.version.clone());

        let mut document = Document::new(metadata, content);
        for page in failed_pages {
            document.warn(format!("Could not extract text from page {page}"));
        }
        if document.is_empty() && num_pages > 0 {
            document.warn("No extractable text; the PDF may be scanned or image-only");
        }
        Ok(document)
    }
}
