//! Raster image backend (PNG, JPEG, TIFF, GIF, BMP, WebP)
//!
//! Only the header is decoded to learn the dimensions. The image item takes
//! its alt text from the file name and carries the raw bytes when
//! `extract_images` is set. Text recognition is delegated to an injected
//! [`OcrEngine`]; without one the document carries a warning instead.

use crate::traits::{BackendInput, BackendOptions, DocumentBackend, OcrEngine};
use crate::utils::paragraph_items;
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, ImageItem, InputFormat, Result};
use image::ImageReader;
use std::io::Cursor;
use std::sync::Arc;

/// Image backend with optional OCR
#[derive(Debug, Clone, Default)]
pub struct ImageBackend {
    ocr_engine: Option<Arc<dyn OcrEngine>>,
}

impl ImageBackend {
    /// Create a new image backend instance without OCR
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self { ocr_engine: None }
    }

    /// Use `engine` to recognize text in images
    #[inline]
    #[must_use = "returns the backend with an OCR engine attached"]
    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    /// Alt text from the file name: `team_photo-2024.png` → `team photo 2024`
    fn alt_text(input: &BackendInput<'_>) -> Option<String> {
        let stem = input.file_stem()?;
        let alt = stem
            .split(['_', '-'])
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!alt.is_empty()).then_some(alt)
    }
}

impl DocumentBackend for ImageBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Image]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        ImageReader::new(Cursor::new(input.data))
            .with_guessed_format()
            .is_ok_and(|reader| reader.format().is_some())
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let reader = ImageReader::new(Cursor::new(input.data)).with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            DocweaveError::ConversionError("Unrecognized image encoding".to_string())
        })?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| DocweaveError::backend("Failed to decode image", e))?;
        let mime_type = format.to_mime_type();
        log::debug!("Image {format:?} {width}x{height}");

        let mut warnings = Vec::new();
        let ocr_text = match (&self.ocr_engine, options.ocr_languages.is_empty()) {
            (_, true) => None,
            (Some(engine), false) => match engine.recognize(input.data, &options.ocr_languages) {
                Ok(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
                Err(e) => {
                    log::warn!("OCR failed: {e}");
                    warnings.push(format!("OCR failed: {e}"));
                    None
                }
            },
            (None, false) => {
                log::warn!("No OCR engine configured; image text not extracted");
                warnings.push("OCR engine not configured; image text was not extracted".to_string());
                None
            }
        };

        let mut image = ImageItem {
            src: input.filename.map(ToString::to_string),
            alt: Self::alt_text(input),
            width: Some(width),
            height: Some(height),
            data: options.extract_images.then(|| input.data.to_vec()),
            text: ocr_text.clone(),
            ..ImageItem::default()
        };
        image
            .metadata
            .insert("mime_type".to_string(), mime_type.into());

        let mut content = vec![DocItem::Image(image)];
        if let Some(text) = &ocr_text {
            content.extend(paragraph_items(text, options.preserve_whitespace));
        }

        let metadata = DocumentMetadata::new(input.display_name(), InputFormat::Image)
            .with_title(input.file_stem())
            .with_extra("width", i64::from(width))
            .with_extra("height", i64::from(height))
            .with_extra("mime_type", mime_type);

        let mut doc = Document::new(metadata, content);
        for warning in warnings {
            doc.warn(warning);
        }
        Ok(doc)
    }
}
