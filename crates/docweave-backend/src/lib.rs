//! Document format backends for docweave
//!
//! This crate turns raw bytes into the unified [`Document`] model defined in
//! `docweave-core`. Each format is handled by a backend implementing
//! [`DocumentBackend`]; the [`DocumentConverter`] detects the format of an
//! input, dispatches it to the registered backend and serializes the result.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         DocumentConverter                          │
//! │   (sniffs the format, checks the allow-list, isolates panics)      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       DocumentBackend Trait                         │
//! │  fn is_valid(&self, input: &BackendInput) -> bool                   │
//! │  fn convert(&self, input: &BackendInput, options) -> Result<Doc>    │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!        ┌───────────────────────────┼───────────────────────────┐
//!        ▼                           ▼                           ▼
//! ┌─────────────┐             ┌─────────────┐             ┌─────────────┐
//! │ DocxBackend │             │ HtmlBackend │             │ArchiveBackend│
//! │ (zip + xml) │             │ (scraper)   │             │ (recursive) │
//! └─────────────┘             └─────────────┘             └─────────────┘
//! ```
//!
//! # Supported Formats
//!
//! | Format | Backend | Description |
//! |--------|---------|-------------|
//! | PDF | `PdfBackend` | Page text via lopdf (feature `pdf`) |
//! | DOCX | [`DocxBackend`] | Word documents: headings, lists, tables, images |
//! | PPTX | [`PptxBackend`] | `PowerPoint` slides with tables and notes |
//! | XLSX | [`XlsxBackend`] | One table per worksheet |
//! | HTML | [`HtmlBackend`] | Semantic HTML, optional video transcripts |
//! | `BING_SERP` | [`BingSerpBackend`] | Bing search result pages |
//! | RSS/Atom | [`FeedBackend`] | Feed entries |
//! | XML | [`XmlBackend`] | Generic XML text |
//! | JSON | [`JsonBackend`] | Structured JSON data |
//! | CSV | [`CsvBackend`] | Comma-separated values |
//! | TEXT | [`TextBackend`] | Plain text paragraphs |
//! | SUBTITLE | [`SubtitleBackend`] | SRT and `WebVTT` cues |
//! | IPYNB | [`IpynbBackend`] | Jupyter notebooks |
//! | IMAGE | [`ImageBackend`] | Raster images, optional OCR |
//! | ZIP | `ArchiveBackend` | Recursive archive expansion (feature `archive`) |
//!
//! # Usage
//!
//! ```rust
//! use docweave_backend::DocumentConverter;
//!
//! let converter = DocumentConverter::new();
//! let result = converter.convert(b"# Notes\n\nBuy milk.".as_slice(), Some("notes.txt"));
//! assert!(result.is_success());
//! println!("{}", result.markdown_content.unwrap_or_default());
//! ```
//!
//! Backends can also be used directly:
//!
//! ```rust
//! use docweave_backend::{BackendInput, BackendOptions, CsvBackend, DocumentBackend};
//! use docweave_core::InputFormat;
//!
//! let input = BackendInput::new(b"a,b\n1,2\n", InputFormat::Csv);
//! let doc = CsvBackend::new().convert(&input, &BackendOptions::default())?;
//! assert_eq!(doc.content.len(), 1);
//! # Ok::<(), docweave_core::DocweaveError>(())
//! ```
//!
//! # Feature Flags
//!
//! - `pdf` (default) - PDF text extraction
//! - `archive` (default) - ZIP archive expansion
//!
//! [`Document`]: docweave_core::Document
//! [`DocumentBackend`]: traits::DocumentBackend

#[cfg(feature = "archive")]
pub mod archive;
pub mod bing;
pub mod converter;
pub mod csv;
pub mod docx;
pub mod feed;
pub mod html;
pub mod ipynb;
pub mod json;
mod office;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod pptx;
pub mod raster;
pub mod subtitle;
pub mod text;
pub mod traits;
pub mod utils;
pub mod xlsx;
pub mod xml;

#[cfg(feature = "archive")]
pub use archive::ArchiveBackend;
pub use bing::BingSerpBackend;
pub use converter::{ConverterConfig, DocumentConverter, Source};
pub use csv::CsvBackend;
pub use docx::DocxBackend;
pub use feed::FeedBackend;
pub use html::HtmlBackend;
pub use ipynb::IpynbBackend;
pub use json::JsonBackend;
#[cfg(feature = "pdf")]
pub use pdf::PdfBackend;
pub use pptx::PptxBackend;
pub use raster::ImageBackend;
pub use subtitle::SubtitleBackend;
pub use text::TextBackend;
pub use traits::*;
pub use xlsx::XlsxBackend;
pub use xml::XmlBackend;
