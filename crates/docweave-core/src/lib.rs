//! # docweave-core - Unified Document Model
//!
//! Shared types for the docweave conversion pipeline: the closed set of
//! [`InputFormat`]s, the format sniffer, the [`Document`] item tree every
//! backend produces, and the Markdown/JSON serializers that derive output
//! from it.
//!
//! ## Quick Start
//!
//! ```rust
//! use docweave_core::{sniff, DocItem, Document, DocumentMetadata, InputFormat};
//! use docweave_core::{JsonSerializer, MarkdownSerializer};
//!
//! let format = sniff::detect(b"a,b\n1,2\n", None);
//! assert_eq!(format, Some(InputFormat::Csv));
//!
//! let doc = Document::new(
//!     DocumentMetadata::new("notes.txt", InputFormat::Text),
//!     vec![DocItem::heading(1, "Notes"), DocItem::paragraph("Remember the milk.")],
//! );
//! assert_eq!(
//!     MarkdownSerializer::new().serialize(&doc),
//!     "# Notes\n\nRemember the milk."
//! );
//! let json = JsonSerializer::content_value(&doc)?;
//! assert_eq!(json[0]["type"], "heading");
//! # Ok::<(), docweave_core::DocweaveError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`mod@format`] - Input format identifiers and extension table
//! - [`sniff`] - Extension and content-signature detection
//! - [`content`] - Item tree (`DocItem`, tables, images, metadata values)
//! - [`document`] - `Document`, `DocumentMetadata`, `ConversionResult`
//! - [`serializer`] - Markdown and JSON serializers
//! - [`error`] - Error types and handling
//!
//! The converter that drives backends lives in the `docweave-backend` crate.

pub mod content;
pub mod document;
pub mod error;
pub mod format;
pub mod serializer;
pub mod sniff;

// Re-exports for convenience
pub use content::*;
pub use document::*;
pub use error::*;
pub use format::*;
pub use serializer::*;
