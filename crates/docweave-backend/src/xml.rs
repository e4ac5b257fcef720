//! Generic XML backend
//!
//! The document must be well-formed. Its text is kept verbatim in an `xml`
//! code block under a title naming the root element (or the root's `title`
//! child, when it has one).

use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::non_blank;
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result};
use roxmltree::ParsingOptions;

/// XML Document Backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct XmlBackend;

impl XmlBackend {
    /// Create a new XML backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentBackend for XmlBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Xml]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        input.text().trim_start().starts_with('<')
    }

    fn convert(&self, input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
        let text = input.text();
        let xml = roxmltree::Document::parse_with_options(
            &text,
            ParsingOptions {
                allow_dtd: true,
                ..ParsingOptions::default()
            },
        )
        .map_err(|e| DocweaveError::ConversionError(format!("Malformed XML: {e}")))?;

        let root = xml.root_element();
        let root_name = root.tag_name().name().to_string();
        let element_count = xml.descendants().filter(roxmltree::Node::is_element).count();
        let title = root
            .children()
            .find(|c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case("title"))
            .and_then(|t| t.text())
            .and_then(non_blank)
            .unwrap_or_else(|| root_name.clone());
        log::debug!("XML root <{root_name}> with {element_count} elements");

        let mut metadata = DocumentMetadata::new(input.display_name(), InputFormat::Xml)
            .with_title(Some(title.clone()))
            .with_extra("root_element", root_name)
            .with_extra("element_count", element_count);
        if let Some(namespace) = root.tag_name().namespace() {
            metadata = metadata.with_extra("namespace", namespace);
        }

        let content = vec![DocItem::title(title), DocItem::code(text.trim(), Some("xml"))];
        Ok(Document::new(metadata, content))
    }
}
