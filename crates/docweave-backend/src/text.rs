//! Plain text backend
//!
//! Blank lines separate paragraphs. Markdown files are treated as plain text:
//! a leading `# ` line becomes the title, nothing else is interpreted.

use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::paragraph_items;
use docweave_core::{Document, DocumentMetadata, InputFormat, Result};

/// Plain text backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextBackend;

impl TextBackend {
    /// Create a new text backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    fn leading_title(text: &str) -> Option<&str> {
        let first = text.lines().find(|line| !line.trim().is_empty())?;
        first
            .trim()
            .strip_prefix("# ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl DocumentBackend for TextBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Text]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        !input.data.contains(&0)
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let text = input.text();
        let content = paragraph_items(&text, options.preserve_whitespace);
        log::debug!("Text input split into {} paragraphs", content.len());

        let metadata = DocumentMetadata::new(input.display_name(), InputFormat::Text)
            .with_title(Self::leading_title(&text))
            .with_extra("num_characters", text.chars().count());
        Ok(Document::new(metadata, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_core::DocItem;

    fn convert(text: &str, options: &BackendOptions) -> Document {
        let input = BackendInput::new(text.as_bytes(), InputFormat::Text).with_filename(Some("a.txt"));
        TextBackend::new().convert(&input, options).unwrap()
    }

    #[test]
    fn test_paragraphs() {
        let doc = convert("one\ntwo\n\nthree", &BackendOptions::default());
        assert_eq!(
            doc.content,
            vec![DocItem::paragraph("one two"), DocItem::paragraph("three")]
        );
        assert_eq!(doc.metadata.filename, "a.txt");
        assert_eq!(doc.metadata.title, None);
    }

    #[test]
    fn test_preserve_whitespace() {
        let options = BackendOptions::default().with_preserve_whitespace(true);
        let doc = convert("  indented\n    more\n", &options);
        assert_eq!(doc.content, vec![DocItem::paragraph("  indented\n    more")]);
    }

    #[test]
    fn test_markdown_title() {
        let doc = convert("\n# Release notes\n\nBody", &BackendOptions::default());
        assert_eq!(doc.metadata.title.as_deref(), Some("Release notes"));
        assert_eq!(doc.content.len(), 2, "title line stays in the content");
    }

    #[test]
    fn test_empty_text_is_empty_document() {
        let doc = convert("", &BackendOptions::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_binary_rejected() {
        let input = BackendInput::new(b"ab\0cd", InputFormat::Text);
        assert!(!TextBackend.is_valid(&input));
    }
}
