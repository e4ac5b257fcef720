//! JSON backend
//!
//! Arbitrary JSON is kept as a single pretty-printed `json` code block. A
//! top-level string `title` field becomes the document title.

use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result};
use serde_json::Value;

/// JSON Document Backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JsonBackend;

impl JsonBackend {
    /// Create a new JSON backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentBackend for JsonBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Json]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        let text = input.text();
        // first character of any JSON value
        text.trim_start()
            .starts_with(|c: char| "{[\"-tfn".contains(c) || c.is_ascii_digit())
    }

    fn convert(&self, input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
        let value: Value = serde_json::from_str(&input.text())
            .map_err(|e| DocweaveError::ConversionError(format!("Invalid JSON: {e}")))?;
        let pretty = serde_json::to_string_pretty(&value)?;

        let title = value.get("title").and_then(Value::as_str);
        let kind = match &value {
            Value::Object(map) => format!("object ({} keys)", map.len()),
            Value::Array(items) => format!("array ({} items)", items.len()),
            _ => "scalar".to_string(),
        };
        log::debug!("JSON document is a top-level {kind}");

        let metadata = DocumentMetadata::new(input.display_name(), InputFormat::Json).with_title(title);
        Ok(Document::new(metadata, vec![DocItem::code(pretty, Some("json"))]))
    }
}
