//! JSON serialization for [`Document`]
//!
//! The item tree already implements `Serialize`; this module wraps it into the
//! `{ "metadata", "content" }` envelope and offers a per-item mapping hook.

use crate::content::DocItem;
use crate::document::Document;
use crate::error::Result;
use serde_json::{Map, Value};

/// Options for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JsonOptions {
    /// Pretty-print with indentation (default: true)
    pub pretty: bool,
    /// Include the `metadata` object (default: true)
    pub include_metadata: bool,
}

impl Default for JsonOptions {
    #[inline]
    fn default() -> Self {
        Self {
            pretty: true,
            include_metadata: true,
        }
    }
}

impl JsonOptions {
    /// Set pretty printing.
    #[inline]
    #[must_use = "returns options with pretty flag set"]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set whether metadata is included.
    #[inline]
    #[must_use = "returns options with metadata flag set"]
    pub const fn with_include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }
}

/// JSON serializer for [`Document`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JsonSerializer {
    options: JsonOptions,
}

impl JsonSerializer {
    /// Create a new JSON serializer with default options (pretty-printed)
    #[inline]
    #[must_use = "creates serializer with default options"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new JSON serializer with custom options
    #[inline]
    #[must_use = "creates serializer with custom options"]
    pub const fn with_options(options: JsonOptions) -> Self {
        Self { options }
    }

    /// The content array alone, each item serialized verbatim.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn content_value(doc: &Document) -> Result<Value> {
        Ok(serde_json::to_value(&doc.content)?)
    }

    /// Build the `{ "metadata"?, "content" }` value.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_value(&self, doc: &Document) -> Result<Value> {
        let content = Self::content_value(doc)?;
        self.envelope(doc, content)
    }

    /// Like [`to_value`](Self::to_value), with each top-level item passed
    /// through `map_item` instead of its default serialization.
    ///
    /// # Errors
    /// Returns error if metadata serialization fails
    pub fn to_value_with<F>(&self, doc: &Document, map_item: F) -> Result<Value>
    where
        F: Fn(&DocItem) -> Value,
    {
        let content = Value::Array(doc.content.iter().map(map_item).collect());
        self.envelope(doc, content)
    }

    /// Serialize a document to a JSON string.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn serialize(&self, doc: &Document) -> Result<String> {
        let value = self.to_value(doc)?;
        Ok(if self.options.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        })
    }

    fn envelope(&self, doc: &Document, content: Value) -> Result<Value> {
        let mut map = Map::new();
        if self.options.include_metadata {
            map.insert("metadata".to_string(), serde_json::to_value(&doc.metadata)?);
        }
        map.insert("content".to_string(), content);
        Ok(Value::Object(map))
    }
}
