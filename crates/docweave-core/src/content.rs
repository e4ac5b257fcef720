//! Content item types for structured document representation
//!
//! This module defines the unified item tree every backend produces. Items are
//! plain owned values: a [`DocItem`] owns its children, so the tree can never
//! contain shared nodes or cycles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form per-item (or per-document) metadata map.
///
/// A `BTreeMap` keeps key order stable, which keeps serialized output
/// deterministic.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A primitive metadata value (bool, integer, float or string)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating-point number
    Float(f64),
    /// UTF-8 string
    Text(String),
}

impl MetadataValue {
    /// Returns the string value, if this is a [`MetadataValue::Text`].
    #[inline]
    #[must_use = "returns the string value if present"]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a [`MetadataValue::Bool`].
    #[inline]
    #[must_use = "returns the boolean value if present"]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is a [`MetadataValue::Int`].
    #[inline]
    #[must_use = "returns the integer value if present"]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for MetadataValue {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for MetadataValue {
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
    }
}

impl From<f64> for MetadataValue {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetadataValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    #[inline]
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Inline text formatting (default: all flags off)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Formatting {
    /// Whether text is bold
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    /// Whether text is italic
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    /// Whether text is underlined
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    /// Whether text has strikethrough
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
}

impl Formatting {
    /// Bold-only formatting.
    pub const BOLD: Self = Self {
        bold: true,
        italic: false,
        underline: false,
        strikethrough: false,
    };

    /// Italic-only formatting.
    pub const ITALIC: Self = Self {
        bold: false,
        italic: true,
        underline: false,
        strikethrough: false,
    };

    /// Returns `true` if no flag is set.
    #[inline]
    #[must_use = "returns whether no formatting flag is set"]
    pub const fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline || self.strikethrough)
    }

    /// Combines two formattings flag by flag.
    #[inline]
    #[must_use = "returns the merged formatting"]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
            strikethrough: self.strikethrough || other.strikethrough,
        }
    }
}

/// Attributes shared by every textual/structural item kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemBody {
    /// Item text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Level (1-based): heading level or list nesting level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    /// Inline formatting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<Formatting>,
    /// Ordered child items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocItem>,
    /// Free-form metadata (e.g. `ordered`, `language`, `start`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl ItemBody {
    /// Creates a body holding only `text`.
    #[inline]
    #[must_use = "creates a new item body"]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// A single table cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell text content
    pub text: String,
    /// Number of rows this cell spans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<usize>,
    /// Number of columns this cell spans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span: Option<usize>,
    /// Whether this cell is a header cell
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_header: bool,
}

impl TableCell {
    /// Creates a body cell.
    #[inline]
    #[must_use = "creates a new table cell"]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates a header cell.
    #[inline]
    #[must_use = "creates a new header cell"]
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_header: true,
            ..Self::default()
        }
    }

    /// Sets row/column spans; spans of 1 are recorded as absent.
    #[inline]
    #[must_use = "returns the cell with spans applied"]
    pub fn with_spans(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = (row_span > 1).then_some(row_span);
        self.col_span = (col_span > 1).then_some(col_span);
        self
    }
}

/// Table item: a grid of cells with cached dimensions.
///
/// `num_rows` is always `rows.len()` and `num_cols` the longest row's length
/// (0 for an empty table). [`TableItem::new`] is the only constructor and
/// deserialization rejects inconsistent dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct TableItem {
    rows: Vec<Vec<TableCell>>,
    num_rows: usize,
    num_cols: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: Metadata,
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    rows: Vec<Vec<TableCell>>,
    #[serde(default)]
    num_rows: Option<usize>,
    #[serde(default)]
    num_cols: Option<usize>,
    #[serde(default)]
    metadata: Metadata,
}

impl TryFrom<RawTable> for TableItem {
    type Error = String;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let mut table = Self::new(raw.rows);
        if let Some(declared) = raw.num_rows {
            if declared != table.num_rows {
                return Err(format!(
                    "table declares {declared} rows but contains {}",
                    table.num_rows
                ));
            }
        }
        if let Some(declared) = raw.num_cols {
            if declared != table.num_cols {
                return Err(format!(
                    "table declares {declared} columns but its widest row has {}",
                    table.num_cols
                ));
            }
        }
        table.metadata = raw.metadata;
        Ok(table)
    }
}

impl TableItem {
    /// Creates a table, computing its dimensions from `rows`.
    #[inline]
    #[must_use = "creates a new table"]
    pub fn new(rows: Vec<Vec<TableCell>>) -> Self {
        let num_rows = rows.len();
        let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            rows,
            num_rows,
            num_cols,
            metadata: Metadata::new(),
        }
    }

    /// Creates a table from plain strings; when `header` is set the first
    /// row's cells are marked as header cells.
    #[must_use = "creates a new table"]
    pub fn from_text_rows(rows: Vec<Vec<String>>, header: bool) -> Self {
        let cells = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                row.into_iter()
                    .map(|text| {
                        if header && i == 0 {
                            TableCell::header(text)
                        } else {
                            TableCell::new(text)
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(cells)
    }

    /// Attaches a metadata entry.
    #[inline]
    #[must_use = "returns the table with metadata attached"]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Table rows in order.
    #[inline]
    #[must_use = "returns the table rows"]
    pub fn rows(&self) -> &[Vec<TableCell>] {
        &self.rows
    }

    /// Number of rows.
    #[inline]
    #[must_use = "returns the number of rows"]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns (length of the longest row).
    #[inline]
    #[must_use = "returns the number of columns"]
    pub const fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Table metadata.
    #[inline]
    #[must_use = "returns the table metadata"]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns `true` if the table has no rows.
    #[inline]
    #[must_use = "returns whether the table is empty"]
    pub const fn is_empty(&self) -> bool {
        self.num_rows == 0
    }
}

/// Image item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    /// Source reference (URL or archive-relative path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Raw image bytes, serialized as base64
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    /// Text associated with the image (e.g. OCR output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|e| STANDARD.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// A node of the unified document tree.
///
/// Serialized with a `"type"` tag in `snake_case`, e.g.
/// `{"type": "heading", "text": "Intro", "level": 2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocItem {
    /// Generic text run
    Text(ItemBody),
    /// Document title
    Title(ItemBody),
    /// Section heading (`level` 1-based)
    Heading(ItemBody),
    /// Paragraph
    Paragraph(ItemBody),
    /// List container; `ordered` metadata selects numbering
    List(ItemBody),
    /// List entry; may contain a nested list
    ListItem(ItemBody),
    /// Table
    Table(TableItem),
    /// Stand-alone table cell
    TableCell(TableCell),
    /// Image
    Image(ImageItem),
    /// Code block; `language` metadata selects the fence tag
    Code(ItemBody),
    /// Formula
    Formula(ItemBody),
    /// Caption
    Caption(ItemBody),
    /// Grouping container without its own rendering
    Section(ItemBody),
    /// Subtitle cue; `start`/`end` metadata carry timestamps
    Subtitle(ItemBody),
}

impl DocItem {
    /// Creates a [`DocItem::Text`] item.
    #[inline]
    #[must_use = "creates a new item"]
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self::Text(ItemBody::with_text(text))
    }

    /// Creates a [`DocItem::Paragraph`] item.
    #[inline]
    #[must_use = "creates a new item"]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(ItemBody::with_text(text))
    }

    /// Creates a [`DocItem::Title`] item (level 1).
    #[inline]
    #[must_use = "creates a new item"]
    pub fn title(text: impl Into<String>) -> Self {
        Self::Title(ItemBody {
            level: Some(1),
            ..ItemBody::with_text(text)
        })
    }

    /// Creates a [`DocItem::Heading`] item; level is clamped to at least 1.
    #[inline]
    #[must_use = "creates a new item"]
    pub fn heading(level: usize, text: impl Into<String>) -> Self {
        Self::Heading(ItemBody {
            level: Some(level.max(1)),
            ..ItemBody::with_text(text)
        })
    }

    /// Creates a [`DocItem::List`] holding `items`.
    #[must_use = "creates a new item"]
    pub fn list(ordered: bool, items: Vec<Self>) -> Self {
        let mut body = ItemBody {
            children: items,
            ..ItemBody::default()
        };
        body.metadata
            .insert("ordered".to_string(), MetadataValue::Bool(ordered));
        Self::List(body)
    }

    /// Creates a [`DocItem::ListItem`].
    #[inline]
    #[must_use = "creates a new item"]
    pub fn list_item(text: impl Into<String>) -> Self {
        Self::ListItem(ItemBody::with_text(text))
    }

    /// Creates a [`DocItem::Code`] block, optionally tagged with a language.
    #[must_use = "creates a new item"]
    pub fn code(text: impl Into<String>, language: Option<&str>) -> Self {
        let mut body = ItemBody::with_text(text);
        if let Some(lang) = language.filter(|l| !l.is_empty()) {
            body.metadata
                .insert("language".to_string(), MetadataValue::from(lang));
        }
        Self::Code(body)
    }

    /// Creates a [`DocItem::Formula`].
    #[inline]
    #[must_use = "creates a new item"]
    pub fn formula(text: impl Into<String>) -> Self {
        Self::Formula(ItemBody::with_text(text))
    }

    /// Creates a [`DocItem::Caption`].
    #[inline]
    #[must_use = "creates a new item"]
    pub fn caption(text: impl Into<String>) -> Self {
        Self::Caption(ItemBody::with_text(text))
    }

    /// Creates a [`DocItem::Section`] grouping `children`.
    #[inline]
    #[must_use = "creates a new item"]
    pub fn section(children: Vec<Self>) -> Self {
        Self::Section(ItemBody {
            children,
            ..ItemBody::default()
        })
    }

    /// Creates a [`DocItem::Subtitle`] cue with `start`/`end` timestamps.
    #[must_use = "creates a new item"]
    pub fn subtitle(text: impl Into<String>, start: &str, end: &str) -> Self {
        let mut body = ItemBody::with_text(text);
        body.metadata
            .insert("start".to_string(), MetadataValue::from(start));
        body.metadata
            .insert("end".to_string(), MetadataValue::from(end));
        Self::Subtitle(body)
    }

    /// Type tag as used in serialized output (e.g. `"list_item"`).
    #[must_use = "returns the item's type name"]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Title(_) => "title",
            Self::Heading(_) => "heading",
            Self::Paragraph(_) => "paragraph",
            Self::List(_) => "list",
            Self::ListItem(_) => "list_item",
            Self::Table(_) => "table",
            Self::TableCell(_) => "table_cell",
            Self::Image(_) => "image",
            Self::Code(_) => "code",
            Self::Formula(_) => "formula",
            Self::Caption(_) => "caption",
            Self::Section(_) => "section",
            Self::Subtitle(_) => "subtitle",
        }
    }

    /// Shared attributes, for every kind except tables, cells and images.
    #[must_use = "returns the item body if present"]
    pub const fn body(&self) -> Option<&ItemBody> {
        match self {
            Self::Text(b)
            | Self::Title(b)
            | Self::Heading(b)
            | Self::Paragraph(b)
            | Self::List(b)
            | Self::ListItem(b)
            | Self::Code(b)
            | Self::Formula(b)
            | Self::Caption(b)
            | Self::Section(b)
            | Self::Subtitle(b) => Some(b),
            Self::Table(_) | Self::TableCell(_) | Self::Image(_) => None,
        }
    }

    fn body_mut(&mut self) -> Option<&mut ItemBody> {
        match self {
            Self::Text(b)
            | Self::Title(b)
            | Self::Heading(b)
            | Self::Paragraph(b)
            | Self::List(b)
            | Self::ListItem(b)
            | Self::Code(b)
            | Self::Formula(b)
            | Self::Caption(b)
            | Self::Section(b)
            | Self::Subtitle(b) => Some(b),
            Self::Table(_) | Self::TableCell(_) | Self::Image(_) => None,
        }
    }

    /// Item text, if any.
    #[must_use = "returns the item text if present"]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::TableCell(cell) => Some(&cell.text),
            Self::Image(image) => image.text.as_deref(),
            Self::Table(_) => None,
            _ => self.body().and_then(|b| b.text.as_deref()),
        }
    }

    /// Item level, if any.
    #[inline]
    #[must_use = "returns the item level if present"]
    pub fn level(&self) -> Option<usize> {
        self.body().and_then(|b| b.level)
    }

    /// Inline formatting, if any.
    #[inline]
    #[must_use = "returns the item formatting if present"]
    pub fn formatting(&self) -> Option<Formatting> {
        self.body().and_then(|b| b.formatting)
    }

    /// Child items (empty for leaf kinds).
    #[inline]
    #[must_use = "returns the child items"]
    pub fn children(&self) -> &[Self] {
        self.body().map_or(&[], |b| b.children.as_slice())
    }

    /// Metadata map, if this kind carries one.
    #[must_use = "returns the item metadata if present"]
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Self::Table(table) => Some(&table.metadata),
            Self::Image(image) => Some(&image.metadata),
            Self::TableCell(_) => None,
            _ => self.body().map(|b| &b.metadata),
        }
    }

    /// Looks up a single metadata entry.
    #[inline]
    #[must_use = "returns the metadata value if present"]
    pub fn metadata_value(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata().and_then(|m| m.get(key))
    }

    /// Whether this is a list marked as ordered.
    #[inline]
    #[must_use = "returns whether this is an ordered list"]
    pub fn is_ordered_list(&self) -> bool {
        matches!(self, Self::List(_))
            && self
                .metadata_value("ordered")
                .and_then(MetadataValue::as_bool)
                .unwrap_or(false)
    }

    /// Sets the level. No effect on tables, cells and images.
    #[inline]
    #[must_use = "returns the item with level applied"]
    pub fn with_level(mut self, level: usize) -> Self {
        if let Some(body) = self.body_mut() {
            body.level = Some(level);
        }
        self
    }

    /// Sets formatting; plain formatting is stored as absent. No effect on
    /// tables, cells and images.
    #[inline]
    #[must_use = "returns the item with formatting applied"]
    pub fn with_formatting(mut self, formatting: Formatting) -> Self {
        if let Some(body) = self.body_mut() {
            body.formatting = (!formatting.is_plain()).then_some(formatting);
        }
        self
    }

    /// Replaces the children. No effect on tables, cells and images.
    #[inline]
    #[must_use = "returns the item with children attached"]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        if let Some(body) = self.body_mut() {
            body.children = children;
        }
        self
    }

    /// Attaches a metadata entry. No effect on table cells.
    #[must_use = "returns the item with metadata attached"]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        let map = match &mut self {
            Self::Table(table) => Some(&mut table.metadata),
            Self::Image(image) => Some(&mut image.metadata),
            Self::TableCell(_) => None,
            other => other.body_mut().map(|b| &mut b.metadata),
        };
        if let Some(map) = map {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Visits this item and all of its descendants depth-first, pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

impl From<TableItem> for DocItem {
    #[inline]
    fn from(table: TableItem) -> Self {
        Self::Table(table)
    }
}

impl From<ImageItem> for DocItem {
    #[inline]
    fn from(image: ImageItem) -> Self {
        Self::Image(image)
    }
}
