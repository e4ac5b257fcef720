//! Markdown serialization for [`Document`].
//!
//! Rendering is a pure function of the document and the options, so identical
//! input always produces byte-identical output.
//!
//! # Examples
//!
//! ```rust
//! use docweave_core::{DocItem, Document, DocumentMetadata, InputFormat};
//! use docweave_core::{HeadingStyle, MarkdownOptions, MarkdownSerializer};
//!
//! let doc = Document::new(
//!     DocumentMetadata::new("a.html", InputFormat::Html),
//!     vec![DocItem::title("Title"), DocItem::paragraph("Body")],
//! );
//!
//! let atx = MarkdownSerializer::new().serialize(&doc);
//! assert_eq!(atx, "# Title\n\nBody");
//!
//! let setext = MarkdownSerializer::with_options(
//!     MarkdownOptions::default().with_heading_style(HeadingStyle::Setext),
//! )
//! .serialize(&doc);
//! assert_eq!(setext, "Title\n=====\n\nBody");
//! ```

use crate::content::{DocItem, Formatting, ImageItem, ItemBody, MetadataValue, TableItem};
use crate::document::{Document, DocumentMetadata};
use log::trace;

/// Heading syntax
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HeadingStyle {
    /// `# Heading`
    #[default]
    Atx,
    /// Underlined with `=` (level 1) or `-` (level 2); deeper levels fall back to ATX
    Setext,
}

/// Code block syntax
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CodeBlockStyle {
    /// Triple-backtick fences, tagged with the `language` metadata
    #[default]
    Fenced,
    /// Four-space indentation
    Indented,
}

/// Configuration options for markdown serialization.
///
/// ```rust
/// use docweave_core::{CodeBlockStyle, MarkdownOptions};
///
/// let options = MarkdownOptions::default()
///     .with_bullet_char('*')
///     .with_code_block_style(CodeBlockStyle::Indented);
/// assert!(!options.include_metadata);
/// assert!(options.preserve_formatting);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkdownOptions {
    /// Emit a `---` frontmatter block with the document metadata.
    ///
    /// Default: `false`.
    pub include_metadata: bool,

    /// Heading syntax. Default: [`HeadingStyle::Atx`].
    pub heading_style: HeadingStyle,

    /// Marker for unordered list entries. Default: `-`.
    pub bullet_char: char,

    /// Code block syntax. Default: [`CodeBlockStyle::Fenced`].
    pub code_block_style: CodeBlockStyle,

    /// Render bold/italic/strikethrough markers. Underline has no Markdown
    /// syntax and is always dropped.
    ///
    /// Default: `true`.
    pub preserve_formatting: bool,
}

impl Default for MarkdownOptions {
    #[inline]
    fn default() -> Self {
        Self {
            include_metadata: false,
            heading_style: HeadingStyle::Atx,
            bullet_char: '-',
            code_block_style: CodeBlockStyle::Fenced,
            preserve_formatting: true,
        }
    }
}

impl MarkdownOptions {
    /// Set whether the metadata frontmatter is emitted.
    #[inline]
    #[must_use = "returns options with metadata flag set"]
    pub const fn with_include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Set the heading style.
    #[inline]
    #[must_use = "returns options with heading style set"]
    pub const fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = style;
        self
    }

    /// Set the bullet character.
    #[inline]
    #[must_use = "returns options with bullet character set"]
    pub const fn with_bullet_char(mut self, bullet: char) -> Self {
        self.bullet_char = bullet;
        self
    }

    /// Set the code block style.
    #[inline]
    #[must_use = "returns options with code block style set"]
    pub const fn with_code_block_style(mut self, style: CodeBlockStyle) -> Self {
        self.code_block_style = style;
        self
    }

    /// Set whether inline formatting markers are rendered.
    #[inline]
    #[must_use = "returns options with formatting flag set"]
    pub const fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }
}

/// Markdown serializer for [`Document`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MarkdownSerializer {
    options: MarkdownOptions,
}

impl MarkdownSerializer {
    /// Create a new markdown serializer with default options
    #[inline]
    #[must_use = "creates serializer with default options"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new markdown serializer with custom options
    #[inline]
    #[must_use = "creates serializer with custom options"]
    pub const fn with_options(options: MarkdownOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    #[inline]
    #[must_use = "returns the serializer options"]
    pub const fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Serialize a document to markdown.
    ///
    /// Top-level parts are joined by one blank line; parts that render empty
    /// are skipped.
    #[must_use = "serialization returns markdown string"]
    pub fn serialize(&self, doc: &Document) -> String {
        let mut parts = Vec::with_capacity(doc.content.len() + 1);
        if self.options.include_metadata {
            parts.push(Self::frontmatter(&doc.metadata));
        }
        parts.extend(
            doc.content
                .iter()
                .map(|item| self.serialize_item(item, 0))
                .filter(|part| !part.is_empty()),
        );
        trace!("Serialized {} markdown parts", parts.len());
        parts.join("\n\n")
    }

    /// Serialize a sequence of items without metadata.
    #[must_use = "serialization returns markdown string"]
    pub fn serialize_items(&self, items: &[DocItem]) -> String {
        self.join_items(items, 0)
    }

    fn join_items(&self, items: &[DocItem], list_level: usize) -> String {
        items
            .iter()
            .map(|item| self.serialize_item(item, list_level))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn serialize_item(&self, item: &DocItem, list_level: usize) -> String {
        match item {
            DocItem::Title(body) | DocItem::Heading(body) => {
                let own = self.heading(body.text.as_deref().unwrap_or(""), body.level.unwrap_or(1));
                self.with_children(own, body, list_level)
            }
            DocItem::Text(body)
            | DocItem::Paragraph(body)
            | DocItem::Caption(body)
            | DocItem::Subtitle(body) => {
                let own = self.formatted(body.text.as_deref().unwrap_or(""), body.formatting);
                self.with_children(own, body, list_level)
            }
            DocItem::TableCell(cell) => cell.text.trim().to_string(),
            DocItem::List(_) => self.list(item, list_level),
            DocItem::ListItem(body) => {
                // A list item outside any list renders as a one-entry bullet list.
                self.list_entry(body, None, list_level)
            }
            DocItem::Table(table) => Self::table(table),
            DocItem::Code(body) => self.code(body),
            DocItem::Formula(body) => match body.text.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => format!("$${text}$$"),
                _ => String::new(),
            },
            DocItem::Image(image) => Self::image(image),
            DocItem::Section(body) => self.join_items(&body.children, list_level),
        }
    }

    fn with_children(&self, own: String, body: &ItemBody, list_level: usize) -> String {
        let children = self.join_items(&body.children, list_level);
        match (own.is_empty(), children.is_empty()) {
            (_, true) => own,
            (true, false) => children,
            (false, false) => format!("{own}\n\n{children}"),
        }
    }

    fn heading(&self, text: &str, level: usize) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        let level = level.max(1);
        match (self.options.heading_style, level) {
            (HeadingStyle::Setext, 1 | 2) => {
                let underline = if level == 1 { '=' } else { '-' };
                let width = text.chars().count();
                format!("{text}\n{}", underline.to_string().repeat(width))
            }
            _ => format!("{} {text}", "#".repeat(level)),
        }
    }

    fn formatted(&self, text: &str, formatting: Option<Formatting>) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        match formatting {
            Some(fmt) if self.options.preserve_formatting => apply_formatting(text, fmt),
            _ => text.to_string(),
        }
    }

    fn list(&self, list: &DocItem, level: usize) -> String {
        let ordered = list.is_ordered_list();
        let mut lines = Vec::new();
        let mut index = 0;
        for child in list.children() {
            let rendered = match child {
                DocItem::List(_) => self.list(child, level + 1),
                DocItem::ListItem(body) => {
                    index += 1;
                    self.list_entry(body, ordered.then_some(index), level)
                }
                other => {
                    index += 1;
                    let text = self.serialize_item(other, level + 1);
                    if text.is_empty() {
                        text
                    } else {
                        format!("{}{} {text}", indent(level), self.marker(ordered.then_some(index)))
                    }
                }
            };
            if !rendered.is_empty() {
                lines.push(rendered);
            }
        }
        lines.join("\n")
    }

    fn list_entry(&self, body: &ItemBody, number: Option<usize>, level: usize) -> String {
        let mut lines = Vec::new();
        let text = self.formatted(body.text.as_deref().unwrap_or(""), body.formatting);
        if !text.is_empty() {
            lines.push(format!("{}{} {text}", indent(level), self.marker(number)));
        }
        for child in &body.children {
            let nested = match child {
                DocItem::List(_) => self.list(child, level + 1),
                DocItem::ListItem(inner) => self.list_entry(inner, None, level + 1),
                other => {
                    let text = self.serialize_item(other, level + 1);
                    text.lines()
                        .map(|line| format!("{}{line}", indent(level + 1)))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            };
            if !nested.is_empty() {
                lines.push(nested);
            }
        }
        lines.join("\n")
    }

    fn marker(&self, number: Option<usize>) -> String {
        number.map_or_else(|| self.options.bullet_char.to_string(), |n| format!("{n}."))
    }

    fn table(table: &TableItem) -> String {
        let num_cols = table.num_cols();
        if table.is_empty() || num_cols == 0 {
            return String::new();
        }
        let mut lines = Vec::with_capacity(table.num_rows() + 1);
        for (i, row) in table.rows().iter().enumerate() {
            let mut cells: Vec<String> = row.iter().map(|cell| escape_cell(&cell.text)).collect();
            cells.resize(num_cols, String::new());
            lines.push(format!("| {} |", cells.join(" | ")));
            if i == 0 {
                lines.push(format!("|{}", " --- |".repeat(num_cols)));
            }
        }
        lines.join("\n")
    }

    fn code(&self, body: &ItemBody) -> String {
        let text = body.text.as_deref().unwrap_or("").trim_end_matches(['\n', '\r']);
        if text.trim().is_empty() {
            return String::new();
        }
        match self.options.code_block_style {
            CodeBlockStyle::Fenced => {
                let language = body
                    .metadata
                    .get("language")
                    .and_then(MetadataValue::as_str)
                    .unwrap_or("");
                format!("```{language}\n{text}\n```")
            }
            CodeBlockStyle::Indented => text
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        String::new()
                    } else {
                        format!("    {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn image(image: &ImageItem) -> String {
        let meta_str = |key: &str| image.metadata.get(key).and_then(MetadataValue::as_str);
        let alt = image
            .alt
            .as_deref()
            .or_else(|| meta_str("alt"))
            .or(image.text.as_deref())
            .unwrap_or("");
        let src = image.src.as_deref().or_else(|| meta_str("src")).unwrap_or("");
        let link = format!("![{}]({src})", alt.replace(['\n', '\r'], " "));
        match image.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() && text != alt.trim() => format!("{link}\n\n{text}"),
            _ => link,
        }
    }

    fn frontmatter(metadata: &DocumentMetadata) -> String {
        let mut lines = vec!["---".to_string()];
        let mut push = |key: &str, value: serde_json::Value| {
            lines.push(format!("{key}: {value}"));
        };
        push("filename", metadata.filename.as_str().into());
        push("format", metadata.format.to_string().into());
        if let Some(title) = &metadata.title {
            push("title", title.as_str().into());
        }
        if let Some(author) = &metadata.author {
            push("author", author.as_str().into());
        }
        if let Some(pages) = metadata.num_pages {
            push("num_pages", pages.into());
        }
        if let Some(created) = metadata.created {
            push("created", created.to_rfc3339().into());
        }
        if let Some(modified) = metadata.modified {
            push("modified", modified.to_rfc3339().into());
        }
        if let Some(language) = &metadata.language {
            push("language", language.as_str().into());
        }
        if let Some(description) = &metadata.description {
            push("description", description.as_str().into());
        }
        for (key, value) in &metadata.extra {
            push(key, metadata_json(value));
        }
        lines.push("---".to_string());
        lines.join("\n")
    }
}

fn metadata_json(value: &MetadataValue) -> serde_json::Value {
    match value {
        MetadataValue::Bool(b) => (*b).into(),
        MetadataValue::Int(i) => (*i).into(),
        MetadataValue::Float(f) => (*f).into(),
        MetadataValue::Text(s) => s.as_str().into(),
    }
}

/// Wraps `text` in bold, then italic, then strikethrough markers.
fn apply_formatting(text: &str, fmt: Formatting) -> String {
    let mut result = text.to_string();
    if fmt.bold {
        result = format!("**{result}**");
    }
    if fmt.italic {
        result = format!("*{result}*");
    }
    if fmt.strikethrough {
        result = format!("~~{result}~~");
    }
    result
}

fn escape_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}
