//! Jupyter Notebook backend
//!
//! Converts Jupyter Notebook (.ipynb) files to the document model.
//!
//! ## Mapping
//!
//! - Markdown cells: `#` lines become headings, `-`/`*` lines become
//!   bullet lists, fenced blocks become code, everything else paragraphs
//! - Code cells: code block tagged with the kernel language
//! - Text outputs (stream, `text/plain` results, errors): untagged code block
//! - Raw cells: paragraphs
//!
//! The title is taken from the notebook metadata, else from the first `#`
//! heading of a markdown cell.

use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::{non_blank, normalize_whitespace};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result};
use serde::Deserialize;
use serde_json::Value;

/// Multi-line notebook text: either one string or a list of line strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MultilineText {
    Lines(Vec<String>),
    Joined(String),
}

impl Default for MultilineText {
    fn default() -> Self {
        Self::Joined(String::new())
    }
}

impl MultilineText {
    fn joined(&self) -> String {
        match self {
            Self::Lines(lines) => lines.concat(),
            Self::Joined(text) => text.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Notebook {
    cells: Vec<Cell>,
    #[serde(default)]
    metadata: NotebookMetadata,
    #[serde(default)]
    nbformat: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct NotebookMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(default)]
    kernelspec: Option<KernelSpec>,
    #[serde(default)]
    language_info: Option<LanguageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Author {
    Named { name: String },
    Plain(String),
}

impl Author {
    fn name(&self) -> &str {
        match self {
            Self::Named { name } | Self::Plain(name) => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KernelSpec {
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LanguageInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: MultilineText,
    #[serde(default)]
    outputs: Vec<Output>,
}

#[derive(Debug, Deserialize)]
struct Output {
    output_type: String,
    #[serde(default)]
    text: MultilineText,
    #[serde(default)]
    data: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    ename: Option<String>,
    #[serde(default)]
    evalue: Option<String>,
}

impl Output {
    /// Plain-text rendering of this output, if it has one.
    fn text(&self) -> Option<String> {
        let text = match self.output_type.as_str() {
            "stream" => self.text.joined(),
            "execute_result" | "display_data" => {
                let plain = self.data.as_ref()?.get("text/plain")?;
                match plain {
                    Value::String(s) => s.clone(),
                    Value::Array(lines) => lines.iter().filter_map(Value::as_str).collect(),
                    _ => return None,
                }
            }
            "error" => format!(
                "{}: {}",
                self.ename.as_deref().unwrap_or("Error"),
                self.evalue.as_deref().unwrap_or_default()
            ),
            _ => return None,
        };
        let trimmed = text.trim_end();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Jupyter Notebook backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IpynbBackend;

impl IpynbBackend {
    /// Create a new Jupyter Notebook backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    /// Structural items for one markdown cell.
    fn markdown_items(source: &str) -> Vec<DocItem> {
        let mut items = Vec::new();
        let mut paragraph: Vec<&str> = Vec::new();
        let mut bullets: Vec<DocItem> = Vec::new();
        let mut fence: Option<(String, Vec<&str>)> = None;

        for line in source.lines() {
            let trimmed = line.trim();
            if let Some((language, body)) = fence.as_mut() {
                if trimmed.starts_with("```") {
                    let language = std::mem::take(language);
                    let code = body.join("\n");
                    items.push(DocItem::code(code, Some(language.as_str())));
                    fence = None;
                } else {
                    body.push(line);
                }
                continue;
            }
            if let Some(info) = trimmed.strip_prefix("```") {
                Self::flush_blocks(&mut paragraph, &mut bullets, &mut items);
                fence = Some((info.trim().to_string(), Vec::new()));
            } else if trimmed.is_empty() {
                Self::flush_blocks(&mut paragraph, &mut bullets, &mut items);
            } else if let Some((level, text)) = Self::atx_heading(trimmed) {
                Self::flush_blocks(&mut paragraph, &mut bullets, &mut items);
                items.push(DocItem::heading(level, text));
            } else if let Some(text) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                if !paragraph.is_empty() {
                    Self::flush_blocks(&mut paragraph, &mut Vec::new(), &mut items);
                }
                bullets.push(DocItem::list_item(text.trim()));
            } else {
                if !bullets.is_empty() {
                    Self::flush_blocks(&mut Vec::new(), &mut bullets, &mut items);
                }
                paragraph.push(trimmed);
            }
        }
        // unterminated fence keeps its content
        if let Some((language, body)) = fence {
            items.push(DocItem::code(body.join("\n"), Some(language.as_str())));
        }
        Self::flush_blocks(&mut paragraph, &mut bullets, &mut items);
        items
    }

    /// Emit the pending paragraph and bullet list, in that order.
    fn flush_blocks(paragraph: &mut Vec<&str>, bullets: &mut Vec<DocItem>, items: &mut Vec<DocItem>) {
        if !paragraph.is_empty() {
            items.push(DocItem::paragraph(normalize_whitespace(&paragraph.join(" "))));
            paragraph.clear();
        }
        if !bullets.is_empty() {
            items.push(DocItem::list(false, std::mem::take(bullets)));
        }
    }

    fn atx_heading(line: &str) -> Option<(usize, &str)> {
        let level = line.chars().take_while(|&c| c == '#').count();
        if level == 0 || level > 6 {
            return None;
        }
        let rest = &line[level..];
        if !rest.starts_with(' ') {
            return None;
        }
        let text = rest.trim().trim_end_matches('#').trim_end();
        (!text.is_empty()).then_some((level, text))
    }

    fn first_heading(cells: &[Cell]) -> Option<String> {
        cells
            .iter()
            .filter(|cell| cell.cell_type == "markdown")
            .flat_map(|cell| {
                cell.source
                    .joined()
                    .lines()
                    .filter_map(|line| Self::atx_heading(line.trim()))
                    .filter(|(level, _)| *level == 1)
                    .map(|(_, text)| text.to_string())
                    .collect::<Vec<_>>()
            })
            .next()
    }

    fn cell_items(cell: &Cell, language: Option<&str>) -> Vec<DocItem> {
        let source = cell.source.joined();
        match cell.cell_type.as_str() {
            "markdown" => Self::markdown_items(&source),
            "code" => {
                let mut items = Vec::new();
                if !source.trim().is_empty() {
                    items.push(DocItem::code(source.trim_end(), language));
                }
                items.extend(
                    cell.outputs
                        .iter()
                        .filter_map(Output::text)
                        .map(|text| DocItem::code(text, None)),
                );
                items
            }
            _ => crate::utils::paragraph_items(&source, false),
        }
    }
}

impl DocumentBackend for IpynbBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Ipynb]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        input.text().trim_start().starts_with('{')
    }

    fn convert(&self, input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
        let notebook: Notebook = serde_json::from_str(&input.text())
            .map_err(|e| DocweaveError::ConversionError(format!("Invalid notebook: {e}")))?;

        let language = notebook
            .metadata
            .kernelspec
            .as_ref()
            .and_then(|k| k.language.clone())
            .or_else(|| notebook.metadata.language_info.as_ref().and_then(|l| l.name.clone()));

        let content: Vec<DocItem> = notebook
            .cells
            .iter()
            .flat_map(|cell| Self::cell_items(cell, language.as_deref()))
            .collect();
        log::debug!(
            "Notebook with {} cells produced {} items",
            notebook.cells.len(),
            content.len()
        );

        let title = notebook
            .metadata
            .title
            .as_deref()
            .and_then(non_blank)
            .or_else(|| Self::first_heading(&notebook.cells));
        let authors: Vec<&str> = notebook.metadata.authors.iter().map(Author::name).collect();

        let mut metadata = DocumentMetadata::new(input.display_name(), InputFormat::Ipynb)
            .with_title(title)
            .with_author((!authors.is_empty()).then(|| authors.join(", ")))
            .with_extra("num_cells", notebook.cells.len());
        if let Some(language) = language {
            metadata = metadata.with_extra("kernel_language", language);
        }
        if let Some(nbformat) = notebook.nbformat {
            metadata = metadata.with_extra("nbformat", i64::from(nbformat));
        }
        Ok(Document::new(metadata, content))
    }
}
