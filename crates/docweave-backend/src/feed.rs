//! RSS and Atom feed backend
//!
//! Handles RSS 2.0, RSS 1.0 (RDF) and Atom. The channel title becomes the
//! document title; every item/entry yields a level-2 heading, its date and
//! its description reduced to text.

use crate::html::resolve_url;
use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::{html_to_text, non_blank, parse_datetime};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result};
use roxmltree::{Node, ParsingOptions};

/// One feed entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FeedEntry {
    title: Option<String>,
    link: Option<String>,
    date: Option<String>,
    author: Option<String>,
    description: Option<String>,
}

/// Feed backend for RSS and Atom
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeedBackend;

impl FeedBackend {
    /// Create a new feed backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
        node.children()
            .find(|c| c.is_element() && c.tag_name().name() == name)
    }

    fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
        let child = Self::child(node, name)?;
        let text: String = child
            .descendants()
            .filter(Node::is_text)
            .filter_map(|t| t.text())
            .collect();
        non_blank(&text)
    }

    /// First child among `names` with text, in preference order.
    fn first_text(node: Node<'_, '_>, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| Self::child_text(node, name))
    }

    fn atom_link(entry: Node<'_, '_>) -> Option<String> {
        entry
            .children()
            .filter(|c| c.is_element() && c.tag_name().name() == "link")
            .find(|link| matches!(link.attribute("rel"), None | Some("alternate")))
            .and_then(|link| link.attribute("href"))
            .and_then(non_blank)
    }

    fn atom_author(node: Node<'_, '_>) -> Option<String> {
        Self::child(node, "author").and_then(|author| Self::child_text(author, "name"))
    }

    fn rss_entry(item: Node<'_, '_>) -> FeedEntry {
        FeedEntry {
            title: Self::child_text(item, "title"),
            link: Self::child_text(item, "link"),
            date: Self::first_text(item, &["pubDate", "date", "updated"]),
            author: Self::first_text(item, &["author", "creator"]),
            description: Self::first_text(item, &["description", "encoded", "summary"]),
        }
    }

    fn atom_entry(entry: Node<'_, '_>) -> FeedEntry {
        FeedEntry {
            title: Self::child_text(entry, "title"),
            link: Self::atom_link(entry),
            date: Self::first_text(entry, &["published", "updated"]),
            author: Self::atom_author(entry),
            description: Self::first_text(entry, &["summary", "content"]),
        }
    }

    fn entry_items(entry: FeedEntry, options: &BackendOptions) -> Vec<DocItem> {
        let mut items = Vec::new();
        let title = entry
            .title
            .map(|t| html_to_text(&t))
            .unwrap_or_else(|| "Untitled".to_string());
        let mut heading = DocItem::heading(2, title);
        if let Some(link) = &entry.link {
            heading = heading.with_metadata("link", resolve_url(options.base_url.as_deref(), link));
        }
        items.push(heading);

        let byline = match (&entry.date, &entry.author) {
            (Some(date), Some(author)) => Some(format!("{} by {author}", Self::display_date(date))),
            (Some(date), None) => Some(Self::display_date(date)),
            (None, Some(author)) => Some(format!("By {author}")),
            (None, None) => None,
        };
        if let Some(byline) = byline {
            items.push(DocItem::paragraph(byline));
        }
        if let Some(description) = entry.description.as_deref().map(html_to_text) {
            if !description.is_empty() {
                items.push(DocItem::paragraph(description));
            }
        }
        items
    }

    /// RFC 3339 when the date parses, the raw value otherwise.
    fn display_date(raw: &str) -> String {
        parse_datetime(raw).map_or_else(|| raw.trim().to_string(), |dt| dt.to_rfc3339())
    }
}

impl DocumentBackend for FeedBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Rss, InputFormat::Atom]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        let text = input.text();
        let head: String = text.chars().take(4096).collect::<String>().to_ascii_lowercase();
        head.contains("<rss") || head.contains("<feed") || head.contains("<rdf")
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let text = input.text();
        let xml = roxmltree::Document::parse_with_options(
            &text,
            ParsingOptions {
                allow_dtd: true,
                ..ParsingOptions::default()
            },
        )
        .map_err(|e| DocweaveError::ConversionError(format!("Invalid feed XML: {e}")))?;

        let root = xml.root_element();
        let is_atom = root.tag_name().name() == "feed";
        let (channel, entries): (Node<'_, '_>, Vec<FeedEntry>) = if is_atom {
            let entries = root
                .children()
                .filter(|c| c.is_element() && c.tag_name().name() == "entry")
                .map(Self::atom_entry)
                .collect();
            (root, entries)
        } else {
            let channel = Self::child(root, "channel").unwrap_or(root);
            let entries = root
                .descendants()
                .filter(|c| c.is_element() && c.tag_name().name() == "item")
                .map(Self::rss_entry)
                .collect();
            (channel, entries)
        };
        log::debug!(
            "{} feed with {} entries",
            if is_atom { "Atom" } else { "RSS" },
            entries.len()
        );

        let title = Self::child_text(channel, "title").map(|t| html_to_text(&t));
        let description = Self::first_text(channel, &["description", "subtitle", "tagline"])
            .map(|d| html_to_text(&d));
        let author = if is_atom {
            Self::atom_author(channel)
        } else {
            Self::first_text(channel, &["managingEditor", "creator", "author"])
        };
        let updated = Self::first_text(channel, &["lastBuildDate", "pubDate", "updated", "date"]);

        let mut metadata = DocumentMetadata::new(input.display_name(), input.format)
            .with_title(title.clone())
            .with_author(author)
            .with_extra("item_count", entries.len());
        metadata.description = description.clone().filter(|d| !d.is_empty());
        metadata.language = Self::child_text(channel, "language")
            .or_else(|| root.attribute(("http://www.w3.org/XML/1998/namespace", "lang")).and_then(non_blank));
        metadata.modified = updated.as_deref().and_then(parse_datetime);
        let feed_link = if is_atom {
            Self::atom_link(channel)
        } else {
            Self::child_text(channel, "link")
        };
        if let Some(link) = feed_link {
            metadata = metadata.with_extra("feed_link", link);
        }

        let mut content = Vec::new();
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            content.push(DocItem::title(title));
        }
        if let Some(description) = metadata.description.clone() {
            content.push(DocItem::paragraph(description));
        }
        for entry in entries {
            content.extend(Self::entry_items(entry, options));
        }
        Ok(Document::new(metadata, content))
    }
}
