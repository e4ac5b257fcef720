//! HTML backend
//!
//! Walks the parsed DOM in document order and maps block elements to items:
//!
//! | Element | Item |
//! |---------|------|
//! | `h1`-`h6` | heading |
//! | `p`, `address`, `summary`, loose inline runs | paragraph |
//! | `ul`, `ol` | list (nested lists become children of their list item) |
//! | `table` | table (`th` and `thead` cells are headers, spans kept) |
//! | `pre` | code (language from `language-*`/`lang-*` classes) |
//! | `img`, `figure` | image (+ caption from `figcaption`) |
//!
//! Formatting (bold/italic/underline/strikethrough) is recorded on an item
//! only when all of its text shares it.
//!
//! YouTube watch pages are recognized and reduced to title, description and
//! video metadata; a transcript is appended when requested and a
//! [`TranscriptFetcher`] is configured.

use crate::traits::{BackendInput, BackendOptions, DocumentBackend, TranscriptFetcher, TranscriptSegment};
use crate::utils::{non_blank, normalize_whitespace, parse_datetime};
use base64::Engine as _;
use docweave_core::{
    DocItem, Document, DocumentMetadata, Formatting, ImageItem, InputFormat, Result, TableCell,
    TableItem,
};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

/// Element nesting below which the DOM walk flattens content into plain text.
const MAX_DOM_DEPTH: usize = 256;

/// Parse a CSS selector; `None` for an invalid one.
#[inline]
pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// First element matching `css` in the document.
pub(crate) fn select_first<'a>(html: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    html.select(&selector(css)?).next()
}

/// Attribute of the first element matching `css`, if non-blank.
pub(crate) fn select_attr(html: &Html, css: &str, attr: &str) -> Option<String> {
    select_first(html, css)
        .and_then(|el| el.value().attr(attr))
        .and_then(non_blank)
}

/// Whitespace-normalized text content of an element.
#[inline]
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Resolve `src` against `base`; absolute and `data:` references are kept.
pub(crate) fn resolve_url(base: Option<&str>, src: &str) -> String {
    let Some(base) = base.filter(|b| !b.is_empty()) else {
        return src.to_string();
    };
    if src.contains("://") || src.starts_with("data:") || src.starts_with("mailto:") {
        return src.to_string();
    }
    if let Some(rest) = src.strip_prefix("//") {
        let scheme = base.split_once("://").map_or("https", |(scheme, _)| scheme);
        return format!("{scheme}://{rest}");
    }
    if src.starts_with('/') {
        let origin_end = base
            .find("://")
            .and_then(|i| base[i + 3..].find('/').map(|j| i + 3 + j))
            .unwrap_or(base.len());
        return format!("{}{src}", &base[..origin_end]);
    }
    let dir_end = base.rfind('/').map_or(base.len(), |i| i + 1);
    let dir = &base[..dir_end];
    if dir.ends_with('/') {
        format!("{dir}{src}")
    } else {
        format!("{dir}/{src}")
    }
}

/// A run of text with the formatting active where it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextRun {
    text: String,
    formatting: Formatting,
}

/// HTML Document Backend
#[derive(Debug, Clone, Default)]
pub struct HtmlBackend {
    transcript_fetcher: Option<Arc<dyn TranscriptFetcher>>,
}

impl HtmlBackend {
    /// Create a new HTML backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self {
            transcript_fetcher: None,
        }
    }

    /// Attach a transcript source for video pages
    #[inline]
    #[must_use = "returns the backend with a transcript fetcher"]
    pub fn with_transcript_fetcher(mut self, fetcher: Arc<dyn TranscriptFetcher>) -> Self {
        self.transcript_fetcher = Some(fetcher);
        self
    }

    /// Formatting contributed by an inline tag
    #[inline]
    fn tag_formatting(tag_name: &str) -> Option<Formatting> {
        let mut fmt = Formatting::default();
        match tag_name {
            "strong" | "b" => fmt.bold = true,
            "em" | "i" | "var" | "cite" => fmt.italic = true,
            "u" | "ins" => fmt.underline = true,
            "s" | "del" | "strike" => fmt.strikethrough = true,
            _ => return None,
        }
        Some(fmt)
    }

    #[inline]
    fn is_inline(tag_name: &str) -> bool {
        Self::tag_formatting(tag_name).is_some()
            || matches!(
                tag_name,
                "a" | "abbr"
                    | "br"
                    | "code"
                    | "kbd"
                    | "label"
                    | "mark"
                    | "q"
                    | "samp"
                    | "small"
                    | "span"
                    | "sub"
                    | "sup"
                    | "time"
                    | "wbr"
            )
    }

    #[inline]
    fn is_skipped(tag_name: &str) -> bool {
        matches!(
            tag_name,
            "script" | "style" | "noscript" | "template" | "head" | "svg" | "iframe" | "button"
        )
    }

    /// Collect text runs below `element`, optionally leaving nested lists out.
    fn collect_runs(
        element: ElementRef<'_>,
        active: Formatting,
        skip_lists: bool,
        depth: usize,
        runs: &mut Vec<TextRun>,
    ) {
        if depth >= MAX_DOM_DEPTH {
            runs.push(TextRun {
                text: element.text().collect(),
                formatting: active,
            });
            return;
        }
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                runs.push(TextRun {
                    text: text.to_string(),
                    formatting: active,
                });
            } else if let Some(child_element) = ElementRef::wrap(child) {
                let name = child_element.value().name();
                if Self::is_skipped(name) || (skip_lists && matches!(name, "ul" | "ol")) {
                    continue;
                }
                if name == "br" {
                    runs.push(TextRun {
                        text: "\n".to_string(),
                        formatting: active,
                    });
                    continue;
                }
                let formatting = Self::tag_formatting(name).map_or(active, |fmt| active.merge(fmt));
                Self::collect_runs(child_element, formatting, skip_lists, depth + 1, runs);
            }
        }
    }

    /// Join runs into normalized text plus the formatting shared by all of it.
    fn join_runs(runs: &[TextRun]) -> (String, Option<Formatting>) {
        let text = normalize_whitespace(&runs.iter().map(|r| r.text.as_str()).collect::<String>());
        let shared = runs
            .iter()
            .filter(|r| !r.text.trim().is_empty())
            .map(|r| r.formatting)
            .reduce(|acc, fmt| Formatting {
                bold: acc.bold && fmt.bold,
                italic: acc.italic && fmt.italic,
                underline: acc.underline && fmt.underline,
                strikethrough: acc.strikethrough && fmt.strikethrough,
            })
            .filter(|fmt| !fmt.is_plain());
        (text, shared)
    }

    /// Build a text-bearing item from runs, or `None` when they are blank.
    fn item_from_runs(
        runs: &[TextRun],
        options: &BackendOptions,
        make: impl FnOnce(String) -> DocItem,
    ) -> Option<DocItem> {
        let (text, formatting) = Self::join_runs(runs);
        if text.is_empty() {
            return None;
        }
        let item = make(text);
        Some(match formatting {
            Some(fmt) if options.extract_formatting => item.with_formatting(fmt),
            _ => item,
        })
    }

    fn inline_item(
        element: ElementRef<'_>,
        depth: usize,
        options: &BackendOptions,
        make: impl FnOnce(String) -> DocItem,
    ) -> Option<DocItem> {
        let mut runs = Vec::new();
        Self::collect_runs(element, Formatting::default(), false, depth, &mut runs);
        Self::item_from_runs(&runs, options, make)
    }

    /// Walk the children of a container element.
    fn walk_children(element: ElementRef<'_>, depth: usize, items: &mut Vec<DocItem>, options: &BackendOptions) {
        let mut pending: Vec<TextRun> = Vec::new();
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                pending.push(TextRun {
                    text: text.to_string(),
                    formatting: Formatting::default(),
                });
            } else if let Some(child_element) = ElementRef::wrap(child) {
                let name = child_element.value().name();
                if name == "br" {
                    pending.push(TextRun {
                        text: "\n".to_string(),
                        formatting: Formatting::default(),
                    });
                } else if Self::is_inline(name) {
                    let wrapper = Self::tag_formatting(name).unwrap_or_default();
                    Self::collect_runs(child_element, wrapper, false, depth + 1, &mut pending);
                } else {
                    Self::flush_pending(&mut pending, items, options);
                    Self::walk_element(child_element, depth + 1, items, options);
                }
            }
        }
        Self::flush_pending(&mut pending, items, options);
    }

    fn flush_pending(pending: &mut Vec<TextRun>, items: &mut Vec<DocItem>, options: &BackendOptions) {
        if let Some(item) = Self::item_from_runs(pending, options, DocItem::paragraph) {
            items.push(item);
        }
        pending.clear();
    }

    fn walk_element(element: ElementRef<'_>, depth: usize, items: &mut Vec<DocItem>, options: &BackendOptions) {
        let name = element.value().name();
        if depth >= MAX_DOM_DEPTH {
            if !Self::is_skipped(name) {
                let text = element_text(&element);
                if !text.is_empty() {
                    items.push(DocItem::paragraph(text));
                }
            }
            return;
        }
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = usize::from(name.as_bytes()[1] - b'0');
                items.extend(Self::inline_item(element, depth, options, |text| DocItem::heading(level, text)));
            }
            "p" | "address" | "summary" | "dt" | "dd" => {
                items.extend(Self::inline_item(element, depth, options, DocItem::paragraph));
            }
            "ul" | "ol" => {
                if let Some(list) = Self::parse_list(element, depth, options) {
                    items.push(list);
                }
            }
            "table" => Self::handle_table(element, items, options),
            "pre" => {
                if element.value().attr("hidden").is_none() {
                    items.extend(Self::handle_code_block(element));
                }
            }
            "img" => items.extend(Self::handle_image(element, options)),
            "figure" => Self::handle_figure(element, depth, items, options),
            "hr" => {}
            _ if Self::is_skipped(name) => {}
            _ => Self::walk_children(element, depth, items, options),
        }
    }

    /// Build a list item tree from a `ul`/`ol` element.
    fn parse_list(element: ElementRef<'_>, depth: usize, options: &BackendOptions) -> Option<DocItem> {
        let ordered = element.value().name() == "ol";
        if depth >= MAX_DOM_DEPTH {
            let text = element_text(&element);
            return (!text.is_empty()).then(|| DocItem::list(ordered, vec![DocItem::list_item(text)]));
        }
        let mut entries = Vec::new();

        for child in element.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "li" => {
                    let mut runs = Vec::new();
                    Self::collect_runs(child, Formatting::default(), true, depth + 1, &mut runs);
                    let nested: Vec<DocItem> = child
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|el| matches!(el.value().name(), "ul" | "ol"))
                        .filter_map(|el| Self::parse_list(el, depth + 2, options))
                        .collect();

                    let entry = Self::item_from_runs(&runs, options, DocItem::list_item)
                        .or_else(|| (!nested.is_empty()).then(|| DocItem::list_item("")));
                    if let Some(entry) = entry {
                        entries.push(if nested.is_empty() {
                            entry
                        } else {
                            entry.with_children(nested)
                        });
                    }
                }
                // malformed markup: a list directly inside a list
                "ul" | "ol" => entries.extend(Self::parse_list(child, depth + 1, options)),
                _ => {}
            }
        }
        (!entries.is_empty()).then(|| DocItem::list(ordered, entries))
    }

    /// Direct rows of a table, looking through `thead`/`tbody`/`tfoot`.
    fn get_direct_rows<'a>(table: ElementRef<'a>) -> Vec<(ElementRef<'a>, bool)> {
        let mut rows = Vec::new();
        for child in table.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "tr" => rows.push((child, false)),
                section @ ("thead" | "tbody" | "tfoot") => {
                    let in_head = section == "thead";
                    rows.extend(
                        child
                            .children()
                            .filter_map(ElementRef::wrap)
                            .filter(|el| el.value().name() == "tr")
                            .map(|tr| (tr, in_head)),
                    );
                }
                _ => {}
            }
        }
        rows
    }

    /// Extract the first number of an attribute value
    #[inline]
    fn extract_num(s: &str) -> Option<usize> {
        let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok().filter(|n| *n > 0)
    }

    fn handle_table(table: ElementRef<'_>, items: &mut Vec<DocItem>, options: &BackendOptions) {
        if !options.extract_tables {
            return;
        }
        let rows: Vec<Vec<TableCell>> = Self::get_direct_rows(table)
            .into_iter()
            .map(|(tr, in_head)| {
                tr.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| matches!(el.value().name(), "td" | "th"))
                    .map(|cell| {
                        let text = element_text(&cell);
                        let attr_num = |name: &str| cell.value().attr(name).and_then(Self::extract_num);
                        let base = if in_head || cell.value().name() == "th" {
                            TableCell::header(text)
                        } else {
                            TableCell::new(text)
                        };
                        base.with_spans(attr_num("rowspan").unwrap_or(1), attr_num("colspan").unwrap_or(1))
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        let table_item = TableItem::new(rows);
        if table_item.is_empty() {
            return;
        }
        log::trace!(
            "HTML table {}x{}",
            table_item.num_rows(),
            table_item.num_cols()
        );
        items.push(DocItem::from(table_item));

        let caption = table
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "caption")
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty());
        if let Some(caption) = caption {
            items.push(DocItem::caption(caption));
        }
    }

    fn handle_code_block(pre: ElementRef<'_>) -> Option<DocItem> {
        let text: String = pre.text().collect();
        let text = text.trim_matches('\n').trim_end();
        if text.trim().is_empty() {
            return None;
        }
        let language = Self::detect_code_language(&pre);
        Some(DocItem::code(text, language.as_deref()))
    }

    fn detect_code_language(pre: &ElementRef<'_>) -> Option<String> {
        let code = selector("code").and_then(|sel| pre.select(&sel).next());
        code.and_then(|el| Self::extract_language_from_classes(el.value().attr("class")))
            .or_else(|| Self::extract_language_from_classes(pre.value().attr("class")))
    }

    /// `language-xxx` / `lang-xxx` class names
    #[inline]
    fn extract_language_from_classes(class_attr: Option<&str>) -> Option<String> {
        class_attr?.split_whitespace().find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|lang| !lang.is_empty())
                .map(ToString::to_string)
        })
    }

    /// Decode a base64 `data:` URL
    fn load_data_url(src: &str) -> Option<Vec<u8>> {
        let (_, encoded) = src.strip_prefix("data:")?.split_once(";base64,")?;
        match base64::engine::general_purpose::STANDARD.decode(encoded.trim()) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to decode base64 image data: {e}");
                None
            }
        }
    }

    fn handle_image(img: ElementRef<'_>, options: &BackendOptions) -> Option<DocItem> {
        let attrs = img.value();
        let src = attrs.attr("src").and_then(non_blank);
        let alt = attrs.attr("alt").and_then(non_blank);
        if src.is_none() && alt.is_none() {
            return None;
        }
        let dimension = |name: &str| attrs.attr(name).and_then(|v| v.trim().trim_end_matches("px").parse().ok());
        let data = if options.extract_images {
            src.as_deref().and_then(Self::load_data_url)
        } else {
            None
        };
        // inline payloads are not repeated as a reference
        let src = src
            .filter(|s| !s.starts_with("data:"))
            .map(|s| resolve_url(options.base_url.as_deref(), &s));
        Some(DocItem::Image(ImageItem {
            src,
            alt,
            width: dimension("width"),
            height: dimension("height"),
            data,
            ..ImageItem::default()
        }))
    }

    fn handle_figure(figure: ElementRef<'_>, depth: usize, items: &mut Vec<DocItem>, options: &BackendOptions) {
        let images: Vec<DocItem> = selector("img")
            .map(|sel| {
                figure
                    .select(&sel)
                    .filter_map(|img| Self::handle_image(img, options))
                    .collect()
            })
            .unwrap_or_default();
        let caption = selector("figcaption")
            .and_then(|sel| figure.select(&sel).next())
            .and_then(|el| Self::inline_item(el, depth + 1, options, DocItem::caption));

        if images.is_empty() && caption.is_none() {
            // figures also wrap quotes or code
            Self::walk_children(figure, depth, items, options);
            return;
        }
        items.extend(images);
        items.extend(caption);
    }

    fn extract_metadata(html: &Html, input: &BackendInput<'_>) -> DocumentMetadata {
        let title = select_first(html, "title")
            .map(|el| element_text(&el))
            .or_else(|| select_attr(html, "meta[property='og:title']", "content"));
        let mut metadata = DocumentMetadata::new(input.display_name(), input.format)
            .with_title(title)
            .with_author(select_attr(html, "meta[name='author']", "content"));
        metadata.description = select_attr(html, "meta[name='description']", "content")
            .or_else(|| select_attr(html, "meta[property='og:description']", "content"));
        metadata.language = select_attr(html, "html", "lang");
        metadata
    }

    /// Video id of a YouTube watch page, if `html` is one.
    fn youtube_video_id(html: &Html, options: &BackendOptions) -> Option<String> {
        let url_id = options
            .url
            .as_deref()
            .or(options.base_url.as_deref())
            .and_then(Self::video_id_from_url);
        let is_youtube = url_id.is_some()
            || select_attr(html, "meta[property='og:site_name']", "content")
                .is_some_and(|site| site.eq_ignore_ascii_case("youtube"));
        if !is_youtube {
            return None;
        }
        url_id
            .or_else(|| select_attr(html, "meta[itemprop='videoId']", "content"))
            .or_else(|| select_attr(html, "meta[itemprop='identifier']", "content"))
            .or_else(|| {
                select_attr(html, "link[rel='canonical']", "href")
                    .as_deref()
                    .and_then(Self::video_id_from_url)
            })
            .or_else(|| {
                select_attr(html, "meta[property='og:url']", "content")
                    .as_deref()
                    .and_then(Self::video_id_from_url)
            })
    }

    fn video_id_from_url(url: &str) -> Option<String> {
        let lower = url.to_ascii_lowercase();
        let id = if lower.contains("youtube.com/watch") {
            let query = url.split_once('?')?.1;
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("v="))
                .map(ToString::to_string)
        } else if let Some(idx) = lower.find("youtu.be/") {
            url[idx + "youtu.be/".len()..]
                .split(['?', '&', '#', '/'])
                .next()
                .map(ToString::to_string)
        } else if let Some(idx) = lower.find("youtube.com/shorts/") {
            url[idx + "youtube.com/shorts/".len()..]
                .split(['?', '&', '#', '/'])
                .next()
                .map(ToString::to_string)
        } else {
            None
        };
        id.filter(|id| !id.is_empty())
    }

    fn format_offset(seconds: f64) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total = seconds.max(0.0) as u64;
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m:02}:{s:02}")
        }
    }

    fn transcript_items(segments: &[TranscriptSegment]) -> Vec<DocItem> {
        let mut items = vec![DocItem::heading(2, "Transcript")];
        items.extend(
            segments
                .iter()
                .filter(|seg| !seg.text.trim().is_empty())
                .map(|seg| {
                    DocItem::paragraph(format!(
                        "[{}] {}",
                        Self::format_offset(seg.start),
                        normalize_whitespace(&seg.text)
                    ))
                    .with_metadata("start", seg.start)
                    .with_metadata("duration", seg.duration)
                }),
        );
        items
    }

    fn convert_youtube(
        &self,
        html: &Html,
        video_id: &str,
        input: &BackendInput<'_>,
        options: &BackendOptions,
    ) -> Document {
        let mut metadata = Self::extract_metadata(html, input);
        let title = select_attr(html, "meta[property='og:title']", "content")
            .or_else(|| select_attr(html, "meta[name='title']", "content"))
            .or_else(|| {
                metadata
                    .title
                    .as_deref()
                    .map(|t| t.trim_end_matches("- YouTube").trim().to_string())
            });
        metadata.title = title.clone().filter(|t| !t.is_empty());

        let channel = select_attr(html, "link[itemprop='name']", "content")
            .or_else(|| select_attr(html, "span[itemprop='author'] link[itemprop='name']", "content"));
        if metadata.author.is_none() {
            metadata.author = channel.clone();
        }
        metadata.created = select_attr(html, "meta[itemprop='uploadDate']", "content")
            .or_else(|| select_attr(html, "meta[itemprop='datePublished']", "content"))
            .as_deref()
            .and_then(parse_datetime);
        metadata.extra.insert("video_id".to_string(), video_id.into());
        for (key, css) in [
            ("channel", None),
            ("duration", Some("meta[itemprop='duration']")),
            ("views", Some("meta[itemprop='interactionCount']")),
            ("keywords", Some("meta[name='keywords']")),
            ("genre", Some("meta[itemprop='genre']")),
        ] {
            let value = match css {
                Some(css) => select_attr(html, css, "content"),
                None => channel.clone(),
            };
            if let Some(value) = value {
                metadata.extra.insert(key.to_string(), value.into());
            }
        }

        let mut content = Vec::new();
        if let Some(title) = &metadata.title {
            content.push(DocItem::title(title.clone()));
        }
        if let Some(channel) = &channel {
            content.push(DocItem::paragraph(format!("Channel: {channel}")));
        }
        if let Some(description) = &metadata.description {
            content.extend(crate::utils::paragraph_items(description, false));
        }

        let mut doc = Document::new(metadata, Vec::new());
        if options.enable_transcript {
            match &self.transcript_fetcher {
                Some(fetcher) => match fetcher.fetch(video_id, options.transcript_language.as_deref()) {
                    Ok(segments) => {
                        log::debug!("Fetched {} transcript segments for {video_id}", segments.len());
                        content.extend(Self::transcript_items(&segments));
                    }
                    Err(e) => {
                        log::warn!("Transcript fetch failed for {video_id}: {e}");
                        doc.warn(format!("Transcript unavailable for video {video_id}: {e}"));
                    }
                },
                None => {
                    log::warn!("Transcript requested but no transcript fetcher is configured");
                    doc.warn("Transcript requested but no transcript fetcher is configured");
                }
            }
        }
        doc.content = content;
        doc
    }
}

impl DocumentBackend for HtmlBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Html]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        !input.data.is_empty() && !input.data.contains(&0)
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let text = input.text();
        let html = Html::parse_document(&text);

        if let Some(video_id) = Self::youtube_video_id(&html, options) {
            log::debug!("Detected YouTube watch page for video {video_id}");
            return Ok(self.convert_youtube(&html, &video_id, input, options));
        }

        let metadata = Self::extract_metadata(&html, input);
        let mut content = Vec::new();
        let body = select_first(&html, "body").unwrap_or_else(|| html.root_element());
        Self::walk_children(body, 0, &mut content, options);

        // page title only repeated when the body does not open with it
        if let Some(title) = &metadata.title {
            let first_h1 = content
                .iter()
                .find(|item| item.kind() == "heading" && item.level() == Some(1))
                .and_then(DocItem::text);
            if first_h1 != Some(title.as_str()) {
                content.insert(0, DocItem::title(title.clone()));
            }
        }
        log::debug!("HTML produced {} top-level items", content.len());
        Ok(Document::new(metadata, content))
    }
}
