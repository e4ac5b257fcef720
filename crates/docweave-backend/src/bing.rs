//! Bing search-result page backend
//!
//! Reduces a saved Bing SERP to the query and its organic results
//! (`li.b_algo`). Ads, answers and navigation are dropped.

use crate::html::{element_text, select_attr, select_first, selector};
use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::non_blank;
use docweave_core::{DocItem, Document, DocumentMetadata, InputFormat, Result};
use scraper::{ElementRef, Html};

/// One organic search result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SearchResult {
    title: String,
    url: Option<String>,
    display_url: Option<String>,
    snippet: Option<String>,
}

/// Bing SERP backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BingSerpBackend;

impl BingSerpBackend {
    /// Create a new Bing SERP backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    fn query(html: &Html) -> Option<String> {
        select_attr(html, "input#sb_form_q", "value")
            .or_else(|| select_attr(html, "textarea#sb_form_q", "value"))
            .or_else(|| select_first(html, "textarea#sb_form_q").and_then(|el| non_blank(&element_text(&el))))
            .or_else(|| {
                let title = element_text(&select_first(html, "title")?);
                let query = title
                    .strip_suffix("- Bing")
                    .or_else(|| title.strip_suffix("- Search"))
                    .unwrap_or(&title);
                non_blank(query)
            })
    }

    fn parse_result(result: ElementRef<'_>) -> Option<SearchResult> {
        let heading = selector("h2").and_then(|sel| result.select(&sel).next())?;
        let title = element_text(&heading);
        if title.is_empty() {
            return None;
        }
        let url = selector("a[href]")
            .and_then(|sel| heading.select(&sel).next())
            .and_then(|a| a.value().attr("href"))
            .and_then(non_blank);
        let display_url = selector("cite")
            .and_then(|sel| result.select(&sel).next())
            .map(|el| element_text(&el))
            .filter(|s| !s.is_empty());
        let snippet = selector(".b_caption p, p.b_lineclamp2, p.b_lineclamp3, p.b_lineclamp4, p")
            .and_then(|sel| result.select(&sel).next())
            .map(|el| element_text(&el))
            .filter(|s| !s.is_empty());
        Some(SearchResult {
            title,
            url,
            display_url,
            snippet,
        })
    }

    fn result_item(result: SearchResult, rank: usize) -> DocItem {
        let mut children = vec![DocItem::heading(2, result.title)];
        if let Some(url) = result.url.as_ref().or(result.display_url.as_ref()) {
            children.push(DocItem::paragraph(url.clone()));
        }
        if let Some(snippet) = result.snippet {
            children.push(DocItem::paragraph(snippet));
        }
        let section = DocItem::section(children).with_metadata("rank", rank);
        match result.url {
            Some(url) => section.with_metadata("url", url),
            None => section,
        }
    }
}

impl DocumentBackend for BingSerpBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::BingSerp]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        !input.data.is_empty() && !input.data.contains(&0)
    }

    fn convert(&self, input: &BackendInput<'_>, _options: &BackendOptions) -> Result<Document> {
        let text = input.text();
        let html = Html::parse_document(&text);
        let query = Self::query(&html);

        let results: Vec<SearchResult> = selector("li.b_algo")
            .map(|sel| html.select(&sel).filter_map(Self::parse_result).collect())
            .unwrap_or_default();
        log::debug!("Bing SERP with {} organic results", results.len());

        let mut metadata = DocumentMetadata::new(input.display_name(), InputFormat::BingSerp)
            .with_title(query.clone())
            .with_extra("result_count", results.len());
        if let Some(query) = &query {
            metadata = metadata.with_extra("query", query.clone());
        }
        metadata.language = select_attr(&html, "html", "lang");

        let mut content = Vec::with_capacity(results.len() + 1);
        if let Some(query) = query {
            content.push(DocItem::heading(1, format!("Search results: {query}")));
        }
        content.extend(
            results
                .into_iter()
                .enumerate()
                .map(|(i, result)| Self::result_item(result, i + 1)),
        );

        let mut doc = Document::new(metadata, content);
        if doc.metadata.extra.get("result_count").and_then(|v| v.as_i64()) == Some(0) {
            doc.warn("No organic results found on search page");
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERP: &str = r#"<!DOCTYPE html><html lang="en"><head><title>rust ownership - Search</title></head>
<body><form id="sb_form" action="https://www.bing.com/search"><input id="sb_form_q" name="q" value="rust ownership"></form>
<ol id="b_results">
  <li class="b_algo"><h2><a href="https://doc.rust-lang.org/book/ch04-01.html">What is Ownership?</a></h2>
    <div class="b_caption"><cite>doc.rust-lang.org</cite><p>Ownership is a set of rules.</p></div></li>
  <li class="b_ad"><h2><a href="https://ads.example">Ad</a></h2></li>
  <li class="b_algo"><h2><a href="https://example.com/borrow">Borrowing explained</a></h2></li>
</ol></body></html>"#;

    fn convert(html: &str) -> Document {
        let input = BackendInput::new(html.as_bytes(), InputFormat::BingSerp);
        BingSerpBackend::new()
            .convert(&input, &BackendOptions::default())
            .unwrap()
    }

    #[test]
    fn test_query_and_results() {
        let doc = convert(SERP);
        assert_eq!(doc.metadata.title.as_deref(), Some("rust ownership"));
        assert_eq!(doc.metadata.extra["result_count"].as_i64(), Some(2));
        assert_eq!(doc.content.len(), 3);
        assert_eq!(doc.content[0], DocItem::heading(1, "Search results: rust ownership"));

        let first = &doc.content[1];
        assert_eq!(first.kind(), "section");
        assert_eq!(
            first.children(),
            &[
                DocItem::heading(2, "What is Ownership?"),
                DocItem::paragraph("https://doc.rust-lang.org/book/ch04-01.html"),
                DocItem::paragraph("Ownership is a set of rules."),
            ]
        );
        assert_eq!(first.metadata_value("rank").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(doc.content[2].children().len(), 2, "no snippet");
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_query_from_title() {
        let doc = convert("<html><head><title>tokio runtime - Bing</title></head><body></body></html>");
        assert_eq!(doc.metadata.title.as_deref(), Some("tokio runtime"));
        assert_eq!(doc.warnings.len(), 1);
    }
}
