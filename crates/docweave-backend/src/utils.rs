//! Shared utility functions for backend implementations.
//!
//! This module provides common helpers to reduce code duplication across
//! different document backend implementations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use docweave_core::DocItem;
use scraper::Html;

// ========== Image MIME Type Constants ==========

/// MIME type for PNG images.
pub const MIME_IMAGE_PNG: &str = "image/png";

/// MIME type for JPEG images.
pub const MIME_IMAGE_JPEG: &str = "image/jpeg";

/// MIME type for GIF images.
pub const MIME_IMAGE_GIF: &str = "image/gif";

/// MIME type for BMP images.
pub const MIME_IMAGE_BMP: &str = "image/bmp";

/// MIME type for TIFF images.
pub const MIME_IMAGE_TIFF: &str = "image/tiff";

/// MIME type for WebP images.
pub const MIME_IMAGE_WEBP: &str = "image/webp";

/// Default MIME type for generic binary data.
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// Extensions whose content is shown verbatim when an archive entry cannot
/// be converted.
pub const TEXT_LIKE_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "json", "xml", "html", "htm", "yaml", "yml", "log", "ini", "cfg", "toml",
    "py", "rs", "js", "ts", "sh",
];

/// Detect image MIME type from a file extension.
///
/// # Examples
///
/// ```
/// use docweave_backend::utils::{mime_type_from_extension, MIME_IMAGE_PNG, MIME_OCTET_STREAM};
///
/// assert_eq!(mime_type_from_extension("png", MIME_OCTET_STREAM), MIME_IMAGE_PNG);
/// assert_eq!(mime_type_from_extension("PNG", MIME_OCTET_STREAM), MIME_IMAGE_PNG);
/// assert_eq!(mime_type_from_extension("unknown", MIME_OCTET_STREAM), MIME_OCTET_STREAM);
/// ```
#[inline]
#[must_use = "returns the detected MIME type"]
pub fn mime_type_from_extension<'a>(extension: &str, fallback: &'a str) -> &'a str {
    if extension.eq_ignore_ascii_case("png") {
        MIME_IMAGE_PNG
    } else if extension.eq_ignore_ascii_case("jpg") || extension.eq_ignore_ascii_case("jpeg") {
        MIME_IMAGE_JPEG
    } else if extension.eq_ignore_ascii_case("gif") {
        MIME_IMAGE_GIF
    } else if extension.eq_ignore_ascii_case("bmp") {
        MIME_IMAGE_BMP
    } else if extension.eq_ignore_ascii_case("tif") || extension.eq_ignore_ascii_case("tiff") {
        MIME_IMAGE_TIFF
    } else if extension.eq_ignore_ascii_case("webp") {
        MIME_IMAGE_WEBP
    } else {
        fallback
    }
}

/// Lower-cased extension of a `/`-separated entry path.
#[inline]
#[must_use = "returns the extension if present"]
pub fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether `name` has one of [`TEXT_LIKE_EXTENSIONS`].
#[inline]
#[must_use = "returns whether the name has a text-like extension"]
pub fn is_text_like(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| TEXT_LIKE_EXTENSIONS.contains(&ext.as_str()))
}

/// Collapse every run of whitespace into a single space and trim.
#[must_use = "returns the normalized text"]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into blank-line separated paragraphs.
///
/// With `preserve` set, paragraph text is kept verbatim (minus trailing
/// whitespace); otherwise inner whitespace is collapsed.
#[must_use = "returns the paragraphs"]
pub fn split_paragraphs(text: &str, preserve: bool) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut flush = |current: &mut Vec<&str>| {
        if current.is_empty() {
            return;
        }
        let joined = if preserve {
            current.join("\n").trim_end().to_string()
        } else {
            normalize_whitespace(&current.join(" "))
        };
        if !joined.trim().is_empty() {
            paragraphs.push(joined);
        }
        current.clear();
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut current);
        } else {
            current.push(line);
        }
    }
    flush(&mut current);
    paragraphs
}

/// Paragraph items for each blank-line separated block of `text`.
#[must_use = "returns the paragraph items"]
pub fn paragraph_items(text: &str, preserve: bool) -> Vec<DocItem> {
    split_paragraphs(text, preserve)
        .into_iter()
        .map(DocItem::paragraph)
        .collect()
}

/// Reduce an HTML fragment to its normalized text.
///
/// # Examples
///
/// ```
/// use docweave_backend::utils::html_to_text;
///
/// assert_eq!(html_to_text("<p>Hello <b>world</b></p>"), "Hello world");
/// assert_eq!(html_to_text("plain"), "plain");
/// ```
#[must_use = "returns the extracted text"]
pub fn html_to_text(fragment: &str) -> String {
    if !fragment.contains('<') {
        return normalize_whitespace(fragment);
    }
    let parsed = Html::parse_fragment(fragment);
    let text: Vec<&str> = parsed.root_element().text().collect();
    normalize_whitespace(&text.join(" "))
}

/// Parse the date formats found in feeds and document properties.
///
/// Accepts RFC 3339 / W3CDTF (`2024-01-02T03:04:05Z`), RFC 2822
/// (`Tue, 02 Jan 2024 03:04:05 +0000`), naive date-times and plain dates.
#[must_use = "returns the parsed timestamp if recognized"]
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `Some(text)` when `text` is not blank, trimmed.
#[inline]
#[must_use = "returns the trimmed text if non-blank"]
pub fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_from_extension("JPEG", MIME_OCTET_STREAM), MIME_IMAGE_JPEG);
        assert_eq!(mime_type_from_extension("tif", MIME_OCTET_STREAM), MIME_IMAGE_TIFF);
        assert_eq!(mime_type_from_extension("webp", MIME_OCTET_STREAM), MIME_IMAGE_WEBP);
        assert_eq!(mime_type_from_extension("xyz", "x"), "x");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("dir/Notes.TXT").as_deref(), Some("txt"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of(".bashrc"), None);
        assert_eq!(extension_of("dir.d/file"), None);
    }

    #[test]
    fn test_is_text_like() {
        assert!(is_text_like("src/main.rs"));
        assert!(is_text_like("config.YML"));
        assert!(!is_text_like("photo.png"));
        assert!(!is_text_like("README"));
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "first line\ncontinues here\n\n\n  second   para \n";
        assert_eq!(
            split_paragraphs(text, false),
            vec!["first line continues here", "second para"]
        );
        assert_eq!(
            split_paragraphs(text, true),
            vec!["first line\ncontinues here", "  second   para"]
        );
        assert!(split_paragraphs("  \n\n \t\n", false).is_empty());
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(html_to_text("<p>A &amp; B</p>\n<p>C</p>"), "A & B C");
        assert_eq!(html_to_text("  spaced   out "), "spaced out");
    }

    #[test]
    fn test_parse_datetime_variants() {
        let rfc3339 = parse_datetime("2024-03-05T10:20:30Z").unwrap();
        assert_eq!((rfc3339.year(), rfc3339.month(), rfc3339.day()), (2024, 3, 5));

        let rfc2822 = parse_datetime("Tue, 05 Mar 2024 10:20:30 +0200").unwrap();
        assert_eq!(rfc2822.hour(), 8);

        let date = parse_datetime("2024-03-05").unwrap();
        assert_eq!(date.hour(), 0);

        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("  ").is_none());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  x "), Some("x".to_string()));
        assert_eq!(non_blank(" \n"), None);
    }
}
