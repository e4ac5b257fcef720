//! Format sniffing
//!
//! Detection order:
//! 1. extension of the supplied filename,
//! 2. extension of the source path,
//! 3. content signatures, first match wins.
//!
//! Nothing is ever defaulted: content that matches no rule yields `None`.

use crate::format::InputFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Number of non-blank lines inspected by the CSV heuristic.
pub const CSV_SAMPLE_LINES: usize = 5;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const UTF8_BOM: char = '\u{feff}';

static SRT_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+[ \t]*\r?\n\d{2}:\d{2}:\d{2}[,.]\d{3}[ \t]*-->")
        .expect("static SRT regex is valid")
});

/// Detects the format of `bytes`, preferring the extension of `filename`.
///
/// # Examples
///
/// ```rust
/// use docweave_core::{sniff, InputFormat};
///
/// assert_eq!(sniff::detect(b"%PDF-1.7", None), Some(InputFormat::Pdf));
/// assert_eq!(sniff::detect(b"<rss/>", Some("feed.txt")), Some(InputFormat::Text));
/// assert_eq!(sniff::detect(&[0x00, 0xff, 0x13], None), None);
/// ```
#[must_use = "returns the detected format, if any"]
pub fn detect(bytes: &[u8], filename: Option<&str>) -> Option<InputFormat> {
    detect_source(bytes, filename, None)
}

/// Like [`detect`], additionally consulting the extension of the source path
/// when the filename has no known extension.
#[must_use = "returns the detected format, if any"]
pub fn detect_source(
    bytes: &[u8],
    filename: Option<&str>,
    path: Option<&Path>,
) -> Option<InputFormat> {
    if let Some(format) = filename.and_then(InputFormat::from_path) {
        log::debug!("Detected {format} from filename extension");
        return Some(format);
    }
    if let Some(format) = path.and_then(InputFormat::from_path) {
        log::debug!("Detected {format} from path extension");
        return Some(format);
    }
    let detected = detect_content(bytes);
    match detected {
        Some(format) => log::debug!("Detected {format} from content signature"),
        None => log::debug!("No content signature matched ({} bytes)", bytes.len()),
    }
    detected
}

/// Content-only detection (no extension lookup).
#[must_use = "returns the detected format, if any"]
pub fn detect_content(bytes: &[u8]) -> Option<InputFormat> {
    if bytes.starts_with(PDF_MAGIC) {
        return Some(InputFormat::Pdf);
    }
    if bytes.starts_with(ZIP_MAGIC) {
        return Some(classify_zip(bytes));
    }

    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim_start_matches(UTF8_BOM).trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let head: String = trimmed.chars().take(16).collect::<String>().to_ascii_lowercase();

    if head.starts_with("<html") || head.starts_with("<!doctype") {
        return Some(if is_bing_serp(&text) {
            InputFormat::BingSerp
        } else {
            InputFormat::Html
        });
    }

    if trimmed.starts_with("WEBVTT") || SRT_HEAD.is_match(trimmed) {
        return Some(InputFormat::Subtitle);
    }

    if trimmed.starts_with('<') {
        let lower = trimmed.to_ascii_lowercase();
        return Some(if lower.contains("<rss") {
            InputFormat::Rss
        } else if lower.contains("<feed") {
            InputFormat::Atom
        } else {
            InputFormat::Xml
        });
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            let is_notebook = value
                .get("cells")
                .is_some_and(serde_json::Value::is_array);
            return Some(if is_notebook {
                InputFormat::Ipynb
            } else {
                InputFormat::Json
            });
        }
    }

    if looks_like_csv(bytes) {
        return Some(InputFormat::Csv);
    }

    None
}

/// OOXML packages are told apart from plain ZIPs by their part-name prefixes.
fn classify_zip(bytes: &[u8]) -> InputFormat {
    let text = String::from_utf8_lossy(bytes);
    if text.contains("word/") {
        InputFormat::Docx
    } else if text.contains("ppt/") {
        InputFormat::Pptx
    } else if text.contains("xl/") {
        InputFormat::Xlsx
    } else {
        InputFormat::Zip
    }
}

fn is_bing_serp(text: &str) -> bool {
    text.contains("bing.com")
        && (text.contains("b_results")
            || text.contains("b_algo")
            || text.contains("sb_form")
            || text.contains("b_searchbox"))
}

/// CSV heuristic over the first [`CSV_SAMPLE_LINES`] non-blank lines: the
/// first line has at least one comma and every sampled line's comma count is
/// within one of it. Input must be valid UTF-8 without control characters.
#[must_use = "returns whether the content looks like CSV"]
pub fn looks_like_csv(bytes: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return false;
    };
    let text = text.trim_start_matches(UTF8_BOM);
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(CSV_SAMPLE_LINES)
        .collect();
    let Some(first) = lines.first() else {
        return false;
    };
    if lines
        .iter()
        .any(|line| line.chars().any(|c| c.is_control() && c != '\t' && c != '\r'))
    {
        return false;
    }
    let expected = first.matches(',').count();
    if expected == 0 {
        return false;
    }
    lines
        .iter()
        .all(|line| line.matches(',').count().abs_diff(expected) <= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_wins_over_content() {
        let rss = b"<?xml version=\"1.0\"?><rss version=\"2.0\"></rss>";
        assert_eq!(detect(rss, Some("notes.txt")), Some(InputFormat::Text));
        assert_eq!(detect(rss, None), Some(InputFormat::Rss));
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(detect(b"", Some("REPORT.PDF")), Some(InputFormat::Pdf));
        assert_eq!(detect(b"", Some("clip.VTT")), Some(InputFormat::Subtitle));
    }

    #[test]
    fn test_path_extension_used_when_filename_unknown() {
        let path = Path::new("/tmp/data/table.csv");
        assert_eq!(
            detect_source(b"??", Some("blob"), Some(path)),
            Some(InputFormat::Csv)
        );
    }

    #[test]
    fn test_pdf_magic() {
        assert_eq!(detect(b"%PDF-1.4\n...", None), Some(InputFormat::Pdf));
    }

    #[test]
    fn test_zip_disambiguation() {
        let mut docx = b"PK\x03\x04....".to_vec();
        docx.extend_from_slice(b"word/document.xml");
        assert_eq!(detect(&docx, None), Some(InputFormat::Docx));

        let mut pptx = b"PK\x03\x04".to_vec();
        pptx.extend_from_slice(b"ppt/slides/slide1.xml");
        assert_eq!(detect(&pptx, None), Some(InputFormat::Pptx));

        let mut xlsx = b"PK\x03\x04".to_vec();
        xlsx.extend_from_slice(b"xl/workbook.xml");
        assert_eq!(detect(&xlsx, None), Some(InputFormat::Xlsx));

        let mut zip = b"PK\x03\x04".to_vec();
        zip.extend_from_slice(b"docs/readme.txt");
        assert_eq!(detect(&zip, None), Some(InputFormat::Zip));
    }

    #[test]
    fn test_html_and_bing() {
        assert_eq!(
            detect(b"\xef\xbb\xbf  <!DOCTYPE html><html></html>", None),
            Some(InputFormat::Html)
        );
        assert_eq!(detect(b"<HTML><body>x</body>", None), Some(InputFormat::Html));
        let serp = b"<!doctype html><html><form id=\"sb_form\" action=\"https://www.bing.com/search\"></form></html>";
        assert_eq!(detect(serp, None), Some(InputFormat::BingSerp));
        let no_marker = b"<html><a href=\"https://www.bing.com\">bing</a></html>";
        assert_eq!(detect(no_marker, None), Some(InputFormat::Html));
    }

    #[test]
    fn test_subtitles() {
        assert_eq!(
            detect(b"WEBVTT\n\n00:00.000 --> 00:01.000\nhi", None),
            Some(InputFormat::Subtitle)
        );
        assert_eq!(
            detect(b"1\n00:00:01,000 --> 00:00:02,500\nHello\n", None),
            Some(InputFormat::Subtitle)
        );
        assert_eq!(
            detect(b"1\r\n00:00:01,000 --> 00:00:02,500\r\nHello\r\n", None),
            Some(InputFormat::Subtitle)
        );
    }

    #[test]
    fn test_xml_family() {
        assert_eq!(
            detect(b"<?xml version=\"1.0\"?><feed xmlns=\"http://www.w3.org/2005/Atom\"/>", None),
            Some(InputFormat::Atom)
        );
        assert_eq!(detect(b"<catalog><book/></catalog>", None), Some(InputFormat::Xml));
    }

    #[test]
    fn test_json_and_notebook() {
        assert_eq!(detect(b"{\"a\": 1}", None), Some(InputFormat::Json));
        assert_eq!(detect(b"[1, 2, 3]", None), Some(InputFormat::Json));
        assert_eq!(
            detect(b"{\"cells\": [], \"nbformat\": 4}", None),
            Some(InputFormat::Ipynb)
        );
        assert_eq!(
            detect(b"{\"cells\": \"not an array\"}", None),
            Some(InputFormat::Json)
        );
    }

    #[test]
    fn test_invalid_json_falls_through_to_csv() {
        assert_eq!(detect(b"[a,b\n1,2\n", None), Some(InputFormat::Csv));
    }

    #[test]
    fn test_csv_heuristic() {
        let uniform = b"a,b,c,d\n1,2,3,4\n5,6,7,8\n9,10,11,12\n13,14,15,16\n";
        assert_eq!(detect(uniform, None), Some(InputFormat::Csv));

        let ragged = b"a,b,c,d\n1,2,3,4\n1,2,3,4,5,6\n1,2,3,4\n";
        assert!(!looks_like_csv(ragged));
        assert_eq!(detect(ragged, None), None);

        let within_one = b"a,b,c\n1,2\n1,2,3,4\n";
        assert!(looks_like_csv(within_one));

        assert!(!looks_like_csv(b"no commas here\nat all\n"));
    }

    #[test]
    fn test_csv_only_samples_first_lines() {
        let text = b"a,b\n1,2\n3,4\n5,6\n7,8\nthis line, has, many, commas, ok\n";
        assert!(looks_like_csv(text));
    }

    #[test]
    fn test_no_match_is_none() {
        assert_eq!(detect(b"", None), None);
        assert_eq!(detect(b"   \n  ", None), None);
        assert_eq!(detect(b"plain prose without structure", None), None);
        assert_eq!(detect(&[0x89, 0x00, 0xfe, 0x2c, 0x0a, 0x2c], None), None);
    }
}
