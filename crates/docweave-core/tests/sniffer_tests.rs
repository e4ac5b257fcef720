//! Integration tests for format detection
//!
//! Exercises `sniff::detect` on realistic document heads for every content
//! signature, in the order the rules apply.

use docweave_core::sniff::{detect, detect_source};
use docweave_core::InputFormat;
use std::path::Path;

const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Release notes</title>
    <item><title>v1.0</title></item>
  </channel>
</rss>"#;

const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Feed</title>
</feed>"#;

const BING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head><title>rust - Search</title>
<link rel="canonical" href="https://www.bing.com/search?q=rust"/></head>
<body><ol id="b_results"><li class="b_algo"><h2><a href="https://www.rust-lang.org/">Rust</a></h2></li></ol></body></html>"#;

const NOTEBOOK: &str = r##"{
 "cells": [{"cell_type": "markdown", "metadata": {}, "source": ["# Analysis"]}],
 "metadata": {"kernelspec": {"language": "python"}},
 "nbformat": 4,
 "nbformat_minor": 5
}"##;

#[test]
fn test_txt_extension_beats_rss_content() {
    assert_eq!(detect(RSS_FEED.as_bytes(), Some("feed.txt")), Some(InputFormat::Text));
}

#[test]
fn test_feeds_by_content() {
    assert_eq!(detect(RSS_FEED.as_bytes(), None), Some(InputFormat::Rss));
    assert_eq!(detect(ATOM_FEED.as_bytes(), None), Some(InputFormat::Atom));
}

#[test]
fn test_feed_root_after_long_prolog() {
    let license = "Licensed under the Apache License, Version 2.0. ".repeat(200);
    let rss = format!(
        "<?xml version=\"1.0\"?>\n<?xml-stylesheet type=\"text/xsl\" href=\"feed.xsl\"?>\n\
         <!-- {license} -->\n<rss version=\"2.0\"><channel><title>Late</title></channel></rss>"
    );
    assert!(rss.find("<rss").unwrap() > 8 * 1024);
    assert_eq!(detect(rss.as_bytes(), None), Some(InputFormat::Rss));

    let atom = format!(
        "<?xml version=\"1.0\"?>\n<!-- {license} -->\n<feed xmlns=\"http://www.w3.org/2005/Atom\"></feed>"
    );
    assert_eq!(detect(atom.as_bytes(), None), Some(InputFormat::Atom));
}

#[test]
fn test_bing_serp_by_content() {
    assert_eq!(detect(BING_PAGE.as_bytes(), None), Some(InputFormat::BingSerp));
    assert_eq!(
        detect(BING_PAGE.as_bytes(), Some("results.html")),
        Some(InputFormat::Html),
        "extension lookup never yields BING_SERP"
    );
}

#[test]
fn test_notebook_by_content() {
    assert_eq!(detect(NOTEBOOK.as_bytes(), None), Some(InputFormat::Ipynb));
}

#[test]
fn test_csv_five_lines_three_commas() {
    let csv = "a,b,c,d\n1,2,3,4\n5,6,7,8\n9,10,11,12\n13,14,15,16\n";
    assert_eq!(detect(csv.as_bytes(), None), Some(InputFormat::Csv));
}

#[test]
fn test_csv_ragged_rejected() {
    let ragged = "a,b,c,d\n1,2,3,4\n1,2,3,4,5,6\n1,2,3,4\n";
    assert_eq!(detect(ragged.as_bytes(), None), None);
}

#[test]
fn test_pk_without_office_markers_is_zip() {
    let mut bytes = b"PK\x03\x04\x14\x00\x00\x00".to_vec();
    bytes.extend_from_slice(b"images/photo.png");
    assert_eq!(detect(&bytes, None), Some(InputFormat::Zip));
}

#[test]
fn test_pk_with_word_marker_is_docx() {
    let mut bytes = b"PK\x03\x04\x14\x00\x00\x00".to_vec();
    bytes.extend_from_slice(b"[Content_Types].xml word/document.xml");
    assert_eq!(detect(&bytes, None), Some(InputFormat::Docx));
}

#[test]
fn test_random_bytes_undetected() {
    let bytes: Vec<u8> = (0u32..512)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8 | 0x80)
        .collect();
    assert_eq!(detect(&bytes, None), None);
}

#[test]
fn test_path_consulted_after_filename() {
    let path = Path::new("archive/bundle.zip");
    assert_eq!(
        detect_source(b"", Some("no-extension"), Some(path)),
        Some(InputFormat::Zip)
    );
    assert_eq!(
        detect_source(b"", Some("slides.pptx"), Some(path)),
        Some(InputFormat::Pptx)
    );
}

#[test]
fn test_srt_requires_timestamp_line() {
    assert_eq!(
        detect(b"1\n00:00:00,500 --> 00:00:02,000\nHi\n", None),
        Some(InputFormat::Subtitle)
    );
    assert_eq!(detect(b"1\nnot a timestamp\n", None), None);
}
