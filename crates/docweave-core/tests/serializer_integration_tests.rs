//! Integration tests for the Markdown and JSON serializers
//!
//! These tests render documents shaped like real backend output, not just the
//! single-item cases covered by unit tests.

use docweave_core::{
    DocItem, Document, DocumentMetadata, Formatting, HeadingStyle, ImageItem, InputFormat,
    JsonOptions, JsonSerializer, MarkdownOptions, MarkdownSerializer, TableItem,
};

fn report() -> Document {
    let mut metadata = DocumentMetadata::new("report.docx", InputFormat::Docx)
        .with_title(Some("Quarterly Report"))
        .with_author(Some("Finance"));
    metadata.num_pages = Some(3);

    Document::new(
        metadata,
        vec![
            DocItem::title("Quarterly Report"),
            DocItem::heading(2, "Summary"),
            DocItem::paragraph("Revenue grew.").with_formatting(Formatting::BOLD),
            DocItem::list(
                false,
                vec![DocItem::list_item("North"), DocItem::list_item("South")],
            ),
            TableItem::from_text_rows(
                vec![
                    vec!["Region".into(), "Q1".into()],
                    vec!["North".into(), "10".into()],
                ],
                true,
            )
            .into(),
            DocItem::Image(ImageItem {
                src: Some("media/chart.png".into()),
                alt: Some("Chart".into()),
                ..ImageItem::default()
            }),
        ],
    )
}

#[test]
fn test_markdown_full_document() {
    let markdown = MarkdownSerializer::new().serialize(&report());
    let expected = "# Quarterly Report\n\n\
                    ## Summary\n\n\
                    **Revenue grew.**\n\n\
                    - North\n- South\n\n\
                    | Region | Q1 |\n| --- | --- |\n| North | 10 |\n\n\
                    ![Chart](media/chart.png)";
    assert_eq!(markdown, expected);
}

#[test]
fn test_markdown_with_frontmatter_and_setext() {
    let options = MarkdownOptions::default()
        .with_include_metadata(true)
        .with_heading_style(HeadingStyle::Setext);
    let markdown = MarkdownSerializer::with_options(options).serialize(&report());

    assert!(markdown.starts_with(
        "---\nfilename: \"report.docx\"\nformat: \"DOCX\"\ntitle: \"Quarterly Report\"\nauthor: \"Finance\"\nnum_pages: 3\n---\n\n"
    ));
    assert!(markdown.contains("Quarterly Report\n================\n\nSummary\n-------"));
}

#[test]
fn test_json_envelope_and_content() {
    let value = JsonSerializer::new().to_value(&report()).expect("serializes");
    assert_eq!(value["metadata"]["author"], "Finance");
    assert_eq!(value["metadata"]["num_pages"], 3);

    let content = value["content"].as_array().expect("content array");
    assert_eq!(content.len(), 6);
    assert_eq!(content[4]["type"], "table");
    assert_eq!(content[4]["num_rows"], 2);
    assert_eq!(content[4]["num_cols"], 2);
    assert_eq!(content[4]["rows"][0][0]["is_header"], true);
    assert!(content[4]["rows"][1][0].get("is_header").is_none());
    assert_eq!(content[3]["metadata"]["ordered"], false);
}

#[test]
fn test_json_compact_without_metadata() {
    let serializer = JsonSerializer::with_options(JsonOptions {
        pretty: false,
        include_metadata: false,
    });
    let json = serializer.serialize(&report()).expect("serializes");
    assert!(json.starts_with("{\"content\":["));
    assert!(!json.contains("Finance"));
}

#[test]
fn test_document_roundtrip_through_json() {
    let doc = report();
    let json = serde_json::to_string(&doc).expect("serializes");
    let back: Document = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(back, doc);
}
