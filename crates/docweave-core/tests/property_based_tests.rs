//! Property-Based Tests
//!
//! Tests using property-based testing (proptest) to verify invariants:
//! - Table dimensions always match the cell grid
//! - Serialization is deterministic and never panics
//! - Extension-based detection always beats content
//!
//! These tests complement unit tests by exploring the input space automatically.

use docweave_core::content::{DocItem, TableCell, TableItem};
use docweave_core::document::{Document, DocumentMetadata};
use docweave_core::format::InputFormat;
use docweave_core::serializer::{JsonSerializer, MarkdownSerializer};
use docweave_core::sniff;
use proptest::prelude::*;

fn grid() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-z|]{0,5}", 0..6), 0..8)
}

fn to_table(rows: Vec<Vec<String>>) -> TableItem {
    TableItem::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(TableCell::new).collect())
            .collect(),
    )
}

// ============================================================================
// Table Properties
// ============================================================================

/// Property: `num_rows`/`num_cols` always equal the grid's shape
#[test]
fn proptest_table_dimensions() {
    proptest!(|(rows in grid())| {
        let expected_rows = rows.len();
        let expected_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let table = to_table(rows);

        prop_assert_eq!(table.num_rows(), expected_rows);
        prop_assert_eq!(table.num_cols(), expected_cols);
        prop_assert_eq!(table.rows().len(), table.num_rows());
    });
}

/// Property: JSON round-trip of a table preserves cells and dimensions
#[test]
fn proptest_table_json_roundtrip() {
    proptest!(|(rows in grid())| {
        let item = DocItem::Table(to_table(rows));
        let json = serde_json::to_string(&item).expect("table serializes");
        let back: DocItem = serde_json::from_str(&json).expect("table deserializes");
        prop_assert_eq!(back, item);
    });
}

/// Property: a rendered table has one line per row plus the separator
#[test]
fn proptest_table_markdown_shape() {
    proptest!(|(rows in grid())| {
        let table = to_table(rows);
        let doc = Document::new(
            DocumentMetadata::new("t.csv", InputFormat::Csv),
            vec![DocItem::Table(table.clone())],
        );
        let markdown = MarkdownSerializer::new().serialize(&doc);
        if table.num_cols() == 0 {
            prop_assert!(markdown.is_empty());
        } else {
            prop_assert_eq!(markdown.lines().count(), table.num_rows() + 1);
            let separator = markdown.lines().nth(1).unwrap_or_default();
            prop_assert_eq!(separator.matches("---").count(), table.num_cols());
        }
    });
}

// ============================================================================
// Serialization Properties
// ============================================================================

/// Property: Markdown output is a pure function of the document
#[test]
fn proptest_markdown_deterministic() {
    proptest!(|(parts in prop::collection::vec((0u8..4, "\\PC{0,40}"), 0..12))| {
        let content = parts
            .into_iter()
            .map(|(kind, text)| match kind {
                0 => DocItem::heading(2, text),
                1 => DocItem::list(true, vec![DocItem::list_item(text)]),
                2 => DocItem::code(text, Some("txt")),
                _ => DocItem::paragraph(text),
            })
            .collect();
        let doc = Document::new(DocumentMetadata::new("d.txt", InputFormat::Text), content);
        let serializer = MarkdownSerializer::new();
        prop_assert_eq!(serializer.serialize(&doc), serializer.serialize(&doc.clone()));
    });
}

/// Property: content JSON always parses back into the same items
#[test]
fn proptest_json_content_roundtrip() {
    proptest!(|(texts in prop::collection::vec("\\PC{0,60}", 0..10))| {
        let content = texts.into_iter().map(DocItem::paragraph).collect();
        let doc = Document::new(DocumentMetadata::new("p.txt", InputFormat::Text), content);

        let value = JsonSerializer::content_value(&doc).expect("content serializes");
        let items: Vec<DocItem> = serde_json::from_value(value).expect("content parses");
        prop_assert_eq!(items, doc.content);
    });
}

// ============================================================================
// Sniffer Properties
// ============================================================================

/// Property: a known extension decides the format regardless of content
#[test]
fn proptest_extension_beats_content() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..256))| {
        prop_assert_eq!(sniff::detect(&bytes, Some("input.txt")), Some(InputFormat::Text));
        prop_assert_eq!(sniff::detect(&bytes, Some("input.XLSX")), Some(InputFormat::Xlsx));
    });
}

/// Property: uniform comma-separated lines are detected as CSV
#[test]
fn proptest_uniform_csv_detected() {
    proptest!(|(lines in 1usize..8, commas in 1usize..6)| {
        let row = vec!["cell"; commas + 1].join(",");
        let text = vec![row; lines].join("\n");
        prop_assert_eq!(sniff::detect(text.as_bytes(), None), Some(InputFormat::Csv));
    });
}
