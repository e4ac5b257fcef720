//! Property-based tests for the converter and table-producing backends
//!
//! - Any input yields exactly one of: a document, or a single error
//! - CSV tables report dimensions matching the source grid

use docweave_backend::{BackendInput, BackendOptions, CsvBackend, DocumentBackend, DocumentConverter};
use docweave_core::{ConversionStatus, DocItem, InputFormat};
use proptest::prelude::*;

fn filename() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        prop::sample::select(vec![
            "a.txt", "a.csv", "a.json", "a.xml", "a.html", "a.srt", "a.rss", "a.docx", "a.xlsx",
            "a.pptx", "a.zip", "a.png", "a.ipynb", "a.pdf",
        ])
        .prop_map(|name| Some(name.to_string())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_result_is_document_xor_error(
        bytes in prop::collection::vec(any::<u8>(), 0..256),
        name in filename(),
    ) {
        let converter = DocumentConverter::new();
        let result = converter.convert(bytes, name.as_deref());
        match result.status {
            ConversionStatus::Success => {
                prop_assert!(result.document.is_some());
                prop_assert!(result.markdown_content.is_some());
                prop_assert!(result.errors.is_empty());
            }
            ConversionStatus::Failure => {
                prop_assert!(result.document.is_none());
                prop_assert_eq!(result.errors.len(), 1);
            }
        }
    }

    #[test]
    fn prop_csv_dimensions_match_grid(
        width in 1usize..6,
        cells in prop::collection::vec("[a-z]{1,5}", 1..40),
    ) {
        let rows: Vec<&[String]> = cells.chunks(width).filter(|row| row.len() == width).collect();
        prop_assume!(!rows.is_empty());
        let csv: String = rows.iter().map(|row| row.join(",") + "\n").collect();

        let input = BackendInput::new(csv.as_bytes(), InputFormat::Csv);
        let doc = CsvBackend::new().convert(&input, &BackendOptions::default()).unwrap();
        let Some(DocItem::Table(table)) = doc.content.first() else {
            return Err(TestCaseError::fail("expected a table"));
        };
        prop_assert_eq!(table.num_rows(), rows.len());
        prop_assert_eq!(table.num_cols(), width);
        prop_assert!(table.rows().iter().all(|row| row.len() == width));
    }
}
