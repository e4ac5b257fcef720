//! CSV backend
//!
//! Parses delimited text into a single table item.
//!
//! # Features
//!
//! - Delimiter detection (`,`, `;`, `\t`, `|`, `:`) from the first line
//! - First row treated as header
//! - Flexible column counts (ragged rows are kept as-is; the table's
//!   `num_cols` is the widest row)

use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result, TableItem};

const DELIMITERS: [char; 5] = [',', ';', '\t', '|', ':'];

/// CSV Document Backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CsvBackend;

impl CsvBackend {
    /// Create a new CSV backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    /// Pick the candidate delimiter occurring most often on the first line.
    ///
    /// Ties keep the earlier candidate, so a line without any candidate
    /// yields `,`.
    #[inline]
    fn detect_delimiter(content: &str) -> char {
        let first_line = content.lines().next().unwrap_or_default();
        let mut best_delimiter = ',';
        let mut max_count = 0;

        for &delim in &DELIMITERS {
            let count = first_line.matches(delim).count();
            if count > max_count {
                max_count = count;
                best_delimiter = delim;
            }
        }
        best_delimiter
    }

    /// Read CSV records into rows of strings
    fn read_csv_data(content: &str, delimiter: char) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .flexible(true)
            .has_headers(false)
            .from_reader(content.as_bytes());

        reader
            .records()
            .map(|result| {
                result
                    .map(|record| record.iter().map(|field| field.trim().to_string()).collect())
                    .map_err(|e| DocweaveError::backend("Failed to parse CSV", e))
            })
            .collect()
    }

    /// Log a warning when rows disagree on their column count
    fn check_column_uniformity(csv_data: &[Vec<String>]) {
        let Some(first) = csv_data.first() else {
            return;
        };
        let ragged = csv_data.iter().filter(|row| row.len() != first.len()).count();
        if ragged > 0 {
            log::warn!(
                "Inconsistent column lengths detected: {ragged} of {} rows differ from the header ({} columns)",
                csv_data.len(),
                first.len()
            );
        }
    }
}

impl DocumentBackend for CsvBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Csv]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        std::str::from_utf8(input.data).is_ok()
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let content = input.text();
        let delimiter = Self::detect_delimiter(&content);
        log::debug!("Parsing CSV with delimiter: {delimiter:?}");

        let csv_data = Self::read_csv_data(&content, delimiter)?;
        log::debug!("Detected {} CSV rows", csv_data.len());
        Self::check_column_uniformity(&csv_data);

        let table = TableItem::from_text_rows(csv_data, true);
        let metadata = DocumentMetadata::new(input.display_name(), InputFormat::Csv)
            .with_title(input.file_stem())
            .with_extra("num_rows", table.num_rows())
            .with_extra("num_cols", table.num_cols());

        let content = if table.is_empty() || !options.extract_tables {
            Vec::new()
        } else {
            vec![DocItem::from(table)]
        };
        Ok(Document::new(metadata, content))
    }
}
