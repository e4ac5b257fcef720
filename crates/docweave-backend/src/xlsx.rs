//! Microsoft Excel (.xlsx) backend using calamine
//!
//! Every worksheet yields a level-2 heading with the sheet name followed by
//! one table over the sheet's used range. The first row holds header cells;
//! merged regions become row/column spans on their top-left cell and the
//! covered cells are dropped.

use crate::office::OfficePackage;
use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use calamine::{open_workbook_from_rs, Data, Dimensions, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use docweave_core::{DocItem, Document, DocumentMetadata, DocweaveError, InputFormat, Result, TableCell, TableItem};
use std::io::Cursor;

/// XLSX backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct XlsxBackend;

impl XlsxBackend {
    /// Create a new XLSX backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    /// Render an Excel date serial (days since 1899-12-30).
    #[allow(clippy::cast_possible_truncation)]
    fn excel_serial(serial: f64) -> Option<String> {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let millis = (serial * 86_400_000.0).round() as i64;
        let dt = epoch.checked_add_signed(Duration::milliseconds(millis))?;
        if serial.fract() == 0.0 {
            Some(dt.format("%Y-%m-%d").to_string())
        } else {
            Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
        }
    }

    fn cell_text(value: &Data) -> String {
        match value {
            Data::Empty => String::new(),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => f.to_string(),
            Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Data::DateTime(dt) if dt.is_duration() => dt.as_f64().to_string(),
            Data::DateTime(dt) => {
                Self::excel_serial(dt.as_f64()).unwrap_or_else(|| dt.as_f64().to_string())
            }
            Data::Error(e) => e.to_string(),
        }
    }

    /// Table over a sheet range; `merged` uses absolute 0-based coordinates.
    fn sheet_table(range: &Range<Data>, merged: &[Dimensions]) -> Option<TableItem> {
        let (origin_row, origin_col) = range.start()?;
        let (height, width) = range.get_size();
        let mut rows = Vec::with_capacity(height);

        for r in 0..height {
            let abs_row = origin_row + u32::try_from(r).ok()?;
            let mut row = Vec::with_capacity(width);
            for c in 0..width {
                let abs_col = origin_col + u32::try_from(c).ok()?;
                let region = merged.iter().find(|m| {
                    (m.start.0..=m.end.0).contains(&abs_row) && (m.start.1..=m.end.1).contains(&abs_col)
                });
                let (row_span, col_span) = match region {
                    Some(m) if m.start == (abs_row, abs_col) => (
                        (m.end.0 - m.start.0) as usize + 1,
                        (m.end.1 - m.start.1) as usize + 1,
                    ),
                    Some(_) => continue,
                    None => (1, 1),
                };
                let text = range.get((r, c)).map(Self::cell_text).unwrap_or_default();
                let cell = if r == 0 {
                    TableCell::header(text)
                } else {
                    TableCell::new(text)
                };
                row.push(cell.with_spans(row_span, col_span));
            }
            rows.push(row);
        }

        // Drop trailing rows with no text at all.
        while rows
            .last()
            .is_some_and(|row: &Vec<TableCell>| row.iter().all(|c| c.text.is_empty()))
        {
            rows.pop();
        }
        (!rows.is_empty()).then(|| TableItem::new(rows))
    }
}

impl DocumentBackend for XlsxBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Xlsx]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        OfficePackage::open(input.data).is_ok_and(|p| p.has_part("xl/workbook.xml"))
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(input.data))
            .map_err(|e| DocweaveError::backend("Failed to open XLSX workbook", e))?;
        if let Err(e) = workbook.load_merged_regions() {
            log::warn!("Failed to load merged regions: {e}");
        }

        let sheet_names = workbook.sheet_names();
        let mut content = Vec::with_capacity(sheet_names.len() * 2);
        let mut num_tables = 0usize;
        for name in &sheet_names {
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| DocweaveError::backend(&format!("Failed to read sheet {name}"), e))?;
            let merged = workbook
                .worksheet_merge_cells(name)
                .and_then(std::result::Result::ok)
                .unwrap_or_default();

            content.push(DocItem::heading(2, name.clone()));
            if !options.extract_tables {
                continue;
            }
            if let Some(table) = Self::sheet_table(&range, &merged) {
                num_tables += 1;
                content.push(table.with_metadata("sheet", name.clone()).into());
            }
        }
        log::debug!("XLSX: {} sheets, {num_tables} tables", sheet_names.len());

        let metadata = DocumentMetadata::new(input.display_name(), InputFormat::Xlsx)
            .with_extra("num_sheets", sheet_names.len());
        let metadata = match OfficePackage::open(input.data) {
            Ok(mut package) => package.core_properties().apply(metadata),
            Err(_) => metadata,
        };
        let metadata = if metadata.title.is_none() {
            metadata.with_title(input.file_stem())
        } else {
            metadata
        };
        Ok(Document::new(metadata, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const SHEET_NS: &str = r#"xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    fn inline(cell_ref: &str, text: &str) -> String {
        format!(r#"<c r="{cell_ref}" t="inlineStr"><is><t>{text}</t></is></c>"#)
    }

    fn build_xlsx(sheets: &[(&str, String)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        let mut overrides = String::new();
        let mut entries = String::new();
        let mut rels = String::new();
        for (i, (name, _)) in sheets.iter().enumerate() {
            let n = i + 1;
            overrides.push_str(&format!(r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#));
            entries.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
            rels.push_str(&format!(r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#));
        }
        let parts = [
            (
                "[Content_Types].xml".to_string(),
                format!(r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#),
            ),
            (
                "_rels/.rels".to_string(),
                r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/workbook.xml".to_string(),
                format!(r#"<?xml version="1.0"?><workbook {SHEET_NS}><sheets>{entries}</sheets></workbook>"#),
            ),
            (
                "xl/_rels/workbook.xml.rels".to_string(),
                format!(r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#),
            ),
        ];
        for (name, xml) in parts {
            zip.start_file(name, opts).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        for (i, (_, sheet)) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), opts).unwrap();
            write!(zip, r#"<?xml version="1.0"?><worksheet {SHEET_NS}>{sheet}</worksheet>"#).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_one_heading_and_table_per_sheet() {
        let parts = format!(
            "<sheetData><row r=\"1\">{}{}</row><row r=\"2\">{}<c r=\"B2\"><v>4</v></c></row></sheetData>",
            inline("A1", "Part"),
            inline("B1", "Qty"),
            inline("A2", "Bolt"),
        );
        let empty = "<sheetData/>".to_string();
        let bytes = build_xlsx(&[("Parts", parts), ("Empty", empty)]);
        let input = BackendInput::new(&bytes, InputFormat::Xlsx).with_filename(Some("inventory.xlsx"));
        assert!(XlsxBackend.is_valid(&input));
        let doc = XlsxBackend::new()
            .convert(&input, &BackendOptions::default())
            .unwrap();

        assert_eq!(doc.metadata.title.as_deref(), Some("inventory"));
        assert_eq!(doc.metadata.extra["num_sheets"].as_i64(), Some(2));
        assert_eq!(doc.content[0], DocItem::heading(2, "Parts"));
        let DocItem::Table(table) = &doc.content[1] else {
            panic!("expected table, got {:?}", doc.content[1]);
        };
        assert_eq!((table.num_rows(), table.num_cols()), (2, 2));
        assert!(table.rows()[0][0].is_header);
        assert_eq!(table.rows()[1][1].text, "4");
        assert_eq!(doc.content[2], DocItem::heading(2, "Empty"));
        assert_eq!(doc.content.len(), 3);
    }

    #[test]
    fn test_merged_region_spans() {
        let mut range = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Merged".into()));
        range.set_value((0, 2), Data::String("C".into()));
        range.set_value((1, 0), Data::Int(1));
        range.set_value((1, 1), Data::Float(2.5));
        range.set_value((1, 2), Data::Bool(true));
        let merged = [Dimensions {
            start: (0, 0),
            end: (0, 1),
        }];
        let table = XlsxBackend::sheet_table(&range, &merged).unwrap();
        assert_eq!(table.num_rows(), 2, "empty trailing row dropped");
        assert_eq!(table.rows()[0].len(), 2);
        assert_eq!(table.rows()[0][0].col_span, Some(2));
        assert_eq!(table.num_cols(), 3);
        let texts: Vec<_> = table.rows()[1].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["1", "2.5", "TRUE"]);
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(XlsxBackend::excel_serial(45_306.0).as_deref(), Some("2024-01-15"));
        assert_eq!(
            XlsxBackend::excel_serial(45_306.5).as_deref(),
            Some("2024-01-15 12:00:00")
        );
    }

    #[test]
    fn test_invalid_workbook() {
        let input = BackendInput::new(b"PK\x03\x04garbage", InputFormat::Xlsx);
        assert!(!XlsxBackend.is_valid(&input));
        assert!(XlsxBackend
            .convert(&input, &BackendOptions::default())
            .is_err());
    }
}
