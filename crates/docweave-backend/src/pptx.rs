//! PPTX (PowerPoint) presentation backend
//!
//! Each slide becomes a `section` item holding, in shape order:
//! the slide title (level-2 heading), text paragraphs (bulleted paragraphs are
//! grouped into lists), tables, pictures and finally the speaker notes.
//!
//! Slides follow the order of `p:sldIdLst` in `ppt/presentation.xml`; packages
//! without one fall back to the numeric order of `ppt/slides/slideN.xml`.

use crate::office::{child, children, descendant, rel_attr, OfficePackage};
use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use docweave_core::{
    DocItem, Document, DocumentMetadata, DocweaveError, Formatting, ImageItem, InputFormat, Result,
    TableCell, TableItem,
};
use roxmltree::Node;
use std::collections::HashMap;

/// Text of one DrawingML paragraph with its list properties
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextParagraph {
    text: String,
    formatting: Formatting,
    /// `Some(ordered)` when the paragraph carries a bullet
    bullet: Option<bool>,
}

/// PPTX backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PptxBackend;

impl PptxBackend {
    /// Create a new PPTX backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }

    /// Slide part paths in presentation order
    fn slide_paths(package: &mut OfficePackage<'_>) -> Vec<String> {
        let rels = package.relationships("ppt/_rels/presentation.xml.rels", "ppt");
        let ordered: Vec<String> = package
            .read_string("ppt/presentation.xml")
            .and_then(|xml| {
                let doc = roxmltree::Document::parse(&xml).ok()?;
                let list = descendant(doc.root_element(), "sldIdLst")?;
                Some(
                    children(list, "sldId")
                        .filter_map(|id| rel_attr(id, "id"))
                        .filter_map(|rid| rels.get(rid).cloned())
                        .collect(),
                )
            })
            .unwrap_or_default();
        if !ordered.is_empty() {
            return ordered;
        }

        let mut numbered: Vec<(usize, String)> = package
            .part_names()
            .into_iter()
            .filter_map(|name| {
                let number = name
                    .strip_prefix("ppt/slides/slide")?
                    .strip_suffix(".xml")?
                    .parse::<usize>()
                    .ok()?;
                Some((number, name))
            })
            .collect();
        numbered.sort_unstable_by_key(|(n, _)| *n);
        numbered.into_iter().map(|(_, name)| name).collect()
    }

    /// `ppt/slides/slide3.xml` → (`ppt/slides`, `ppt/slides/_rels/slide3.xml.rels`)
    fn rels_location(part: &str) -> (String, String) {
        let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
        (dir.to_string(), format!("{dir}/_rels/{file}.rels"))
    }

    /// Placeholder type of a shape (`title`, `ctrTitle`, `body`, ...)
    fn placeholder_type<'a>(shape: Node<'a, '_>) -> Option<&'a str> {
        let ph = descendant(child(shape, "nvSpPr")?, "ph")?;
        Some(ph.attribute("type").unwrap_or("body"))
    }

    fn is_title_shape(shape: Node<'_, '_>) -> bool {
        matches!(Self::placeholder_type(shape), Some("title" | "ctrTitle"))
    }

    fn run_formatting(rpr: Option<Node<'_, '_>>) -> Formatting {
        let Some(rpr) = rpr else {
            return Formatting::default();
        };
        let flag = |name: &str| matches!(rpr.attribute(name), Some("1" | "true"));
        Formatting {
            bold: flag("b"),
            italic: flag("i"),
            underline: rpr.attribute("u").is_some_and(|u| u != "none"),
            strikethrough: rpr.attribute("strike").is_some_and(|s| s != "noStrike"),
        }
    }

    /// Paragraphs of a `txBody`
    fn text_paragraphs(tx_body: Node<'_, '_>) -> Vec<TextParagraph> {
        children(tx_body, "p")
            .filter_map(|p| {
                let mut text = String::new();
                let mut shared: Option<Formatting> = None;
                for part in p.children().filter(Node::is_element) {
                    match part.tag_name().name() {
                        "r" | "fld" => {
                            let run = child(part, "t").and_then(|t| t.text()).unwrap_or_default();
                            if !run.trim().is_empty() {
                                let f = Self::run_formatting(child(part, "rPr"));
                                shared = Some(shared.map_or(f, |s| Formatting {
                                    bold: s.bold && f.bold,
                                    italic: s.italic && f.italic,
                                    underline: s.underline && f.underline,
                                    strikethrough: s.strikethrough && f.strikethrough,
                                }));
                            }
                            text.push_str(run);
                        }
                        "br" => text.push('\n'),
                        _ => {}
                    }
                }
                let text = text.trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let ppr = child(p, "pPr");
                let bullet = ppr.and_then(|ppr| {
                    if child(ppr, "buNone").is_some() {
                        None
                    } else if child(ppr, "buAutoNum").is_some() {
                        Some(true)
                    } else if child(ppr, "buChar").is_some() {
                        Some(false)
                    } else {
                        None
                    }
                });
                Some(TextParagraph {
                    text,
                    formatting: shared.unwrap_or_default(),
                    bullet,
                })
            })
            .collect()
    }

    /// Paragraph and list items, grouping consecutive bullets
    fn paragraph_items(paragraphs: Vec<TextParagraph>, options: &BackendOptions) -> Vec<DocItem> {
        let mut items = Vec::new();
        let mut pending: Option<(bool, Vec<DocItem>)> = None;
        for paragraph in paragraphs {
            let formatting = if options.extract_formatting {
                paragraph.formatting
            } else {
                Formatting::default()
            };
            match paragraph.bullet {
                Some(ordered) => {
                    let entry = DocItem::list_item(paragraph.text).with_formatting(formatting);
                    match &mut pending {
                        Some((kind, entries)) if *kind == ordered => entries.push(entry),
                        _ => {
                            if let Some((kind, entries)) = pending.take() {
                                items.push(DocItem::list(kind, entries));
                            }
                            pending = Some((ordered, vec![entry]));
                        }
                    }
                }
                None => {
                    if let Some((kind, entries)) = pending.take() {
                        items.push(DocItem::list(kind, entries));
                    }
                    items.push(DocItem::paragraph(paragraph.text).with_formatting(formatting));
                }
            }
        }
        if let Some((kind, entries)) = pending {
            items.push(DocItem::list(kind, entries));
        }
        items
    }

    fn table(frame: Node<'_, '_>) -> Option<TableItem> {
        let tbl = descendant(frame, "tbl")?;
        let header_row = child(tbl, "tblPr")
            .and_then(|p| p.attribute("firstRow"))
            .is_some_and(|v| v == "1" || v == "true");
        let rows: Vec<Vec<TableCell>> = children(tbl, "tr")
            .enumerate()
            .map(|(i, tr)| {
                children(tr, "tc")
                    // merged-away cells are covered by their origin's span
                    .filter(|tc| tc.attribute("hMerge").is_none() && tc.attribute("vMerge").is_none())
                    .map(|tc| {
                        let text = child(tc, "txBody")
                            .map(Self::text_paragraphs)
                            .unwrap_or_default()
                            .into_iter()
                            .map(|p| p.text)
                            .collect::<Vec<_>>()
                            .join("\n");
                        let span = |name: &str| {
                            tc.attribute(name)
                                .and_then(|v| v.parse::<usize>().ok())
                                .unwrap_or(1)
                        };
                        let cell = if header_row && i == 0 {
                            TableCell::header(text)
                        } else {
                            TableCell::new(text)
                        };
                        cell.with_spans(span("rowSpan"), span("gridSpan"))
                    })
                    .collect()
            })
            .collect();
        (!rows.is_empty()).then(|| TableItem::new(rows))
    }

    fn picture(
        pic: Node<'_, '_>,
        rels: &HashMap<String, String>,
        package: &mut OfficePackage<'_>,
        options: &BackendOptions,
    ) -> ImageItem {
        let target = descendant(pic, "blip")
            .and_then(|b| rel_attr(b, "embed"))
            .and_then(|id| rels.get(id))
            .cloned();
        let alt = descendant(pic, "cNvPr")
            .and_then(|c| c.attribute("descr").filter(|d| !d.trim().is_empty()).or_else(|| c.attribute("name")))
            .map(ToString::to_string);
        let data = match (&target, options.extract_images) {
            (Some(path), true) => package.read_bytes(path),
            _ => None,
        };
        ImageItem {
            src: target,
            alt,
            data,
            ..ImageItem::default()
        }
    }

    /// Items for the shapes of a shape tree, recursing into groups
    fn shape_items(
        tree: Node<'_, '_>,
        rels: &HashMap<String, String>,
        package: &mut OfficePackage<'_>,
        options: &BackendOptions,
        title: &mut Option<String>,
    ) -> Vec<DocItem> {
        let mut items = Vec::new();
        for shape in tree.children().filter(Node::is_element) {
            match shape.tag_name().name() {
                "sp" => {
                    let Some(tx_body) = child(shape, "txBody") else {
                        continue;
                    };
                    let paragraphs = Self::text_paragraphs(tx_body);
                    if paragraphs.is_empty() {
                        continue;
                    }
                    if title.is_none() && Self::is_title_shape(shape) {
                        let text = paragraphs
                            .iter()
                            .map(|p| p.text.as_str())
                            .collect::<Vec<_>>()
                            .join(" ");
                        items.push(DocItem::heading(2, text.clone()));
                        *title = Some(text);
                    } else {
                        items.extend(Self::paragraph_items(paragraphs, options));
                    }
                }
                "graphicFrame" => {
                    if options.extract_tables {
                        if let Some(table) = Self::table(shape) {
                            items.push(table.into());
                        }
                    }
                }
                "pic" => items.push(DocItem::Image(Self::picture(shape, rels, package, options))),
                "grpSp" => items.extend(Self::shape_items(shape, rels, package, options, title)),
                _ => {}
            }
        }
        items
    }

    /// Speaker notes text (body placeholders of the notes slide)
    fn notes(package: &mut OfficePackage<'_>, notes_path: &str) -> Vec<String> {
        let Some(xml) = package.read_string(notes_path) else {
            return Vec::new();
        };
        let Ok(doc) = roxmltree::Document::parse(&xml) else {
            log::warn!("Ignoring unparseable notes part {notes_path}");
            return Vec::new();
        };
        doc.descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "sp")
            .filter(|sp| Self::placeholder_type(*sp) == Some("body"))
            .filter_map(|sp| child(sp, "txBody"))
            .flat_map(Self::text_paragraphs)
            .map(|p| p.text)
            .collect()
    }

    fn slide(
        package: &mut OfficePackage<'_>,
        path: &str,
        number: usize,
        options: &BackendOptions,
    ) -> Result<(DocItem, Option<String>)> {
        let xml = package.require_string(path)?;
        let doc = roxmltree::Document::parse(&xml)
            .map_err(|e| DocweaveError::ConversionError(format!("Invalid slide {path}: {e}")))?;
        let (dir, rels_path) = Self::rels_location(path);
        let rels = package.relationships(&rels_path, &dir);

        let mut title = None;
        let mut items = descendant(doc.root_element(), "spTree")
            .map(|tree| Self::shape_items(tree, &rels, package, options, &mut title))
            .unwrap_or_default();

        let notes_path = rels.values().find(|t| t.contains("notesSlides/")).cloned();
        if let Some(notes_path) = notes_path {
            let notes = Self::notes(package, &notes_path);
            if !notes.is_empty() {
                items.push(DocItem::heading(3, "Notes"));
                items.extend(notes.into_iter().map(DocItem::paragraph));
            }
        }

        let section = DocItem::section(items).with_metadata("slide_number", number);
        Ok((section, title))
    }
}

impl DocumentBackend for PptxBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Pptx]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        OfficePackage::open(input.data).is_ok_and(|p| p.has_part("ppt/presentation.xml"))
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let mut package = OfficePackage::open(input.data)?;
        let slide_paths = Self::slide_paths(&mut package);
        log::debug!("PPTX with {} slides", slide_paths.len());

        let mut content = Vec::with_capacity(slide_paths.len());
        let mut first_title = None;
        let mut warnings = Vec::new();
        for (i, path) in slide_paths.iter().enumerate() {
            let number = i + 1;
            if !options.page_selected(number) {
                continue;
            }
            match Self::slide(&mut package, path, number, options) {
                Ok((section, title)) => {
                    if first_title.is_none() {
                        first_title = title;
                    }
                    content.push(section);
                }
                Err(e) => {
                    log::warn!("Skipping slide {number}: {e}");
                    warnings.push(format!("Slide {number} could not be read: {e}"));
                }
            }
        }

        let mut metadata = DocumentMetadata::new(input.display_name(), InputFormat::Pptx)
            .with_extra("num_slides", slide_paths.len());
        metadata.num_pages = Some(slide_paths.len());
        let mut metadata = package.core_properties().apply(metadata);
        if metadata.title.is_none() {
            metadata = metadata.with_title(first_title);
        }

        let mut doc = Document::new(metadata, content);
        for warning in warnings {
            doc.warn(warning);
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    fn text_shape(ph: Option<&str>, paragraphs: &str) -> String {
        let ph = ph.map_or_else(String::new, |t| format!(r#"<p:nvPr><p:ph type="{t}"/></p:nvPr>"#));
        format!(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Shape"/>{ph}</p:nvSpPr><p:txBody>{paragraphs}</p:txBody></p:sp>"#)
    }

    fn slide_xml(shapes: &str) -> String {
        format!(r#"<?xml version="1.0"?><p:sld {NS}><p:cSld><p:spTree>{shapes}</p:spTree></p:cSld></p:sld>"#)
    }

    fn build_pptx(slides: &[(&str, String)], extra: &[(&str, String)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        zip.start_file("ppt/presentation.xml", opts).unwrap();
        write!(zip, r#"<p:presentation {NS}/>"#).unwrap();
        for (name, xml) in slides.iter().chain(extra) {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn convert(bytes: &[u8]) -> Document {
        let input = BackendInput::new(bytes, InputFormat::Pptx).with_filename(Some("deck.pptx"));
        PptxBackend::new()
            .convert(&input, &BackendOptions::default())
            .unwrap()
    }

    #[test]
    fn test_slides_in_numeric_order() {
        let slide = |title: &str| slide_xml(&text_shape(Some("title"), &format!("<a:p><a:r><a:t>{title}</a:t></a:r></a:p>")));
        let bytes = build_pptx(
            &[
                ("ppt/slides/slide10.xml", slide("Ten")),
                ("ppt/slides/slide2.xml", slide("Two")),
                ("ppt/slides/slide1.xml", slide("One")),
            ],
            &[],
        );
        let doc = convert(&bytes);
        let titles: Vec<_> = doc
            .content
            .iter()
            .map(|s| s.children()[0].text().unwrap_or_default())
            .collect();
        assert_eq!(titles, ["One", "Two", "Ten"]);
        assert_eq!(doc.metadata.title.as_deref(), Some("One"));
        assert_eq!(doc.metadata.num_pages, Some(3));
        assert_eq!(doc.content[2].metadata_value("slide_number").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn test_body_bullets_and_formatting() {
        let body = r#"<a:p><a:r><a:rPr b="1"/><a:t>Intro</a:t></a:r></a:p>
<a:p><a:pPr><a:buChar char="•"/></a:pPr><a:r><a:t>Alpha</a:t></a:r></a:p>
<a:p><a:pPr><a:buChar char="•"/></a:pPr><a:r><a:t>Beta</a:t></a:r></a:p>"#;
        let shapes = text_shape(Some("title"), "<a:p><a:r><a:t>Agenda</a:t></a:r></a:p>") + &text_shape(None, body);
        let doc = convert(&build_pptx(&[("ppt/slides/slide1.xml", slide_xml(&shapes))], &[]));
        let slide = doc.content[0].children();
        assert_eq!(slide[0], DocItem::heading(2, "Agenda"));
        assert_eq!(slide[1], DocItem::paragraph("Intro").with_formatting(Formatting::BOLD));
        assert_eq!(
            slide[2],
            DocItem::list(false, vec![DocItem::list_item("Alpha"), DocItem::list_item("Beta")])
        );
    }

    #[test]
    fn test_table_and_notes() {
        let cell = |t: &str| format!("<a:tc><a:txBody><a:p><a:r><a:t>{t}</a:t></a:r></a:p></a:txBody></a:tc>");
        let table = format!(
            r#"<p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tblPr firstRow="1"/><a:tr>{}{}</a:tr><a:tr>{}{}</a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
            cell("Name"),
            cell("Qty"),
            cell("Bolt"),
            cell("4")
        );
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/></Relationships>"#;
        let notes = format!(
            r#"<p:notes {NS}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld></p:notes>"#,
            text_shape(Some("sldImg"), "<a:p><a:r><a:t>ignored</a:t></a:r></a:p>"),
            text_shape(Some("body"), "<a:p><a:r><a:t>Mention the deadline</a:t></a:r></a:p>")
        );
        let bytes = build_pptx(
            &[("ppt/slides/slide1.xml", slide_xml(&table))],
            &[
                ("ppt/slides/_rels/slide1.xml.rels", rels.to_string()),
                ("ppt/notesSlides/notesSlide1.xml", notes),
            ],
        );
        let doc = convert(&bytes);
        let slide = doc.content[0].children();
        let DocItem::Table(table) = &slide[0] else {
            panic!("expected table, got {:?}", slide[0]);
        };
        assert_eq!((table.num_rows(), table.num_cols()), (2, 2));
        assert!(table.rows()[0][0].is_header);
        assert!(!table.rows()[1][0].is_header);
        assert_eq!(slide[1], DocItem::heading(3, "Notes"));
        assert_eq!(slide[2], DocItem::paragraph("Mention the deadline"));
        assert_eq!(slide.len(), 3);
    }

    #[test]
    fn test_page_range_selects_slides() {
        let slide = |t: &str| slide_xml(&text_shape(None, &format!("<a:p><a:r><a:t>{t}</a:t></a:r></a:p>")));
        let bytes = build_pptx(
            &[("ppt/slides/slide1.xml", slide("a")), ("ppt/slides/slide2.xml", slide("b"))],
            &[],
        );
        let input = BackendInput::new(&bytes, InputFormat::Pptx);
        let options = BackendOptions::default().with_page_range(Some((2, 2)));
        let doc = PptxBackend.convert(&input, &options).unwrap();
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].children()[0], DocItem::paragraph("b"));
        assert_eq!(doc.metadata.extra["num_slides"].as_i64(), Some(2));
    }
}
