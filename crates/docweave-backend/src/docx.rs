//! DOCX (Word) document backend
//!
//! Walks `word/document.xml` and turns it into the document tree:
//!
//! - paragraphs styled `Title` / `Heading N` (or with an outline level) become
//!   title/heading items; style ids are resolved through `word/styles.xml`
//! - paragraphs with `w:numPr` are grouped into (nested) lists, ordered or
//!   bulleted according to `word/numbering.xml`
//! - `w:tbl` becomes a table with `gridSpan`/`vMerge` spans
//! - inline drawings become image items
//! - run formatting (bold, italic, underline, strike) is kept when every run of
//!   a paragraph shares it
//!
//! Title and author fall back to `docProps/core.xml`.

use crate::office::{child, children, descendant, rel_attr, OfficePackage};
use crate::traits::{BackendInput, BackendOptions, DocumentBackend};
use crate::utils::mime_type_from_extension;
use docweave_core::{
    DocItem, Document, DocumentMetadata, DocweaveError, Formatting, ImageItem, InputFormat, Result,
    TableCell, TableItem,
};
use roxmltree::Node;
use std::collections::HashMap;

/// WordprocessingML main namespace
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// `w:`-namespaced attribute
fn w_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((W_NS, name)).or_else(|| node.attribute(name))
}

/// Toggle properties (`<w:b/>`, `<w:b w:val="0"/>`) are on unless `w:val` says otherwise.
fn toggle_on(node: Node<'_, '_>) -> bool {
    !matches!(w_attr(node, "val"), Some("0" | "false" | "off" | "none"))
}

/// Paragraph role resolved from its style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphRole {
    Title,
    Heading(usize),
    Body,
}

/// Style and numbering definitions the body refers to
#[derive(Debug, Default)]
struct DocxContext {
    /// styleId → display name
    style_names: HashMap<String, String>,
    /// styleId → outline level (0-based)
    style_outline: HashMap<String, usize>,
    /// numId → abstractNumId
    num_to_abstract: HashMap<String, String>,
    /// (abstractNumId, ilvl) → numFmt
    level_formats: HashMap<(String, usize), String>,
    /// relationship id → part path or URL
    relationships: HashMap<String, String>,
}

impl DocxContext {
    fn load(package: &mut OfficePackage<'_>) -> Self {
        let mut ctx = Self {
            relationships: package.relationships("word/_rels/document.xml.rels", "word"),
            ..Self::default()
        };
        if let Some(xml) = package.read_string("word/styles.xml") {
            match roxmltree::Document::parse(&xml) {
                Ok(doc) => ctx.load_styles(&doc),
                Err(e) => log::warn!("Ignoring unparseable word/styles.xml: {e}"),
            }
        }
        if let Some(xml) = package.read_string("word/numbering.xml") {
            match roxmltree::Document::parse(&xml) {
                Ok(doc) => ctx.load_numbering(&doc),
                Err(e) => log::warn!("Ignoring unparseable word/numbering.xml: {e}"),
            }
        }
        ctx
    }

    fn load_styles(&mut self, doc: &roxmltree::Document<'_>) {
        for style in children(doc.root_element(), "style") {
            let Some(id) = w_attr(style, "styleId") else {
                continue;
            };
            if let Some(name) = child(style, "name").and_then(|n| w_attr(n, "val")) {
                self.style_names.insert(id.to_string(), name.to_string());
            }
            let outline = child(style, "pPr")
                .and_then(|p| child(p, "outlineLvl"))
                .and_then(|o| w_attr(o, "val"))
                .and_then(|v| v.parse::<usize>().ok());
            if let Some(level) = outline {
                self.style_outline.insert(id.to_string(), level);
            }
        }
    }

    fn load_numbering(&mut self, doc: &roxmltree::Document<'_>) {
        let root = doc.root_element();
        for abstract_num in children(root, "abstractNum") {
            let Some(abstract_id) = w_attr(abstract_num, "abstractNumId") else {
                continue;
            };
            for lvl in children(abstract_num, "lvl") {
                let ilvl = w_attr(lvl, "ilvl").and_then(|v| v.parse::<usize>().ok());
                let fmt = child(lvl, "numFmt").and_then(|f| w_attr(f, "val"));
                if let (Some(ilvl), Some(fmt)) = (ilvl, fmt) {
                    self.level_formats
                        .insert((abstract_id.to_string(), ilvl), fmt.to_string());
                }
            }
        }
        for num in children(root, "num") {
            let abstract_id = child(num, "abstractNumId").and_then(|a| w_attr(a, "val"));
            if let (Some(num_id), Some(abstract_id)) = (w_attr(num, "numId"), abstract_id) {
                self.num_to_abstract
                    .insert(num_id.to_string(), abstract_id.to_string());
            }
        }
    }

    /// Ordered unless numbering says bullet; unknown definitions count as bullets.
    fn is_ordered(&self, num_id: &str, ilvl: usize) -> bool {
        self.num_to_abstract
            .get(num_id)
            .and_then(|a| self.level_formats.get(&(a.clone(), ilvl)))
            .is_some_and(|fmt| fmt != "bullet" && fmt != "none")
    }

    fn role(&self, style_id: Option<&str>, outline: Option<usize>) -> ParagraphRole {
        if let Some(level) = outline.filter(|l| *l < 9) {
            return ParagraphRole::Heading(level + 1);
        }
        let Some(id) = style_id else {
            return ParagraphRole::Body;
        };
        let name = self.style_names.get(id).map_or(id, String::as_str);
        let lower = name.to_ascii_lowercase();
        if lower == "title" {
            return ParagraphRole::Title;
        }
        if let Some(rest) = lower.strip_prefix("heading") {
            if let Ok(level) = rest.trim().parse::<usize>() {
                return ParagraphRole::Heading(level.clamp(1, 9));
            }
        }
        self.style_outline
            .get(id)
            .filter(|l| **l < 9)
            .map_or(ParagraphRole::Body, |l| ParagraphRole::Heading(l + 1))
    }
}

/// A formatted run of paragraph text
#[derive(Debug, Clone, Default)]
struct Run {
    text: String,
    formatting: Formatting,
}

/// Accumulates list paragraphs into nested list items.
///
/// `stack[i]` holds the open list at indent level `i`.
#[derive(Debug, Default)]
struct ListBuilder {
    stack: Vec<(bool, Vec<DocItem>)>,
}

impl ListBuilder {
    fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    fn push(&mut self, level: usize, ordered: bool, item: DocItem) {
        while self.stack.len() > level + 1 {
            self.close_top();
        }
        while self.stack.len() < level + 1 {
            self.stack.push((ordered, Vec::new()));
        }
        if let Some((_, items)) = self.stack.last_mut() {
            items.push(item);
        }
    }

    /// Close the innermost list and hang it under the parent's last item.
    fn close_top(&mut self) {
        let Some((ordered, items)) = self.stack.pop() else {
            return;
        };
        let list = DocItem::list(ordered, items);
        let Some((_, parent)) = self.stack.last_mut() else {
            self.stack.push((ordered, vec![list]));
            return;
        };
        match parent.pop() {
            Some(last) => {
                let mut nested = last.children().to_vec();
                nested.push(list);
                parent.push(last.with_children(nested));
            }
            None => parent.push(list),
        }
    }

    fn finish(&mut self) -> Option<DocItem> {
        while self.stack.len() > 1 {
            self.close_top();
        }
        let (ordered, items) = self.stack.pop()?;
        // A lone nested list closed into the root is already a list.
        if items.len() == 1 && items[0].kind() == "list" {
            return items.into_iter().next();
        }
        Some(DocItem::list(ordered, items))
    }
}

/// Walk state for one conversion
struct BodyWalker<'o> {
    ctx: DocxContext,
    options: &'o BackendOptions,
    content: Vec<DocItem>,
    list: ListBuilder,
    first_title: Option<String>,
    num_tables: usize,
    num_images: usize,
}

impl BodyWalker<'_> {
    fn flush_list(&mut self) {
        if self.list.is_open() {
            if let Some(list) = self.list.finish() {
                self.content.push(list);
            }
        }
    }

    fn walk_block(&mut self, node: Node<'_, '_>, package: &mut OfficePackage<'_>) {
        for block in node.children().filter(Node::is_element) {
            match block.tag_name().name() {
                "p" => self.paragraph(block, package),
                "tbl" => {
                    self.flush_list();
                    if let Some(table) = self.table(block) {
                        self.content.push(table.into());
                    }
                }
                "sdt" => {
                    if let Some(inner) = child(block, "sdtContent") {
                        self.walk_block(inner, package);
                    }
                }
                _ => {}
            }
        }
    }

    fn paragraph(&mut self, p: Node<'_, '_>, package: &mut OfficePackage<'_>) {
        let ppr = child(p, "pPr");
        let style_id = ppr
            .and_then(|ppr| child(ppr, "pStyle"))
            .and_then(|s| w_attr(s, "val"));
        let outline = ppr
            .and_then(|ppr| child(ppr, "outlineLvl"))
            .and_then(|o| w_attr(o, "val"))
            .and_then(|v| v.parse::<usize>().ok());
        let num_pr = ppr.and_then(|ppr| child(ppr, "numPr"));

        let mut runs = Vec::new();
        let mut images = Vec::new();
        collect_runs(p, Formatting::default(), &mut runs, &mut images);

        for drawing in images {
            if let Some(image) = self.image(drawing, package) {
                self.flush_list();
                self.content.push(DocItem::Image(image));
            }
        }

        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let formatting = if self.options.extract_formatting {
            shared_formatting(&runs)
        } else {
            Formatting::default()
        };

        if let Some(num_pr) = num_pr {
            let num_id = child(num_pr, "numId").and_then(|n| w_attr(n, "val"));
            // numId 0 removes numbering inherited from the style
            if let Some(num_id) = num_id.filter(|id| *id != "0") {
                let level = child(num_pr, "ilvl")
                    .and_then(|l| w_attr(l, "val"))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0)
                    .min(8);
                let ordered = self.ctx.is_ordered(num_id, level);
                let item = DocItem::list_item(text).with_formatting(formatting);
                self.list.push(level, ordered, item);
                return;
            }
        }

        self.flush_list();
        let item = match self.ctx.role(style_id, outline) {
            ParagraphRole::Title => {
                self.first_title.get_or_insert_with(|| text.to_string());
                DocItem::title(text)
            }
            ParagraphRole::Heading(level) => DocItem::heading(level, text),
            ParagraphRole::Body => DocItem::paragraph(text).with_formatting(formatting),
        };
        self.content.push(item);
    }

    fn table(&mut self, tbl: Node<'_, '_>) -> Option<TableItem> {
        if !self.options.extract_tables {
            return None;
        }
        let mut rows: Vec<Vec<TableCell>> = Vec::new();
        // grid column → (row, cell index) of the cell a vertical merge started in
        let mut merge_origin: HashMap<usize, (usize, usize)> = HashMap::new();

        for tr in children(tbl, "tr") {
            let is_header = child(tr, "trPr")
                .and_then(|t| child(t, "tblHeader"))
                .is_some_and(toggle_on);
            let row_idx = rows.len();
            let mut row = Vec::new();
            let mut grid_col = 0;

            for tc in children(tr, "tc") {
                let tc_pr = child(tc, "tcPr");
                let span = tc_pr
                    .and_then(|t| child(t, "gridSpan"))
                    .and_then(|g| w_attr(g, "val"))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
                let v_merge = tc_pr.and_then(|t| child(t, "vMerge"));
                let restart = v_merge.is_some_and(|v| w_attr(v, "val") == Some("restart"));

                if v_merge.is_some() && !restart {
                    if let Some(&(r, c)) = merge_origin.get(&grid_col) {
                        let origin = &mut rows[r][c];
                        let row_span = origin.row_span.unwrap_or(1) + 1;
                        let col_span = origin.col_span.unwrap_or(1);
                        *origin = origin.clone().with_spans(row_span, col_span);
                    }
                    grid_col += span;
                    continue;
                }

                let text = children(tc, "p")
                    .map(|p| {
                        let mut runs = Vec::new();
                        collect_runs(p, Formatting::default(), &mut runs, &mut Vec::new());
                        runs.into_iter().map(|r| r.text).collect::<String>()
                    })
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                let cell = if is_header {
                    TableCell::header(text)
                } else {
                    TableCell::new(text)
                };
                if restart {
                    merge_origin.insert(grid_col, (row_idx, row.len()));
                } else {
                    merge_origin.remove(&grid_col);
                }
                row.push(cell.with_spans(1, span));
                grid_col += span;
            }
            rows.push(row);
        }

        if rows.iter().all(Vec::is_empty) {
            return None;
        }
        self.num_tables += 1;
        Some(TableItem::new(rows))
    }

    fn image(&mut self, drawing: Node<'_, '_>, package: &mut OfficePackage<'_>) -> Option<ImageItem> {
        let blip = descendant(drawing, "blip")?;
        let target = rel_attr(blip, "embed")
            .or_else(|| rel_attr(blip, "link"))
            .and_then(|id| self.ctx.relationships.get(id))
            .cloned();
        let doc_pr = descendant(drawing, "docPr");
        let alt = doc_pr
            .and_then(|d| d.attribute("descr").filter(|s| !s.trim().is_empty()).or_else(|| d.attribute("name")))
            .map(ToString::to_string);

        let mut image = ImageItem {
            alt,
            ..ImageItem::default()
        };
        if let Some(extent) = descendant(drawing, "extent") {
            // EMU: 914400 per inch, 96 px per inch
            let px = |attr: &str| {
                extent
                    .attribute(attr)
                    .and_then(|v| v.parse::<u64>().ok())
                    .and_then(|emu| u32::try_from(emu / 9525).ok())
            };
            image.width = px("cx");
            image.height = px("cy");
        }
        if let Some(target) = &target {
            if self.options.extract_images {
                image.data = package.read_bytes(target);
            }
            let ext = target.rsplit('.').next().unwrap_or_default();
            image.metadata.insert(
                "mime_type".to_string(),
                mime_type_from_extension(ext, "application/octet-stream").into(),
            );
        }
        image.src = target;
        self.num_images += 1;
        Some(image)
    }
}

/// Collect text runs below `node`, honoring run properties and skipping deletions.
fn collect_runs<'a, 'i>(
    node: Node<'a, 'i>,
    inherited: Formatting,
    runs: &mut Vec<Run>,
    drawings: &mut Vec<Node<'a, 'i>>,
) {
    for n in node.children().filter(Node::is_element) {
        match n.tag_name().name() {
            "r" => {
                let formatting = child(n, "rPr").map_or(inherited, |rpr| run_formatting(rpr, inherited));
                let mut text = String::new();
                for part in n.children().filter(Node::is_element) {
                    match part.tag_name().name() {
                        "t" => text.push_str(part.text().unwrap_or_default()),
                        "tab" => text.push('\t'),
                        "br" | "cr" => text.push('\n'),
                        "noBreakHyphen" => text.push('-'),
                        "drawing" | "pict" => drawings.push(part),
                        _ => {}
                    }
                }
                if !text.is_empty() {
                    runs.push(Run { text, formatting });
                }
            }
            "hyperlink" | "ins" | "smartTag" | "fldSimple" | "customXml" => {
                collect_runs(n, inherited, runs, drawings);
            }
            "sdt" => {
                if let Some(inner) = child(n, "sdtContent") {
                    collect_runs(inner, inherited, runs, drawings);
                }
            }
            _ => {}
        }
    }
}

fn run_formatting(rpr: Node<'_, '_>, inherited: Formatting) -> Formatting {
    let mut formatting = inherited;
    for prop in rpr.children().filter(Node::is_element) {
        match prop.tag_name().name() {
            "b" => formatting.bold = toggle_on(prop),
            "i" => formatting.italic = toggle_on(prop),
            "u" => formatting.underline = toggle_on(prop),
            "strike" | "dstrike" => formatting.strikethrough = toggle_on(prop),
            _ => {}
        }
    }
    formatting
}

/// Formatting common to every visible run
fn shared_formatting(runs: &[Run]) -> Formatting {
    runs.iter()
        .filter(|r| !r.text.trim().is_empty())
        .map(|r| r.formatting)
        .reduce(|a, b| Formatting {
            bold: a.bold && b.bold,
            italic: a.italic && b.italic,
            underline: a.underline && b.underline,
            strikethrough: a.strikethrough && b.strikethrough,
        })
        .unwrap_or_default()
}

/// DOCX backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DocxBackend;

impl DocxBackend {
    /// Create a new DOCX backend instance
    #[inline]
    #[must_use = "creates a backend instance that should be used for parsing"]
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentBackend for DocxBackend {
    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Docx]
    }

    fn is_valid(&self, input: &BackendInput<'_>) -> bool {
        OfficePackage::open(input.data).is_ok_and(|p| p.has_part("word/document.xml"))
    }

    fn convert(&self, input: &BackendInput<'_>, options: &BackendOptions) -> Result<Document> {
        let mut package = OfficePackage::open(input.data)?;
        let xml = package.require_string("word/document.xml")?;
        let doc = roxmltree::Document::parse(&xml)
            .map_err(|e| DocweaveError::ConversionError(format!("Invalid word/document.xml: {e}")))?;
        let body = child(doc.root_element(), "body").ok_or_else(|| {
            DocweaveError::ConversionError("word/document.xml has no body".to_string())
        })?;

        let mut walker = BodyWalker {
            ctx: DocxContext::load(&mut package),
            options,
            content: Vec::new(),
            list: ListBuilder::default(),
            first_title: None,
            num_tables: 0,
            num_images: 0,
        };
        walker.walk_block(body, &mut package);
        walker.flush_list();

        let first_heading = walker
            .content
            .iter()
            .find(|item| item.kind() == "heading")
            .and_then(DocItem::text)
            .map(ToString::to_string);
        let title = walker.first_title.clone().or(first_heading);
        log::debug!(
            "DOCX: {} top-level items, {} tables, {} images",
            walker.content.len(),
            walker.num_tables,
            walker.num_images
        );

        let metadata = DocumentMetadata::new(input.display_name(), InputFormat::Docx)
            .with_extra("num_tables", walker.num_tables)
            .with_extra("num_images", walker.num_images);
        let mut metadata = package.core_properties().apply(metadata);
        if metadata.title.is_none() {
            metadata = metadata.with_title(title);
        }
        Ok(Document::new(metadata, walker.content))
    }
}
