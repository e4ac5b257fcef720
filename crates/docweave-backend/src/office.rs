//! Shared OOXML package access (DOCX, PPTX, XLSX)
//!
//! An Office Open XML file is a ZIP package of XML parts. This module opens
//! the package in memory, reads parts and relationship tables, and parses
//! `docProps/core.xml` into document metadata.

use chrono::{DateTime, Utc};
use docweave_core::{DocumentMetadata, DocweaveError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use roxmltree::Node;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Relationship namespace used by `r:id`/`r:embed` attributes
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// An OOXML package held in memory
pub(crate) struct OfficePackage<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl std::fmt::Debug for OfficePackage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfficePackage")
            .field("parts", &self.archive.len())
            .finish()
    }
}

impl<'a> OfficePackage<'a> {
    /// Open a package
    ///
    /// # Errors
    /// Returns an error if `data` is not a readable ZIP container.
    pub(crate) fn open(data: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| DocweaveError::backend("Failed to open Office package", e))?;
        Ok(Self { archive })
    }

    /// Whether the package contains `name`
    pub(crate) fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Part names in archive order
    pub(crate) fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(ToString::to_string).collect()
    }

    /// Raw bytes of a part
    pub(crate) fn read_bytes(&mut self, name: &str) -> Option<Vec<u8>> {
        let mut file = self.archive.by_name(name).ok()?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).ok()?;
        Some(bytes)
    }

    /// Text of an XML part (UTF-8, BOM removed)
    pub(crate) fn read_string(&mut self, name: &str) -> Option<String> {
        let bytes = self.read_bytes(name)?;
        let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(&bytes);
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Text of a part that must exist
    ///
    /// # Errors
    /// Returns a conversion error naming the missing part.
    pub(crate) fn require_string(&mut self, name: &str) -> Result<String> {
        self.read_string(name)
            .ok_or_else(|| DocweaveError::ConversionError(format!("Missing package part {name}")))
    }

    /// Relationship id → target path, resolved relative to `base_dir`.
    ///
    /// `rels_path` is e.g. `word/_rels/document.xml.rels`; external targets
    /// (hyperlinks) are returned unchanged.
    pub(crate) fn relationships(&mut self, rels_path: &str, base_dir: &str) -> HashMap<String, String> {
        let Some(xml) = self.read_string(rels_path) else {
            return HashMap::new();
        };
        let Ok(doc) = roxmltree::Document::parse(&xml) else {
            log::warn!("Unparseable relationship part {rels_path}");
            return HashMap::new();
        };
        doc.descendants()
            .filter(|n| n.tag_name().name() == "Relationship")
            .filter_map(|n| {
                let id = n.attribute("Id")?;
                let target = n.attribute("Target")?;
                let resolved = if n.attribute("TargetMode") == Some("External") {
                    target.to_string()
                } else {
                    resolve_part_path(base_dir, target)
                };
                Some((id.to_string(), resolved))
            })
            .collect()
    }

    /// Parse `docProps/core.xml`; absent or broken parts give empty properties.
    pub(crate) fn core_properties(&mut self) -> CoreProperties {
        self.read_string("docProps/core.xml")
            .map(|xml| CoreProperties::parse(&xml))
            .unwrap_or_default()
    }
}

/// Resolve a relationship target against the directory of its source part.
pub(crate) fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Package-level properties from `docProps/core.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CoreProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub language: Option<String>,
    pub last_modified_by: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl CoreProperties {
    /// Parse core properties XML
    ///
    /// ```xml
    /// <dc:creator>John Doe</dc:creator>
    /// <dcterms:created xsi:type="dcterms:W3CDTF">2024-01-15T10:30:00Z</dcterms:created>
    /// ```
    pub(crate) fn parse(xml: &str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut props = Self::default();
        let mut current: Option<Vec<u8>> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => current = Some(e.local_name().as_ref().to_vec()),
                Ok(Event::Text(e)) => {
                    let (Some(field), Ok(text)) = (current.as_deref(), e.unescape()) else {
                        buf.clear();
                        continue;
                    };
                    let text = text.trim();
                    if !text.is_empty() {
                        props.set(field, text);
                    }
                }
                Ok(Event::End(_)) => current = None,
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::warn!("Malformed docProps/core.xml: {e}");
                    break;
                }
                _ => {}
            }
            buf.clear();
        }
        props
    }

    fn set(&mut self, field: &[u8], text: &str) {
        let value = Some(text.to_string());
        match field {
            b"title" => self.title = value,
            b"creator" => self.author = value,
            b"subject" => self.subject = value,
            b"description" => self.description = value,
            b"keywords" => self.keywords = value,
            b"language" => self.language = value,
            b"lastModifiedBy" => self.last_modified_by = value,
            b"created" => self.created = crate::utils::parse_datetime(text),
            b"modified" => self.modified = crate::utils::parse_datetime(text),
            _ => {}
        }
    }

    /// Copy the properties into document metadata, keeping fields already set.
    pub(crate) fn apply(self, mut metadata: DocumentMetadata) -> DocumentMetadata {
        if metadata.title.is_none() {
            metadata.title = self.title;
        }
        if metadata.author.is_none() {
            metadata.author = self.author;
        }
        metadata.description = metadata.description.or(self.description).or(self.subject);
        metadata.language = metadata.language.or(self.language);
        metadata.created = metadata.created.or(self.created);
        metadata.modified = metadata.modified.or(self.modified);
        if let Some(keywords) = self.keywords {
            metadata.extra.insert("keywords".to_string(), keywords.into());
        }
        if let Some(editor) = self.last_modified_by {
            metadata.extra.insert("last_modified_by".to_string(), editor.into());
        }
        metadata
    }
}

/// First element child with the given local name
pub(crate) fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

/// Element children with the given local name
pub(crate) fn children<'a, 'i>(
    node: Node<'a, 'i>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

/// First descendant element with the given local name
pub(crate) fn descendant<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.descendants()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

/// Attribute in the relationships namespace (`r:id`, `r:embed`).
pub(crate) fn rel_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((REL_NS, name))
}
