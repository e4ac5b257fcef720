//! Input format identifiers
//!
//! This module defines the `InputFormat` enum, the closed set of formats the
//! converter can detect and dispatch on, together with the fixed
//! extension table used by the sniffer.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Input document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InputFormat {
    /// PDF document
    #[serde(rename = "PDF")]
    Pdf,
    /// Microsoft Word document (.docx)
    #[serde(rename = "DOCX")]
    Docx,
    /// Microsoft `PowerPoint` (.pptx)
    #[serde(rename = "PPTX")]
    Pptx,
    /// Microsoft Excel (.xlsx)
    #[serde(rename = "XLSX")]
    Xlsx,
    /// HTML document
    #[serde(rename = "HTML")]
    Html,
    /// Bing search-results page (narrower than HTML)
    #[serde(rename = "BING_SERP")]
    BingSerp,
    /// Subtitle track (`SubRip` or `WebVTT`)
    #[serde(rename = "SUBTITLE")]
    Subtitle,
    /// Raster image (PNG, JPEG, TIFF, ...)
    #[serde(rename = "IMAGE")]
    Image,
    /// CSV file
    #[serde(rename = "CSV")]
    Csv,
    /// Generic JSON document
    #[serde(rename = "JSON")]
    Json,
    /// Plain text
    #[serde(rename = "TEXT")]
    Text,
    /// Generic XML document
    #[serde(rename = "XML")]
    Xml,
    /// RSS feed
    #[serde(rename = "RSS")]
    Rss,
    /// Atom feed
    #[serde(rename = "ATOM")]
    Atom,
    /// ZIP archive
    #[serde(rename = "ZIP")]
    Zip,
    /// Jupyter Notebook (.ipynb)
    #[serde(rename = "IPYNB")]
    Ipynb,
}

impl InputFormat {
    /// Every format, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::Pdf,
        Self::Docx,
        Self::Pptx,
        Self::Xlsx,
        Self::Html,
        Self::BingSerp,
        Self::Subtitle,
        Self::Image,
        Self::Csv,
        Self::Json,
        Self::Text,
        Self::Xml,
        Self::Rss,
        Self::Atom,
        Self::Zip,
        Self::Ipynb,
    ];

    /// Detect format from file extension (without the leading dot)
    #[inline]
    #[must_use = "detects format from file extension"]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            "html" | "htm" => Some(Self::Html),
            "srt" | "vtt" => Some(Self::Subtitle),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "gif" | "bmp" | "webp" => Some(Self::Image),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "txt" | "text" | "md" | "markdown" => Some(Self::Text),
            "xml" => Some(Self::Xml),
            "rss" => Some(Self::Rss),
            "atom" => Some(Self::Atom),
            "zip" => Some(Self::Zip),
            "ipynb" => Some(Self::Ipynb),
            _ => None,
        }
    }

    /// Detect format from the extension of a file name or path string
    #[inline]
    #[must_use = "detects format from a path's extension"]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get file extensions associated with this format
    #[inline]
    #[must_use = "returns file extensions for this format"]
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Docx => &["docx"],
            Self::Pptx => &["pptx"],
            Self::Xlsx => &["xlsx"],
            Self::Html => &["html", "htm"],
            Self::BingSerp => &[],
            Self::Subtitle => &["srt", "vtt"],
            Self::Image => &["png", "jpg", "jpeg", "tif", "tiff", "gif", "bmp", "webp"],
            Self::Csv => &["csv"],
            Self::Json => &["json"],
            Self::Text => &["txt", "text", "md", "markdown"],
            Self::Xml => &["xml"],
            Self::Rss => &["rss"],
            Self::Atom => &["atom"],
            Self::Zip => &["zip"],
            Self::Ipynb => &["ipynb"],
        }
    }

    /// Whether this format is a container whose entries are converted recursively
    #[inline]
    #[must_use = "returns whether this is an archive format"]
    pub const fn is_archive(&self) -> bool {
        matches!(self, Self::Zip)
    }

    /// Whether this format is an Office Open XML package (a ZIP underneath)
    #[inline]
    #[must_use = "returns whether this is an OOXML format"]
    pub const fn is_office(&self) -> bool {
        matches!(self, Self::Docx | Self::Pptx | Self::Xlsx)
    }

    /// Whether this format is a syndication feed
    #[inline]
    #[must_use = "returns whether this is a feed format"]
    pub const fn is_feed(&self) -> bool {
        matches!(self, Self::Rss | Self::Atom)
    }

    /// Whether this format is textual markup or plain text
    #[inline]
    #[must_use = "returns whether this is a text-based format"]
    pub const fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::Html
                | Self::BingSerp
                | Self::Subtitle
                | Self::Csv
                | Self::Json
                | Self::Text
                | Self::Xml
                | Self::Rss
                | Self::Atom
                | Self::Ipynb
        )
    }
}

impl std::fmt::Display for InputFormat {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Pptx => "PPTX",
            Self::Xlsx => "XLSX",
            Self::Html => "HTML",
            Self::BingSerp => "BING_SERP",
            Self::Subtitle => "SUBTITLE",
            Self::Image => "IMAGE",
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Text => "TEXT",
            Self::Xml => "XML",
            Self::Rss => "RSS",
            Self::Atom => "ATOM",
            Self::Zip => "ZIP",
            Self::Ipynb => "IPYNB",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            "xlsx" => Ok(Self::Xlsx),
            "html" | "htm" => Ok(Self::Html),
            "bing_serp" | "bingserp" => Ok(Self::BingSerp),
            "subtitle" | "srt" | "vtt" | "webvtt" => Ok(Self::Subtitle),
            "image" => Ok(Self::Image),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            "xml" => Ok(Self::Xml),
            "rss" => Ok(Self::Rss),
            "atom" => Ok(Self::Atom),
            "zip" => Ok(Self::Zip),
            "ipynb" | "notebook" => Ok(Self::Ipynb),
            _ => Err(format!("Unknown format '{s}'")),
        }
    }
}
