//! Document serialization module
//!
//! This module provides serializers for converting a [`Document`](crate::Document)
//! into Markdown and JSON.

pub mod json;
pub mod markdown;

pub use json::{JsonOptions, JsonSerializer};
pub use markdown::{CodeBlockStyle, HeadingStyle, MarkdownOptions, MarkdownSerializer};
